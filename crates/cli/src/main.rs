//! Concierge — the main entry point.
//!
//! Running the binary starts the customer-service REPL directly; the
//! only flag is `--verbose`. Both provider credentials must be present
//! in the environment or startup fails before the REPL is entered.

use clap::Parser;
use concierge_agent::TurnRunner;
use concierge_config::AppConfig;
use concierge_core::session::SessionContext;
use concierge_providers::OpenAiCompatProvider;
use concierge_tools::{ForecastSource, Notifier, OwmClient, SlackClient};
use std::sync::Arc;

mod instructions;
mod repl;
mod transcript;

#[derive(Parser)]
#[command(
    name = "concierge",
    about = "Concierge — customer-service chat agent with weather and Slack tools",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the transcript
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;

    let forecast: Arc<dyn ForecastSource> = Arc::new(OwmClient::new(&config.owm_api_key)?);
    let notifier: Arc<dyn Notifier> = Arc::new(SlackClient::new(&config.slack_bot_token)?);
    let tools = Arc::new(concierge_tools::registry(
        forecast,
        notifier,
        &config.slack_channel,
    ));

    let provider = Arc::new(OpenAiCompatProvider::ollama(&config.provider_base_url)?);
    let runner = TurnRunner::new(provider, tools).with_temperature(config.temperature);

    let ctx = SessionContext::new(&config.user_name, &config.location);
    let agent = instructions::customer_service_agent(&config.model);

    let mut lines = repl::ReadlineSource::new(AppConfig::history_path())?;
    let mut session = repl::Session::new(agent, ctx, runner);
    session.run(&mut lines, &mut std::io::stdout()).await
}
