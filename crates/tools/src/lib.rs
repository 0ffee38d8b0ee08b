//! Tool implementations for Concierge.
//!
//! Two tools ship: a weather-forecast lookup (OpenWeatherMap) and a Slack
//! message post. Both sit behind transport traits ([`weather::ForecastSource`],
//! [`slack::Notifier`]) so the tools themselves are testable without a
//! network, and both follow the same result contract: the model always
//! receives a JSON string — either the success payload or `{"error": ...}`.
//! Provider failures never escape a tool as a Rust error.

pub mod slack;
pub mod weather;

use concierge_core::tool::ToolRegistry;
use std::sync::Arc;

pub use slack::{Notifier, NotifyError, SlackClient, SlackTool};
pub use weather::{ForecastError, ForecastSource, OwmClient, WeatherTool};

/// Build the registry with both production tools.
pub fn registry(
    forecast: Arc<dyn ForecastSource>,
    notifier: Arc<dyn Notifier>,
    slack_channel: impl Into<String>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WeatherTool::new(forecast)));
    registry.register(Box::new(SlackTool::new(notifier, slack_channel)));
    registry
}
