//! The session loop: read a line, run a turn, render, repeat.
//!
//! Input comes through the [`LineSource`] trait so the loop can be
//! driven by a scripted source in tests. The production source is a
//! rustyline editor with a persistent history file.

use concierge_agent::TurnRunner;
use concierge_core::agent::Agent;
use concierge_core::message::Message;
use concierge_core::session::SessionContext;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io;
use std::path::PathBuf;
use tracing::debug;

use crate::transcript;

/// A restartable sequence of input lines, terminated by interrupt or
/// end-of-input.
pub trait LineSource {
    /// Read one line at `prompt`. `Ok(None)` means the user interrupted
    /// (Ctrl-C) or input ended (Ctrl-D) — the session should end.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Record an accepted line into persistent history.
    fn record(&mut self, line: &str) -> io::Result<()>;
}

/// Production line source: rustyline with a history file.
pub struct ReadlineSource {
    editor: DefaultEditor,
    history_path: PathBuf,
}

impl ReadlineSource {
    /// Create the editor, loading prior history when the file exists.
    pub fn new(history_path: PathBuf) -> Result<Self, ReadlineError> {
        let mut editor = DefaultEditor::new()?;
        if history_path.exists() {
            // A corrupt history file shouldn't block the session
            let _ = editor.load_history(&history_path);
        }
        Ok(Self {
            editor,
            history_path,
        })
    }
}

impl LineSource for ReadlineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(io::Error::other(e)),
        }
    }

    fn record(&mut self, line: &str) -> io::Result<()> {
        self.editor
            .add_history_entry(line)
            .map_err(io::Error::other)?;
        self.editor
            .save_history(&self.history_path)
            .map_err(io::Error::other)
    }
}

/// One interactive session: the active agent, the immutable context, and
/// the append-only message log.
pub struct Session {
    agent: Agent,
    ctx: SessionContext,
    log: Vec<Message>,
    runner: TurnRunner,
}

impl Session {
    pub fn new(agent: Agent, ctx: SessionContext, runner: TurnRunner) -> Self {
        Self {
            agent,
            ctx,
            log: Vec::new(),
            runner,
        }
    }

    /// The name of the currently active agent.
    pub fn agent_name(&self) -> &str {
        &self.agent.name
    }

    /// The full message log so far.
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// Adopt a hand-off agent for subsequent turns.
    fn adopt(&mut self, next: Agent) {
        debug!(from = %self.agent.name, to = %next.name, "Agent hand-off");
        self.agent = next;
    }

    /// Run the session until interrupt or end-of-input.
    ///
    /// Turn-runner errors propagate — the loop has no recovery policy,
    /// so a broken provider terminates the process visibly. Ctrl-C at
    /// the prompt comes back through the line source; Ctrl-C while a
    /// turn is in flight is caught here, so either way the session ends
    /// on the farewell line.
    pub async fn run<W: io::Write>(
        &mut self,
        lines: &mut dyn LineSource,
        out: &mut W,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.run_with_shutdown(lines, out, || async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
    }

    async fn run_with_shutdown<W, F, Fut>(
        &mut self,
        lines: &mut dyn LineSource,
        out: &mut W,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error>>
    where
        W: io::Write,
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ()>,
    {
        writeln!(out, "Welcome to Customer Service Bot! 😊")?;

        loop {
            let Some(line) = lines.read_line("> ")? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            lines.record(&line)?;

            self.log.push(Message::user(line));

            let outcome = tokio::select! {
                result = self.runner.run(&self.agent, &self.log, &self.ctx) => result?,
                _ = shutdown() => {
                    debug!("Interrupted mid-turn, shutting down");
                    break;
                }
            };
            transcript::render_to(out, &outcome.messages)?;
            self.log.extend(outcome.messages);

            if let Some(next) = outcome.agent {
                self.adopt(next);
            }
        }

        writeln!(out, "Goodbye! 👋")?;
        Ok(())
    }
}
