//! The turn runner — the orchestration core of Concierge.
//!
//! One turn is: user line already appended to the log by the caller →
//! build the system prompt from the active agent and session context →
//! call the LLM → execute any requested tool calls → loop until the
//! model answers with text only (or the iteration bound trips).
//!
//! The runner never mutates the caller's message log; it returns the new
//! messages of the turn and the caller appends them. That keeps the log
//! append-only by construction.

pub mod runner;

pub use runner::{TurnOutcome, TurnRunner};
