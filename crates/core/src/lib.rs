//! # Concierge Core
//!
//! Domain types, traits, and error definitions for the Concierge
//! customer-service agent. This crate has no framework dependencies —
//! it defines the domain model that all other crates implement against.
//!
//! The seams are traits: the LLM backend is a [`Provider`], tools are
//! [`Tool`] implementations registered in a [`ToolRegistry`]. The session
//! loop and turn runner work against these traits only, so tests can
//! substitute fakes for everything that touches the network.

pub mod agent;
pub mod error;
pub mod message;
pub mod provider;
pub mod session;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use agent::Agent;
pub use error::{Error, ProviderError, Result, ToolError};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use session::SessionContext;
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
