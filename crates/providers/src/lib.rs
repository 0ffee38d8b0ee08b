//! LLM provider implementations for Concierge.
//!
//! One implementation ships: an OpenAI-compatible chat-completions
//! client, which covers Ollama (the default backend for the `llama3.1`
//! model) as well as any hosted endpoint speaking the same protocol.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
