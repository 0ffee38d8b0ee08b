//! Agent definition.
//!
//! An agent is a named bundle of model, instruction template, and the
//! tools it may call. A session holds exactly one active agent; a turn
//! may hand the session off to a different agent, in which case the
//! session loop adopts the replacement for subsequent turns.

use crate::session::SessionContext;

/// A pure function of the session context producing the system prompt.
///
/// A plain `fn` pointer (not a closure) keeps `Agent` cheap to clone and
/// guarantees the template can't smuggle in mutable state.
pub type InstructionFn = fn(&SessionContext) -> String;

/// An agent the session loop can run turns against.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Display name, shown as the sender in transcripts
    pub name: String,

    /// Model identifier passed to the provider
    pub model: String,

    /// System-prompt template, instantiated per turn from the context
    pub instructions: InstructionFn,

    /// Names of the tools this agent may call
    pub tools: Vec<String>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        model: impl Into<String>,
        instructions: InstructionFn,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            instructions,
            tools: Vec::new(),
        }
    }

    /// Declare the tools this agent may call (builder style).
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Instantiate the system prompt for the given session context.
    pub fn system_prompt(&self, ctx: &SessionContext) -> String {
        (self.instructions)(ctx)
    }
}
