//! Per-session context.
//!
//! Created once at session start and passed by reference into every turn.
//! Tools and instruction templates read it; nothing writes it after
//! construction.

use chrono::Local;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable facts about the current session: who the user is, when and
/// where they are. The instruction template is a pure function of this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Display name of the end user
    pub name: String,

    /// Unique identifier, freshly generated per session start
    pub user_id: String,

    /// Current date, ISO `YYYY-MM-DD`
    pub today: String,

    /// Default city for the user
    pub location: String,
}

impl SessionContext {
    /// Build a context for a new session: a fresh `user_id` and today's
    /// local date.
    pub fn new(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: Uuid::new_v4().to_string(),
            today: Local::now().format("%Y-%m-%d").to_string(),
            location: location.into(),
        }
    }
}
