//! Transcript rendering for the terminal.
//!
//! Only assistant messages are shown: the user already saw their own
//! input, and raw tool results belong to the model, not the transcript.
//! Tool invocations are surfaced inline so the operator can see what the
//! agent actually did.

use colored::Colorize;
use concierge_core::message::{Message, Role};
use std::io;

/// Write the renderable part of `messages` to `out`.
///
/// Layout per assistant message: the sender name (blue), the content on
/// the same line, then one line per tool call — name (magenta) followed
/// by the arguments as `key=value` pairs in parentheses. A message with
/// more than one tool call gets a blank separator line before the block.
pub fn render_to<W: io::Write>(out: &mut W, messages: &[Message]) -> io::Result<()> {
    for message in messages {
        if message.role != Role::Assistant {
            continue;
        }

        let sender = message.sender.as_deref().unwrap_or("assistant");
        write!(out, "{}: ", sender.bright_blue())?;

        if !message.content.is_empty() {
            writeln!(out, "{}", message.content)?;
        }

        if message.tool_calls.len() > 1 {
            writeln!(out)?;
        }
        for tc in &message.tool_calls {
            writeln!(
                out,
                "{}({})",
                tc.name.bright_magenta(),
                format_arguments(&tc.arguments)
            )?;
        }

        // A lone sender prefix (no content, single tool call) still needs
        // its line ended.
        if message.content.is_empty() && message.tool_calls.is_empty() {
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Re-serialize a JSON argument object as `"key"= value` pairs separated
/// by `, `, with the enclosing braces stripped. Colons inside string
/// values become `=` too. Unparseable input is shown as-is rather than
/// dropped.
fn format_arguments(raw: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => map
            .iter()
            .map(|(key, value)| format!("{}: {value}", serde_json::Value::String(key.clone())))
            .collect::<Vec<_>>()
            .join(", ")
            .replace(':', "="),
        Ok(value) => value.to_string().replace(':', "="),
        Err(_) => raw.to_string(),
    }
}
