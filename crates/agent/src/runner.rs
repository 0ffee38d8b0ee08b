//! The turn loop implementation.

use concierge_core::agent::Agent;
use concierge_core::error::Error;
use concierge_core::message::Message;
use concierge_core::provider::{Provider, ProviderRequest};
use concierge_core::session::SessionContext;
use concierge_core::tool::{ToolCall, ToolRegistry};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything one turn produced.
#[derive(Debug)]
pub struct TurnOutcome {
    /// The messages generated this turn, in order: assistant messages
    /// (possibly carrying tool calls) interleaved with tool results,
    /// ending with the final assistant reply.
    pub messages: Vec<Message>,

    /// A replacement agent when the turn handed the session off.
    /// `None` means the current agent stays active.
    pub agent: Option<Agent>,
}

/// Runs complete agent turns against a provider and a tool registry.
pub struct TurnRunner {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    temperature: f32,
    max_iterations: u32,
}

impl TurnRunner {
    pub fn new(provider: Arc<dyn Provider>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            provider,
            tools,
            temperature: 0.7,
            max_iterations: 8,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of tool call iterations per turn.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Run one full turn.
    ///
    /// `log` is the session's append-only message history including the
    /// latest user message. Provider errors propagate — the session loop
    /// has no recovery policy for them. Tool failures do not: they become
    /// tool-result messages the model can react to.
    ///
    /// A tool result carrying a replacement agent switches the active
    /// agent for the rest of the turn; the final hand-off is reported in
    /// `TurnOutcome.agent` for the session to adopt.
    pub async fn run(
        &self,
        agent: &Agent,
        log: &[Message],
        ctx: &SessionContext,
    ) -> Result<TurnOutcome, Error> {
        info!(agent = %agent.name, log_len = log.len(), "Running turn");

        let mut next_agent: Option<Agent> = None;
        let mut turn_messages: Vec<Message> = Vec::new();
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > self.max_iterations {
                warn!(iterations = iteration, "Max tool iterations reached, ending turn");
                break;
            }
            debug!(iteration, "Turn iteration");

            let active = next_agent.as_ref().unwrap_or(agent);
            let system = Message::system(active.system_prompt(ctx));
            let tool_definitions = self.tools.definitions_for(&active.tools);

            let mut messages = Vec::with_capacity(1 + log.len() + turn_messages.len());
            messages.push(system);
            messages.extend_from_slice(log);
            messages.extend_from_slice(&turn_messages);

            let request = ProviderRequest {
                model: active.model.clone(),
                messages,
                temperature: self.temperature,
                max_tokens: None,
                tools: tool_definitions,
            };

            let sender = active.name.clone();
            let response = self.provider.complete(request).await?;
            let reply = response.message.with_sender(&sender);

            if reply.tool_calls.is_empty() {
                // Final text response — the turn is over.
                turn_messages.push(reply);
                break;
            }

            let tool_calls = reply.tool_calls.clone();
            turn_messages.push(reply);

            for tc in &tool_calls {
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                };

                match self.tools.execute(&call).await {
                    Ok(result) => {
                        debug!(tool = %tc.name, success = result.success, "Tool executed");
                        turn_messages.push(Message::tool_result(&tc.id, &result.output));
                        if let Some(handoff) = result.agent {
                            info!(to = %handoff.name, "Tool handed the session off");
                            next_agent = Some(handoff);
                        }
                    }
                    Err(e) => {
                        warn!(tool = %tc.name, error = %e, "Tool dispatch failed");
                        // Report the dispatch failure to the model so it can recover
                        turn_messages.push(Message::tool_result(&tc.id, format!("Error: {e}")));
                    }
                }
            }
            // Loop back — the model sees the tool results and decides what to do next
        }

        Ok(TurnOutcome {
            messages: turn_messages,
            agent: next_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use concierge_core::error::{ProviderError, ToolError};
    use concierge_core::message::MessageToolCall;
    use concierge_core::provider::{ProviderResponse, Usage};
    use concierge_core::tool::{Tool, ToolResult};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A provider that replays a scripted sequence of responses.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Message>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Message>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let message = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Message::assistant("out of script"));
            Ok(ProviderResponse {
                message,
                usage: Some(Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                    total_tokens: 15,
                }),
                model: "scripted-model".into(),
            })
        }
    }

    struct OrderLookupTool;

    #[async_trait]
    impl Tool for OrderLookupTool {
        fn name(&self) -> &str {
            "lookup_order"
        }
        fn description(&self) -> &str {
            "Look up an order by id"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": { "order_id": { "type": "string" } },
                "required": ["order_id"]
            })
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            let id = arguments["order_id"].as_str().unwrap_or("?");
            Ok(ToolResult {
                call_id: String::new(),
                success: true,
                output: serde_json::json!({"order_id": id, "status": "shipped"}).to_string(),
                agent: None,
            })
        }
    }

    fn support_instructions(ctx: &SessionContext) -> String {
        format!("You are a customer service bot. The user is {}.", ctx.name)
    }

    fn support_agent() -> Agent {
        Agent::new("Customer Service Agent", "llama3.1", support_instructions)
            .with_tools(vec!["lookup_order".into()])
    }

    fn registry_with_lookup() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(OrderLookupTool));
        Arc::new(registry)
    }

    #[tokio::test]
    async fn text_only_turn_yields_one_assistant_message() {
        let provider = Arc::new(ScriptedProvider::new(vec![Message::assistant(
            "Hello! How can I help?",
        )]));
        let runner = TurnRunner::new(provider, registry_with_lookup());
        let ctx = SessionContext::new("Ada", "London");
        let log = vec![Message::user("hello")];

        let outcome = runner.run(&support_agent(), &log, &ctx).await.unwrap();
        assert_eq!(outcome.messages.len(), 1);
        assert_eq!(outcome.messages[0].content, "Hello! How can I help?");
        assert_eq!(
            outcome.messages[0].sender.as_deref(),
            Some("Customer Service Agent")
        );
        assert!(outcome.agent.is_none());
        // Caller's log is untouched
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn tool_call_turn_interleaves_results() {
        let tool_call_msg = Message::assistant("").with_tool_calls(vec![MessageToolCall {
            id: "call_1".into(),
            name: "lookup_order".into(),
            arguments: r#"{"order_id": "1234"}"#.into(),
        }]);
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_msg,
            Message::assistant("Your order 1234 has shipped."),
        ]));
        let runner = TurnRunner::new(provider, registry_with_lookup());
        let ctx = SessionContext::new("Ada", "London");
        let log = vec![Message::user("where is my order?")];

        let outcome = runner.run(&support_agent(), &log, &ctx).await.unwrap();
        // assistant(tool_calls) → tool result → assistant(text)
        assert_eq!(outcome.messages.len(), 3);
        assert_eq!(outcome.messages[0].tool_calls.len(), 1);
        assert_eq!(outcome.messages[1].tool_call_id.as_deref(), Some("call_1"));
        assert!(outcome.messages[1].content.contains("shipped"));
        assert_eq!(outcome.messages[2].content, "Your order 1234 has shipped.");
    }

    #[tokio::test]
    async fn transfer_tool_hands_the_turn_to_the_new_agent() {
        fn billing_instructions(_ctx: &SessionContext) -> String {
            "You are a billing specialist.".into()
        }

        struct TransferToBilling;

        #[async_trait]
        impl Tool for TransferToBilling {
            fn name(&self) -> &str {
                "transfer_to_billing_agent"
            }
            fn description(&self) -> &str {
                "Transfer the conversation to the billing agent"
            }
            fn parameters_schema(&self) -> serde_json::Value {
                serde_json::json!({ "type": "object", "properties": {} })
            }
            async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
                Ok(ToolResult {
                    call_id: String::new(),
                    success: true,
                    output: serde_json::json!({"assistant": "Billing Agent"}).to_string(),
                    agent: Some(Agent::new("Billing Agent", "llama3.1", billing_instructions)),
                })
            }
        }

        let tool_call_msg = Message::assistant("").with_tool_calls(vec![MessageToolCall {
            id: "call_1".into(),
            name: "transfer_to_billing_agent".into(),
            arguments: "{}".into(),
        }]);
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_msg,
            Message::assistant("You're through to billing."),
        ]));
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(TransferToBilling));
        let runner = TurnRunner::new(provider, Arc::new(registry));
        let ctx = SessionContext::new("Ada", "London");

        let agent = Agent::new("Customer Service Agent", "llama3.1", support_instructions)
            .with_tools(vec!["transfer_to_billing_agent".into()]);
        let outcome = runner
            .run(&agent, &[Message::user("billing please")], &ctx)
            .await
            .unwrap();

        // The rest of the turn runs as the new agent, and the hand-off is
        // reported for the session to adopt.
        assert_eq!(
            outcome.agent.as_ref().map(|a| a.name.as_str()),
            Some("Billing Agent")
        );
        assert_eq!(
            outcome.messages.last().unwrap().sender.as_deref(),
            Some("Billing Agent")
        );
    }

    #[tokio::test]
    async fn unknown_tool_reported_to_model_not_raised() {
        let tool_call_msg = Message::assistant("").with_tool_calls(vec![MessageToolCall {
            id: "call_1".into(),
            name: "no_such_tool".into(),
            arguments: "{}".into(),
        }]);
        let provider = Arc::new(ScriptedProvider::new(vec![
            tool_call_msg,
            Message::assistant("Sorry, I can't do that."),
        ]));
        let runner = TurnRunner::new(provider, registry_with_lookup());
        let ctx = SessionContext::new("Ada", "London");

        let outcome = runner
            .run(&support_agent(), &[Message::user("hi")], &ctx)
            .await
            .unwrap();
        assert!(outcome.messages[1].content.starts_with("Error:"));
        assert!(outcome.messages[1].content.contains("no_such_tool"));
    }

    #[tokio::test]
    async fn iteration_bound_ends_a_looping_turn() {
        // Provider that always asks for another tool call.
        struct LoopingProvider;

        #[async_trait]
        impl Provider for LoopingProvider {
            fn name(&self) -> &str {
                "looping"
            }
            async fn complete(
                &self,
                _request: ProviderRequest,
            ) -> Result<ProviderResponse, ProviderError> {
                Ok(ProviderResponse {
                    message: Message::assistant("").with_tool_calls(vec![MessageToolCall {
                        id: "call_n".into(),
                        name: "lookup_order".into(),
                        arguments: r#"{"order_id": "1"}"#.into(),
                    }]),
                    usage: None,
                    model: "looping".into(),
                })
            }
        }

        let runner = TurnRunner::new(Arc::new(LoopingProvider), registry_with_lookup())
            .with_max_iterations(3);
        let ctx = SessionContext::new("Ada", "London");

        let outcome = runner
            .run(&support_agent(), &[Message::user("loop")], &ctx)
            .await
            .unwrap();
        // 3 iterations of assistant + tool result, then the bound trips
        assert_eq!(outcome.messages.len(), 6);
    }

    #[tokio::test]
    async fn provider_error_propagates() {
        struct FailingProvider;

        #[async_trait]
        impl Provider for FailingProvider {
            fn name(&self) -> &str {
                "failing"
            }
            async fn complete(
                &self,
                _request: ProviderRequest,
            ) -> Result<ProviderResponse, ProviderError> {
                Err(ProviderError::Network("connection refused".into()))
            }
        }

        let runner = TurnRunner::new(Arc::new(FailingProvider), registry_with_lookup());
        let ctx = SessionContext::new("Ada", "London");

        let err = runner
            .run(&support_agent(), &[Message::user("hi")], &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
    }
}
