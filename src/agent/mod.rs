//! Insight agent - conducts one conversational turn
//!
//! RECEIVED → REASONING (⇄ TOOL INVOKED, bounded) → FINAL ANSWER
//!
//! The model decides whether and how many times to call the
//! transaction tool; this loop only enforces the bound and feeds tool
//! results (or tool failures) back into the conversation.

use crate::gemini::{Completion, Content, TurnStep};
use crate::memory::{MessageRole, SessionHistory, SessionStore, TurnMessage};
use crate::models::{Query, RawReply};
use crate::tools::ToolRegistry;
use crate::error::AgentError;
use crate::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum tool invocations per turn (defensive guard against
/// unbounded tool-call cycles)
const MAX_TOOL_CALLS: usize = 4;

/// Messages kept per session after a completed turn
const MAX_HISTORY_MESSAGES: usize = 20;

const SYSTEM_INSTRUCTION: &str = r#"You are an AI assistant that helps with getting insights from the user's bank transactions.

When you need transaction data, call the get_user_transactions tool. If the tool fails, say so in your answer instead of inventing data.

Reply with raw JSON in exactly this shape:
{"response": "<one-paragraph summary answering the question>", "all_transactions": [<the transaction records relevant to the answer>]}

Use "top_transactions" instead of "all_transactions" when the user asks for a ranked subset. Do not wrap the JSON in a code fence."#;

/// Orchestrates one query-to-reply turn with tool access
pub struct InsightAgent {
    completion: Arc<dyn Completion>,
    tools: ToolRegistry,
    memory: Arc<dyn SessionStore>,
}

impl InsightAgent {
    pub fn new(
        completion: Arc<dyn Completion>,
        tools: ToolRegistry,
        memory: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            completion,
            tools,
            memory,
        }
    }

    /// Run one turn. Tool failures are surfaced to the model, which
    /// decides whether to retry, apologize, or answer without data;
    /// only a model backend failure aborts the turn.
    pub async fn run(&self, query: &Query) -> Result<RawReply> {
        let mut contents = self.load_session_context(query).await;
        contents.push(Content::user_text(&query.text));

        let declarations = self.tools.declarations();
        let mut tool_calls = 0;

        loop {
            let step = self
                .completion
                .complete(SYSTEM_INSTRUCTION, &contents, &declarations)
                .await?;

            match step {
                TurnStep::Answer(text) => {
                    debug!(chars = text.len(), "Turn reached final answer");
                    self.persist_turn(query, &text).await;
                    return Ok(RawReply { text });
                }

                TurnStep::ToolCall { name, args } => {
                    tool_calls += 1;
                    if tool_calls > MAX_TOOL_CALLS {
                        warn!(tool_calls, "Tool call limit exceeded");
                        return Err(AgentError::ToolLimitExceeded(MAX_TOOL_CALLS));
                    }

                    info!(tool = %name, "Model requested tool invocation");

                    contents.push(Content::model_function_call(&name, args.clone()));

                    let response = match self.tools.get(&name) {
                        Some(tool) => match tool.execute(&args).await {
                            Ok(output) => json!({ "result": output }),
                            Err(e) => {
                                warn!(tool = %name, error = %e, "Tool execution failed");
                                json!({ "error": e.to_string() })
                            }
                        },
                        None => {
                            warn!(tool = %name, "Model requested unregistered tool");
                            let error = AgentError::ToolNotFound(name.clone());
                            json!({ "error": error.to_string() })
                        }
                    };

                    contents.push(Content::function_response(&name, response));
                }
            }
        }
    }

    /// Prior turns for this session, oldest first. A missing history
    /// or store failure just means an empty context.
    async fn load_session_context(&self, query: &Query) -> Vec<Content> {
        let history = match self.memory.get(query.user_id, query.session_id).await {
            Ok(Some(history)) => history,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to load session history");
                return Vec::new();
            }
        };

        history
            .messages()
            .map(|msg| match msg.role {
                MessageRole::User => Content::user_text(&msg.content),
                MessageRole::Agent => Content::model_text(&msg.content),
            })
            .collect()
    }

    /// Record the completed turn. Memory failure is logged, never
    /// fatal: the caller already has the answer.
    async fn persist_turn(&self, query: &Query, answer: &str) {
        let mut history = match self.memory.get(query.user_id, query.session_id).await {
            Ok(Some(history)) => history,
            Ok(None) => SessionHistory::new(query.user_id, query.session_id),
            Err(e) => {
                warn!(error = %e, "Failed to load session history for persist");
                return;
            }
        };

        history.add_message(TurnMessage::new(MessageRole::User, query.text.clone()));
        history.add_message(TurnMessage::new(MessageRole::Agent, answer.to_string()));
        history.trim_to_recent(MAX_HISTORY_MESSAGES);

        if let Err(e) = self.memory.put(history).await {
            warn!(error = %e, "Failed to persist session history");
        }
    }
}
