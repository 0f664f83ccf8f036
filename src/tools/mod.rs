//! Tool trait and registry
//!
//! Tools are the capabilities advertised to the model's tool-selection
//! mechanism. Each invocation is a fresh upstream call; nothing is
//! cached across invocations within a turn.

use crate::bunq::TransactionSource;
use crate::error::AgentError;
use crate::gemini::FunctionDeclaration;
use crate::Result;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Trait for a single tool
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;

    /// JSON schema for the tool's arguments
    fn parameters(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, args: &Value) -> Result<Value>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Function declarations for every registered tool, in the form
    /// the completion backend expects.
    pub fn declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools
            .values()
            .map(|tool| FunctionDeclaration {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The single data-retrieval tool: fetches all of the user's
/// transactions and returns them as a JSON-encoded array string.
pub struct GetTransactionsTool {
    source: Arc<dyn TransactionSource>,
}

impl GetTransactionsTool {
    pub fn new(source: Arc<dyn TransactionSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl Tool for GetTransactionsTool {
    fn name(&self) -> &'static str {
        "get_user_transactions"
    }

    fn description(&self) -> &'static str {
        "Get the user's bank transactions as a JSON array"
    }

    async fn execute(&self, args: &Value) -> Result<Value> {
        if !args.is_object() && !args.is_null() {
            return Err(AgentError::InvalidToolInput(
                "Tool arguments must be a JSON object".to_string(),
            ));
        }

        info!("Getting transactions...");

        // One upstream fetch per invocation. If the model calls the
        // tool twice, the provider is hit twice.
        let transactions = self.source.list_transactions().await?;

        Ok(Value::String(serde_json::to_string(&transactions)?))
    }
}

/// Create the default registry wired to the given transaction source.
pub fn create_default_registry(source: Arc<dyn TransactionSource>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(GetTransactionsTool::new(source)));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Transaction;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) struct CountingSource {
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl CountingSource {
        pub(crate) fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }
    }

    #[async_trait::async_trait]
    impl TransactionSource for CountingSource {
        async fn list_transactions(&self) -> Result<Vec<Transaction>> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(AgentError::UpstreamUnavailable(
                    "provider unreachable".to_string(),
                ));
            }

            Ok(vec![Transaction {
                id: "txn_1".to_string(),
                amount: "-5.50".parse().unwrap(),
                currency: "EUR".to_string(),
                created_at: Utc::now(),
                description: "Sample Merchant".to_string(),
                counterparty_alias: "Merchant BV".to_string(),
                sub_type: "PAYMENT".to_string(),
            }])
        }
    }

    #[tokio::test]
    async fn two_invocations_hit_the_source_twice() {
        let source = Arc::new(CountingSource::new(false));
        let tool = GetTransactionsTool::new(source.clone());

        tool.execute(&json!({})).await.unwrap();
        tool.execute(&json!({})).await.unwrap();

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn output_is_a_json_encoded_array_string() {
        let source = Arc::new(CountingSource::new(false));
        let tool = GetTransactionsTool::new(source);

        let output = tool.execute(&json!({})).await.unwrap();
        let encoded = output.as_str().expect("tool output should be a string");

        let decoded: Vec<Transaction> = serde_json::from_str(encoded).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, "txn_1");
    }

    #[tokio::test]
    async fn non_object_arguments_are_rejected() {
        let source = Arc::new(CountingSource::new(false));
        let tool = GetTransactionsTool::new(source.clone());

        let result = tool.execute(&json!("not an object")).await;
        assert!(matches!(result, Err(AgentError::InvalidToolInput(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn source_failure_propagates_as_tool_error() {
        let source = Arc::new(CountingSource::new(true));
        let tool = GetTransactionsTool::new(source);

        let result = tool.execute(&json!({})).await;
        assert!(matches!(result, Err(AgentError::UpstreamUnavailable(_))));
    }

    #[test]
    fn registry_advertises_the_transaction_tool() {
        let source = Arc::new(CountingSource::new(false));
        let registry = create_default_registry(source);

        assert!(registry.get("get_user_transactions").is_some());

        let declarations = registry.declarations();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0].name, "get_user_transactions");
    }
}
