//! Core data models for the insight pipeline

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//
// ================= Query =================
//

/// One incoming question, scoped to a user and session.
/// Identifiers are resolved before the agent runs; the agent never
/// sees the raw request strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub user_id: Uuid,
    pub session_id: Uuid,
}

//
// ================= Transaction =================
//

/// Immutable snapshot of a single payment returned by the banking
/// provider. Never mutated after the fetch; only projected into the
/// agent's tool output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub amount: Decimal,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub description: String,
    pub counterparty_alias: String,
    pub sub_type: String,
}

//
// ================= Agent Output =================
//

/// Unstructured output of one agent turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawReply {
    pub text: String,
}

/// The JSON shape the agent instructions ask the model to emit.
/// The prompt permits `all_transactions` or `top_transactions` as the
/// array key; both are accepted on parse.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StructuredInsight {
    pub response: String,
    #[serde(
        default,
        alias = "all_transactions",
        alias = "top_transactions"
    )]
    pub transactions: Vec<serde_json::Value>,
}

/// Normalized result returned to the caller. Serializes either as the
/// structured object or as a bare JSON string, matching the wire
/// behavior callers already depend on.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum InsightResult {
    Structured(StructuredInsight),
    Plain(String),
}

impl InsightResult {
    /// Human-readable text of the result, for logging and memory.
    pub fn as_text(&self) -> &str {
        match self {
            InsightResult::Structured(insight) => &insight.response,
            InsightResult::Plain(text) => text,
        }
    }
}
