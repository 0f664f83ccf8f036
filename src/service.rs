//! Query intake and response normalization
//!
//! Validates the raw request, invokes the agent, and pipes the raw
//! reply through the extractor. The only input the agent ever sees is
//! a validated [`Query`].

use crate::agent::InsightAgent;
use crate::error::AgentError;
use crate::extract;
use crate::models::{InsightResult, Query};
use crate::Result;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// Raw request parameters, straight from the HTTP query string
#[derive(Debug, Default, Clone, Deserialize)]
pub struct InsightParams {
    pub query: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

/// HTTP-facing entry point of the pipeline
pub struct QueryService {
    agent: Arc<InsightAgent>,
}

impl QueryService {
    pub fn new(agent: Arc<InsightAgent>) -> Self {
        Self { agent }
    }

    /// Handle one query. A missing or empty `query` is rejected here
    /// and never reaches the agent.
    pub async fn handle(&self, params: InsightParams) -> Result<InsightResult> {
        let text = params.query.as_deref().map(str::trim).unwrap_or_default();
        if text.is_empty() {
            return Err(AgentError::InvalidQuery(
                "Missing required 'query' parameter".to_string(),
            ));
        }

        let query = Query {
            text: text.to_string(),
            user_id: parse_or_stable_uuid(params.user_id.as_deref(), "anonymous-user"),
            session_id: parse_or_stable_uuid(params.session_id.as_deref(), "default-session"),
        };

        info!("Running the query: {}", query.text);

        let reply = self.agent.run(&query).await?;
        info!(chars = reply.text.len(), "Raw reply received");

        Ok(extract::extract(&reply.text))
    }
}

//
// ================= Identifier Resolution =================
//

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

/// Resolve a free-form identifier to a UUID: parse it if it already
/// is one, otherwise derive a stable UUID from it; absent values fall
/// back to a fixed placeholder seed.
pub fn parse_or_stable_uuid(value: Option<&str>, fallback_seed: &str) -> uuid::Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            uuid::Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => stable_uuid_from_string(fallback_seed),
    }
}
