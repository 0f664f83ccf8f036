//! Transaction Insight Agent
//!
//! An HTTP service that answers natural-language questions about a
//! user's bank transactions:
//! - Delegates each query to a language-model agent (Gemini,
//!   function-calling API)
//! - Gives the agent a single data-retrieval tool backed by the
//!   banking provider's API
//! - Normalizes the free-form model reply into structured JSON or
//!   plain text, never failing the request on a malformed reply
//!
//! PIPELINE:
//! QUERY → AGENT (⇄ TRANSACTION TOOL) → RAW REPLY → EXTRACTOR → RESULT

pub mod agent;
pub mod api;
pub mod bunq;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod memory;
pub mod models;
pub mod service;
pub mod tools;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use service::{InsightParams, QueryService};
