//! Banking provider client (bunq-style REST API)
//!
//! Fetches the user's raw payment list. The session handshake is
//! assumed to have happened already; this client only performs the
//! authenticated read. Uses a long-lived reqwest::Client for
//! connection pooling.

use crate::error::AgentError;
use crate::models::Transaction;
use crate::Result;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::time::Duration;
use tracing::{error, info};

const DEFAULT_BASE_URL: &str = "https://public-api.sandbox.bunq.com/v1";

/// Timestamp format the provider emits, e.g. "2025-05-01 12:34:56.123456"
const PROVIDER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Capability for fetching the user's transaction list.
///
/// Returns a full, immutable snapshot every call — no pagination and
/// no caching. Safe to retry, but this layer performs a single attempt.
#[async_trait::async_trait]
pub trait TransactionSource: Send + Sync {
    async fn list_transactions(&self) -> Result<Vec<Transaction>>;
}

/// HTTP client for the provider's payment listing endpoint
pub struct BunqClient {
    client: Client,
    base_url: String,
    session_token: String,
    user_id: String,
    account_id: String,
}

impl BunqClient {
    pub fn new(
        base_url: String,
        session_token: String,
        user_id: String,
        account_id: String,
    ) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_token,
            user_id,
            account_id,
        }
    }

    /// Build a client from environment configuration. Returns `None`
    /// when the session token is not set.
    pub fn from_env() -> Option<Self> {
        let session_token = env::var("BUNQ_SESSION_TOKEN")
            .or_else(|_| env::var("BUNQ_API_KEY"))
            .ok()?;

        let base_url =
            env::var("BUNQ_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let user_id = env::var("BUNQ_USER_ID").unwrap_or_else(|_| "1".to_string());
        let account_id = env::var("BUNQ_ACCOUNT_ID").unwrap_or_else(|_| "1".to_string());

        Some(Self::new(base_url, session_token, user_id, account_id))
    }
}

#[async_trait::async_trait]
impl TransactionSource for BunqClient {
    async fn list_transactions(&self) -> Result<Vec<Transaction>> {
        let url = format!(
            "{}/user/{}/monetary-account/{}/payment",
            self.base_url, self.user_id, self.account_id
        );

        info!("Fetching transactions from provider");

        let response = self
            .client
            .get(&url)
            .header("X-Bunq-Client-Authentication", &self.session_token)
            .send()
            .await
            .map_err(|e| {
                error!("Provider request failed: {}", e);
                if e.is_timeout() {
                    AgentError::UpstreamTimeout(format!("Provider request timed out: {}", e))
                } else {
                    AgentError::UpstreamUnavailable(format!("Provider request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Provider error response ({}): {}", status, body);
            return Err(AgentError::UpstreamUnavailable(format!(
                "Provider returned {}: {}",
                status, body
            )));
        }

        let envelope: PaymentEnvelope = response.json().await.map_err(|e| {
            AgentError::UpstreamUnavailable(format!("Invalid provider response: {}", e))
        })?;

        let transactions = envelope
            .response
            .into_iter()
            .map(|item| item.payment.into_transaction())
            .collect::<Result<Vec<_>>>()?;

        info!("Fetched {} transactions", transactions.len());

        Ok(transactions)
    }
}

//
// ================= Wire Types =================
//

#[derive(Debug, Deserialize)]
struct PaymentEnvelope {
    #[serde(rename = "Response")]
    response: Vec<PaymentItem>,
}

#[derive(Debug, Deserialize)]
struct PaymentItem {
    #[serde(rename = "Payment")]
    payment: PaymentWire,
}

#[derive(Debug, Clone, Deserialize)]
struct PaymentWire {
    id: i64,
    created: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    sub_type: String,
    amount: AmountWire,
    counterparty_alias: AliasWire,
}

#[derive(Debug, Clone, Deserialize)]
struct AmountWire {
    value: Decimal,
    currency: String,
}

#[derive(Debug, Clone, Deserialize)]
struct AliasWire {
    #[serde(default)]
    display_name: String,
}

impl PaymentWire {
    fn into_transaction(self) -> Result<Transaction> {
        Ok(Transaction {
            id: self.id.to_string(),
            amount: self.amount.value,
            currency: self.amount.currency,
            created_at: parse_provider_timestamp(&self.created)?,
            description: self.description,
            counterparty_alias: self.counterparty_alias.display_name,
            sub_type: self.sub_type,
        })
    }
}

/// Parse the provider's space-separated timestamp, with RFC 3339 as a
/// fallback for newer API versions.
fn parse_provider_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, PROVIDER_TIMESTAMP_FORMAT) {
        return Ok(Utc.from_utc_datetime(&naive));
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            AgentError::UpstreamUnavailable(format!("Unparseable timestamp {:?}: {}", raw, e))
        })
}
