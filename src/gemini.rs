//! Gemini API client with function-calling support
//!
//! The agent drives one turn at a time: each completion either asks
//! for a tool invocation or delivers the final answer. Uses a
//! long-lived reqwest::Client for connection pooling.

use crate::error::AgentError;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info};

const DEFAULT_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// One step of a model turn: either the model wants a tool executed,
/// or it has produced its final text.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnStep {
    ToolCall { name: String, args: Value },
    Answer(String),
}

/// Opaque completion capability.
///
/// The agent only depends on this seam, so tests can script turns
/// without a network.
#[async_trait::async_trait]
pub trait Completion: Send + Sync {
    async fn complete(
        &self,
        system_instruction: &str,
        contents: &[Content],
        tools: &[FunctionDeclaration],
    ) -> Result<TurnStep>;
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Completion for GeminiClient {
    async fn complete(
        &self,
        system_instruction: &str,
        contents: &[Content],
        tools: &[FunctionDeclaration],
    ) -> Result<TurnStep> {
        if self.api_key.is_empty() {
            return Err(AgentError::ModelUnavailable(
                "GEMINI_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);

        let request = GeminiRequest {
            contents: contents.to_vec(),
            tools: if tools.is_empty() {
                None
            } else {
                Some(vec![ToolConfig {
                    function_declarations: tools.to_vec(),
                }])
            },
            generation_config: GenerationConfig {
                temperature: 0.3,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part::text(system_instruction)],
            },
        };

        info!("Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                if e.is_timeout() {
                    AgentError::UpstreamTimeout(format!("Gemini request timed out: {}", e))
                } else {
                    AgentError::ModelUnavailable(format!("Gemini API error: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response: {}", error_text);
            return Err(AgentError::ModelUnavailable(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            AgentError::ModelUnavailable(format!("Gemini parse error: {}", e))
        })?;

        parse_turn_step(&gemini_response)
    }
}

/// Interpret one candidate as a turn step. A function call wins over
/// any text the model emitted alongside it.
fn parse_turn_step(response: &GeminiResponse) -> Result<TurnStep> {
    let candidate = response.candidates.first().ok_or_else(|| {
        AgentError::ModelUnavailable("No response from Gemini API".to_string())
    })?;

    for part in &candidate.content.parts {
        if let Some(call) = &part.function_call {
            return Ok(TurnStep::ToolCall {
                name: call.name.clone(),
                args: call.args.clone().unwrap_or_else(|| json!({})),
            });
        }
    }

    let answer: String = candidate
        .content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("");

    if answer.is_empty() {
        return Err(AgentError::ModelUnavailable(
            "Empty response from Gemini".to_string(),
        ));
    }

    Ok(TurnStep::Answer(answer))
}

//
// ================= Wire Types =================
//

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolConfig>>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    /// Absent on some candidates (e.g. safety-blocked finishes)
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::text(text)],
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part::text(text)],
        }
    }

    pub fn model_function_call(name: impl Into<String>, args: Value) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part {
                text: None,
                function_call: Some(FunctionCall {
                    name: name.into(),
                    args: Some(args),
                }),
                function_response: None,
            }],
        }
    }

    pub fn function_response(name: impl Into<String>, response: Value) -> Self {
        Self {
            role: "function".to_string(),
            parts: vec![Part {
                text: None,
                function_call: None,
                function_response: Some(FunctionResponse {
                    name: name.into(),
                    response,
                }),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "functionCall", skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(rename = "functionResponse", skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: Value,
}

/// Declaration of one callable tool, advertised to the model's
/// tool-selection mechanism.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Serialize)]
struct ToolConfig {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
