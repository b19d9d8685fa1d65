//! OpenAI-compatible chat client and two-stage answer adapter.
//!
//! The adapter queries a primary model for a full reasoning trace, then
//! a (usually identical) extraction model to distill the final answer
//! token. Extraction output is validated against the task's answer
//! format; anything unusable falls back to the format default so a bad
//! response never aborts a benchmark run.

use reqwest::blocking::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::HarnessError;

/// Expected shape of a task's final answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerFormat {
    /// Single letter out of the first `choices` letters (A, B, C, ...).
    MultipleChoice { choices: u8 },
    /// Yes/No/True/False.
    Boolean,
    /// A (possibly negative) integer.
    Integer,
    /// Unconstrained short text, passed through as-is.
    FreeText,
}

impl AnswerFormat {
    /// Highest admissible choice letter for multiple choice.
    fn last_choice(&self) -> char {
        match self {
            AnswerFormat::MultipleChoice { choices } => {
                let n = (*choices).clamp(1, 26);
                (b'A' + n - 1) as char
            }
            _ => 'A',
        }
    }

    /// Prompt sent to the extraction model, wrapping the raw reasoning trace.
    pub fn extraction_prompt(&self, raw: &str) -> String {
        match self {
            AnswerFormat::MultipleChoice { .. } => format!(
                "Extract only the final answer from this response. \
                 Return a single letter from 'A' to '{}' and nothing else:\n\n{raw}",
                self.last_choice()
            ),
            AnswerFormat::Boolean => format!(
                "Extract only the final answer from this response. \
                 Only return 'Yes', 'No', 'True' or 'False':\n\n{raw}"
            ),
            AnswerFormat::Integer => format!(
                "Extract only the final answer from this response. \
                 Only return the final integer result and nothing else:\n\n{raw}"
            ),
            AnswerFormat::FreeText => format!(
                "Extract only the final answer from this response, \
                 with no explanation or extra words:\n\n{raw}"
            ),
        }
    }

    /// Default substituted when extraction output is unusable.
    /// Choice-constrained formats (multiple choice and boolean) both
    /// default to the first choice letter.
    pub fn fallback(&self) -> &'static str {
        match self {
            AnswerFormat::MultipleChoice { .. } | AnswerFormat::Boolean => "A",
            AnswerFormat::Integer => "0",
            AnswerFormat::FreeText => "",
        }
    }

    /// Validate extraction output: first whitespace-delimited token for
    /// constrained formats, whole trimmed text for free text.
    pub fn extract(&self, raw: &str) -> Option<String> {
        if let AnswerFormat::FreeText = self {
            let text = raw.trim();
            return if text.is_empty() {
                None
            } else {
                Some(text.to_string())
            };
        }

        let token = raw.split_whitespace().next()?;
        // Strip decoration like "(A)", "A.", "A)".
        let clean = token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-');

        match self {
            AnswerFormat::MultipleChoice { .. } => {
                let mut chars = clean.chars();
                let letter = chars.next()?.to_ascii_uppercase();
                if chars.next().is_none() && ('A'..=self.last_choice()).contains(&letter) {
                    Some(letter.to_string())
                } else {
                    None
                }
            }
            AnswerFormat::Boolean => match clean.to_ascii_lowercase().as_str() {
                "yes" => Some("Yes".to_string()),
                "no" => Some("No".to_string()),
                "true" => Some("True".to_string()),
                "false" => Some("False".to_string()),
                _ => None,
            },
            AnswerFormat::Integer => clean
                .replace(',', "")
                .parse::<i64>()
                .ok()
                .map(|n| n.to_string()),
            AnswerFormat::FreeText => unreachable!("handled above"),
        }
    }

    /// Pull the final answer out of extraction output, substituting the
    /// format default when validation fails.
    pub fn resolve(&self, raw: &str) -> String {
        match self.extract(raw) {
            Some(answer) => answer,
            None => {
                warn!(
                    raw = raw.trim(),
                    fallback = self.fallback(),
                    "unusable extraction output, using fallback"
                );
                self.fallback().to_string()
            }
        }
    }
}

/// The interface the suite evaluator drives.
///
/// Implemented by [`OpenWebUiModel`] for real runs and by scripted
/// stand-ins in tests.
pub trait AnswerModel {
    /// Answer a single benchmark problem in the given format.
    fn generate(&self, prompt: &str, format: AnswerFormat) -> String;

    /// Identifier recorded in the results CSV.
    fn model_name(&self) -> String;
}

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Chat-completions URL, e.g. `http://localhost:3000/api/chat/completions`.
    pub api_url: String,
    /// Primary model generating the full reasoning trace.
    pub model: String,
    /// Secondary model distilling the final answer.
    pub extraction_model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api/chat/completions".to_string(),
            model: "llama3.2:latest".to_string(),
            extraction_model: "llama3.2:latest".to_string(),
            api_key_env: "OPENWEBUI_API_KEY".to_string(),
        }
    }
}

/// Two-stage adapter over an OpenAI-compatible chat endpoint.
pub struct OpenWebUiModel {
    client: Client,
    api_url: String,
    model: String,
    extraction_model: String,
    api_key: String,
}

impl OpenWebUiModel {
    /// Create an adapter, resolving the API key from the configured
    /// environment variable.
    ///
    /// Localhost endpoints (OpenWebUI, Ollama, vLLM) don't check the
    /// bearer token, so a missing variable falls back to a dummy key
    /// there; remote endpoints require it.
    pub fn new(config: ModelConfig) -> Result<Self, HarnessError> {
        let is_local =
            config.api_url.contains("localhost") || config.api_url.contains("127.0.0.1");

        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .or_else(|| {
                if is_local {
                    debug!("no API key set for local endpoint; using dummy bearer token");
                    Some("local".to_string())
                } else {
                    None
                }
            })
            .ok_or(HarnessError::AuthFailed {
                env_var: config.api_key_env,
            })?;

        Ok(Self {
            client: Client::new(),
            api_url: config.api_url,
            model: config.model,
            extraction_model: config.extraction_model,
            api_key,
        })
    }

    /// One chat-completion round trip. All HTTP and body-shape failures
    /// surface here as structured errors.
    fn chat(
        &self,
        model: &str,
        prompt: &str,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String, HarnessError> {
        let mut body = json!({
            "model": model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        if let Some(t) = temperature {
            body["temperature"] = json!(t);
        }
        if let Some(m) = max_tokens {
            body["max_tokens"] = json!(m);
        }

        debug!(url = %self.api_url, model, "sending chat completion request");

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .map_err(|e| HarnessError::ApiRequest {
                message: format!("request failed: {e}"),
            })?;

        let status = response.status();
        let text = response.text().map_err(|e| HarnessError::ApiRequest {
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            return Err(map_http_error(status, &text));
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| HarnessError::ResponseParse {
            message: format!("invalid JSON: {e}"),
        })?;
        parse_content(&json)
    }
}

impl AnswerModel for OpenWebUiModel {
    fn generate(&self, prompt: &str, format: AnswerFormat) -> String {
        // Step 1: full thought process from the primary model.
        let thought = match self.chat(&self.model, prompt, None, None) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, model = %self.model, "generation request failed");
                return format.fallback().to_string();
            }
        };
        debug!(raw = %thought, "raw thought process");

        // Step 2: the extraction model distills the final answer.
        // Temperature 0 and a tiny token budget keep it to one token.
        let extraction = format.extraction_prompt(&thought);
        let extracted = match self.chat(&self.extraction_model, &extraction, Some(0.0), Some(5)) {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, model = %self.extraction_model, "extraction request failed");
                "Error".to_string()
            }
        };

        format.resolve(&extracted)
    }

    fn model_name(&self) -> String {
        format!("{} + {}", self.model, self.extraction_model)
    }
}

/// Extract `choices[0].message.content` from a chat-completion body.
fn parse_content(body: &Value) -> Result<String, HarnessError> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.trim().to_string())
        .ok_or_else(|| HarnessError::ResponseParse {
            message: "no choices[0].message.content in response".to_string(),
        })
}

/// Map a non-2xx chat-completion status to a harness error.
fn map_http_error(status: reqwest::StatusCode, body: &str) -> HarnessError {
    let message = match status.as_u16() {
        401 => format!("authentication rejected (401): {body}"),
        429 => format!("rate limited (429): {body}"),
        s if s >= 500 => format!("server error ({s}): {body}"),
        s => format!("HTTP {s}: {body}"),
    };
    HarnessError::ApiRequest { message }
}
