//! Gemini-backed narrator.
//!
//! Only compiled with the `http` feature. Configuration comes from the
//! environment; the request is a single `generateContent` call whose text
//! reply is handed to [`parse_reply`].
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::{env, time::Duration};

use crate::narrative::{
    NarrativeCollaborator, NarrativeError, NarrativeEvent, NarrativeRequest, parse_reply,
};

pub const API_KEY_VAR: &str = "RVTRAIL_GEMINI_API_KEY";
pub const MODEL_VAR: &str = "RVTRAIL_GEMINI_MODEL";
pub const BASE_URL_VAR: &str = "RVTRAIL_GEMINI_BASE_URL";
pub const TIMEOUT_VAR: &str = "RVTRAIL_GEMINI_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const ERROR_BODY_LIMIT: usize = 200;
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    /// Read the configuration from `RVTRAIL_GEMINI_*` variables.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::MissingApiKey`] when no key is set.
    pub fn from_env() -> Result<Self, NarrativeError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`GeminiConfig::from_env`] with a custom variable source.
    ///
    /// # Errors
    ///
    /// Returns [`NarrativeError::MissingApiKey`] when no key is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NarrativeError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read(API_KEY_VAR).ok_or(NarrativeError::MissingApiKey(API_KEY_VAR))?;
        let base_url = read(BASE_URL_VAR).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = read(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout = read(TIMEOUT_VAR)
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs);

        Ok(Self {
            api_key,
            base_url,
            model,
            timeout,
        })
    }

    /// Endpoint without the key; the key travels in the `x-goog-api-key` header.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Narrator calling the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiNarrator {
    http: Client,
    config: GeminiConfig,
}

impl GeminiNarrator {
    /// # Errors
    ///
    /// Returns [`NarrativeError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: GeminiConfig) -> Result<Self, NarrativeError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| NarrativeError::Transport(err.to_string()))?;
        Ok(Self { http, config })
    }

    /// # Errors
    ///
    /// Fails when the key is missing or the client cannot be built.
    pub fn from_env() -> Result<Self, NarrativeError> {
        GeminiConfig::from_env().and_then(Self::new)
    }

    #[must_use]
    pub const fn config(&self) -> &GeminiConfig {
        &self.config
    }
}

#[async_trait]
impl NarrativeCollaborator for GeminiNarrator {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate(&self, request: &NarrativeRequest) -> Result<NarrativeEvent, NarrativeError> {
        let payload = GenerateRequest::from_prompt(build_prompt(request));
        let response = self
            .http
            .post(self.config.endpoint())
            .header(API_KEY_HEADER, self.config.api_key.as_str())
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let envelope: GenerateResponse = response
            .json()
            .await
            .map_err(|err| NarrativeError::Malformed(err.without_url().to_string()))?;
        let text = envelope
            .into_text()
            .ok_or_else(|| NarrativeError::Malformed("reply carried no text".into()))?;
        log::trace!("gemini reply: {text}");
        Ok(parse_reply(&text))
    }
}

// reqwest errors render the request URL; keep it out of logs
fn transport_error(err: reqwest::Error) -> NarrativeError {
    NarrativeError::Transport(err.without_url().to_string())
}

fn status_error(status: StatusCode, body: &str) -> NarrativeError {
    let message = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| body.chars().take(ERROR_BODY_LIMIT).collect(),
        |envelope| envelope.error.message,
    );
    NarrativeError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Prompt asking for a short road event plus its numeric effect.
#[must_use]
pub fn build_prompt(request: &NarrativeRequest) -> String {
    let stats = &request.stats;
    format!(
        "You design events for a post-apocalyptic RV survival game.\n\
         Current situation:\n\
         - City: {city}\n\
         - Distance to the safe zone: {remaining} km\n\
         - Health {health}, hunger {hunger}, thirst {thirst}, sanity {sanity}\n\
         - RV level: {rv}\n\
         - Weapon: {weapon}\n\
         Write one sudden event (under 100 words) and its effect on the game as JSON.\n\
         The effect may include stats (health, hunger, thirst, sanity), materials and \
         inventory (food, water, meds, samples).\n\
         Format:\n\
         Description: [event text]\n\
         JSON: {{\"stats\": {{\"health\": -5}}, \"materials\": 10}}",
        city = request.city,
        remaining = request.distance_remaining,
        health = stats.health,
        hunger = stats.hunger,
        thirst = stats.thirst,
        sanity = stats.sanity,
        rv = request.rv_level,
        weapon = request.weapon_name,
    )
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

impl GenerateRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

impl GenerateResponse {
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        let text: String = candidate
            .content
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}
