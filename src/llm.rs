use crate::circuit_breaker::{call_guarded, create_proxy_circuit_breaker, ProxyCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::services::{read_json, relay_json};
use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One turn of a running conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

/// Prompt plus optional history, as accepted by `POST /api/gemini`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            history: Vec::new(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// ============ Provider schema ============

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

impl From<&GenerationRequest> for GeminiRequest {
    fn from(request: &GenerationRequest) -> Self {
        let role_name = |role: ChatRole| match role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };

        let mut contents: Vec<GeminiContent> = request
            .history
            .iter()
            .map(|message| GeminiContent {
                role: Some(role_name(message.role).to_string()),
                parts: vec![GeminiPart {
                    text: Some(message.text.clone()),
                }],
            })
            .collect();
        contents.push(GeminiContent {
            role: Some("user".to_string()),
            parts: vec![GeminiPart {
                text: Some(request.prompt.clone()),
            }],
        });

        GeminiRequest {
            contents,
            generation_config: request
                .temperature
                .map(|temperature| GeminiGenerationConfig { temperature }),
        }
    }
}

impl GeminiResponse {
    /// Text of the first candidate, with its parts concatenated.
    fn into_text(self) -> Result<String, AppError> {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AppError::ExternalApiError(
                "Text generation returned no candidates".to_string(),
            ));
        }
        Ok(text)
    }
}

// ============ Client ============

/// Client for the text-generation provider.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    proxy_base_url: Option<String>,
    base_url: String,
    model: String,
    api_key: String,
    proxy_breaker: ProxyCircuitBreaker,
}

impl GeminiClient {
    pub fn new(config: &Config, client: Client) -> Self {
        Self {
            client,
            proxy_base_url: config.proxy_base_url.clone(),
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            api_key: config.gemini_api_key.clone(),
            proxy_breaker: create_proxy_circuit_breaker(),
        }
    }

    /// Generates text, trying the proxy first and the provider second.
    pub async fn generate_text(&self, request: &GenerationRequest) -> Result<String, AppError> {
        if let Some(ref proxy) = self.proxy_base_url {
            let answer = call_guarded(&self.proxy_breaker, self.generate_via_proxy(proxy, request))
                .await
                .and_then(GeminiResponse::into_text);
            match answer {
                Ok(text) => return Ok(text),
                Err(e) => tracing::warn!("Text generation proxy failed, trying provider: {}", e),
            }
        }

        let response = self.send_upstream(request).await?;
        read_json::<GeminiResponse>(response, "Gemini")
            .await?
            .into_text()
    }

    async fn generate_via_proxy(
        &self,
        proxy: &str,
        request: &GenerationRequest,
    ) -> Result<GeminiResponse, AppError> {
        let response = self
            .client
            .post(format!("{}/api/gemini", proxy))
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Gemini proxy request failed: {}", e)))?;

        read_json(response, "Gemini proxy").await
    }

    /// Raw upstream call used by the proxy endpoint.
    pub async fn generate_upstream(
        &self,
        request: &GenerationRequest,
    ) -> Result<(StatusCode, Value), AppError> {
        let response = self.send_upstream(request).await?;
        relay_json(response, "Gemini").await
    }

    async fn send_upstream(&self, request: &GenerationRequest) -> Result<reqwest::Response, AppError> {
        let url = reqwest::Url::parse_with_params(
            &format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ),
            &[("key", self.api_key.as_str())],
        )
        .map_err(|e| AppError::ExternalApiError(format!("Failed to build URL: {}", e)))?;

        tracing::debug!(
            "Gemini URL: {}/v1beta/models/{}:generateContent?key=[REDACTED] ({} history turns)",
            self.base_url,
            self.model,
            request.history.len()
        );

        self.client
            .post(url)
            .json(&GeminiRequest::from(request))
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Gemini request failed: {}", e)))
    }
}
