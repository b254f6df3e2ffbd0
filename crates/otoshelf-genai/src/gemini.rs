//! Gemini REST implementation of the generative provider.

use crate::error::GenAiError;
use crate::provider::{GenerativeProvider, ReplyStream};
use crate::types::{GenerateContentResponse, GenerateRequest};
use async_trait::async_trait;
use futures_util::StreamExt;
use log::{debug, warn};
use serde_json::{Value, json};

/// Default generative-language service endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Client for the Gemini `generateContent` API family.
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiProvider {
    /// Create a new provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Override the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the JSON request body for a generation request.
    fn build_request_body(request: &GenerateRequest) -> Value {
        let contents: Vec<Value> = request
            .contents
            .iter()
            .map(|content| {
                json!({
                    "role": content.role,
                    "parts": content.parts,
                })
            })
            .collect();

        let mut body = json!({ "contents": contents });
        if let Some(system) = &request.system_instruction {
            body["systemInstruction"] = json!({ "parts": [ { "text": system } ] });
        }
        body
    }

    /// Parse one SSE payload line into a response, ignoring non-JSON noise.
    fn parse_stream_line(line: &str) -> Option<GenerateContentResponse> {
        serde_json::from_str(line).ok()
    }

    /// Endpoint URL for the given model and method.
    fn endpoint(&self, model: &str, method: &str, streamed: bool) -> String {
        let query = if streamed {
            format!("?alt=sse&key={}", self.api_key)
        } else {
            format!("?key={}", self.api_key)
        };
        format!("{}/v1beta/models/{model}:{method}{query}", self.base_url)
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    fn stream_generate(&self, request: GenerateRequest) -> ReplyStream {
        let http = self.http.clone();
        let url = self.endpoint(&request.model, "streamGenerateContent", true);
        let body = Self::build_request_body(&request);

        Box::pin(async_stream::try_stream! {
            debug!(
                "opening generation stream (model={}, turns={})",
                request.model,
                request.contents.len()
            );
            let response = http.post(&url).json(&body).send().await?;

            let status = response.status();
            let mut bytes = if status.is_success() {
                response.bytes_stream()
            } else {
                let message = response.text().await.unwrap_or_default();
                warn!("stream request rejected (status={})", status.as_u16());
                Err(GenAiError::Status {
                    status: status.as_u16(),
                    message,
                })?
            };

            let mut buffer = String::with_capacity(512);
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // The service emits one JSON object per SSE data line.
                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim();
                    let parsed = if line.is_empty() {
                        None
                    } else {
                        let data = line.strip_prefix("data: ").unwrap_or(line);
                        Self::parse_stream_line(data)
                    };
                    buffer.drain(..=newline);

                    if let Some(payload) = parsed {
                        let delta = match &payload.error {
                            Some(error) => {
                                let message = error
                                    .message
                                    .clone()
                                    .unwrap_or_else(|| "unknown error".to_string());
                                Err(GenAiError::Service(message))?
                            }
                            None => payload.text(),
                        };
                        if !delta.is_empty() {
                            yield delta;
                        }
                    }
                }
            }
        })
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, GenAiError> {
        let url = self.endpoint(&request.model, "generateContent", false);
        let body = Self::build_request_body(&request);
        debug!(
            "issuing one-shot generation (model={}, turns={})",
            request.model,
            request.contents.len()
        );

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GenAiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| GenAiError::MalformedResponse(err.to_string()))?;
        if let Some(error) = &payload.error {
            return Err(GenAiError::Service(
                error
                    .message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let text = payload.text();
        if text.is_empty() {
            return Err(GenAiError::EmptyResponse);
        }
        Ok(text)
    }
}
