use super::{CompletionClient, CompletionRequest};
use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Client for any OpenAI-compatible chat completions endpoint.
pub struct OpenAiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(base_url: String, api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Option<Vec<ChatChoice>>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

fn build_request(model: &str, request: &CompletionRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        temperature: request.temperature,
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: request.system.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: request.user.clone(),
            },
        ],
    }
}

fn first_message(response: ChatCompletionResponse) -> Option<String> {
    response
        .choices?
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .map(|message| message.content)
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError> {
        let url = self.endpoint();
        let body = build_request(&self.model, request);
        let start = Instant::now();
        debug!("completion: POST {url} model={}", self.model);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| AppError::service(format!("request failed: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::service(format!("endpoint returned {status}: {text}")));
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|err| AppError::service(format!("failed to parse response: {err}")))?;

        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "completion: response received"
        );

        first_message(parsed).ok_or_else(|| AppError::service("empty response"))
    }
}
