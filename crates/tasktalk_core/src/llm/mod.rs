//! Boundary to the remote completion service.
//!
//! Everything the core needs from a language model is text in, text out.
//! Tests substitute a scripted [`CompletionClient`].

mod openai;

pub use openai::OpenAiClient;

use crate::error::AppError;
use async_trait::async_trait;

/// Low temperature keeps intent extraction close to deterministic.
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new<S: Into<String>, U: Into<String>>(system: S, user: U) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one request and returns the model's text reply. Never retries.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AppError>;
}
