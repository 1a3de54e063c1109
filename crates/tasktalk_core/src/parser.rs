//! Turns free-form user text into an [`Intent`].
//!
//! This is the only place where model output is trusted or rejected:
//! anything unusable becomes the `list` intent instead of an error, so the
//! interactive loop never fails on a confusing answer.

use crate::due::now_local;
use crate::llm::{CompletionClient, CompletionRequest, DEFAULT_TEMPERATURE};
use crate::model::Intent;
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

const PARSE_SYSTEM_PROMPT: &str = r#"You turn a user's request about their to-do list into a single JSON object.

AVAILABLE COMMANDS:
- add: create a task. Needs "description". Optional "dueDate" (ISO-8601) and "category".
- list: show the tasks. Optional "category" to show only that category.
- complete: mark a task as done. Use "id" when the user gives a number, otherwise "description" with words from the task.
- summary: summarize the current tasks.

OUTPUT FORMAT (JSON only, no explanation, no code fences):
{"command": "add|list|complete|summary", "description": "...", "dueDate": "...", "id": 1, "category": "..."}
Leave out fields that do not apply. Resolve relative dates ("tomorrow at 5 PM") against the current date given below.

Examples:
"remind me to buy groceries at 5 PM tomorrow" -> {"command": "add", "description": "buy groceries at 5 PM tomorrow", "dueDate": "2025-12-21T17:00:00"}
"what do I have to do?" -> {"command": "list"}
"I finished the groceries" -> {"command": "complete", "description": "groceries"}
"mark 3 as done" -> {"command": "complete", "id": 3}
"give me an overview" -> {"command": "summary"}"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The completion service failed or was unreachable.
    Service(String),
    /// The service answered with something that is not a JSON object.
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Parsed(Intent),
    Fallback {
        intent: Intent,
        reason: FallbackReason,
    },
}

impl ParseOutcome {
    fn fallback(reason: FallbackReason) -> Self {
        Self::Fallback {
            intent: Intent::list(),
            reason,
        }
    }

    pub fn intent(&self) -> &Intent {
        match self {
            Self::Parsed(intent) => intent,
            Self::Fallback { intent, .. } => intent,
        }
    }

    pub fn into_intent(self) -> Intent {
        match self {
            Self::Parsed(intent) => intent,
            Self::Fallback { intent, .. } => intent,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

pub struct IntentParser {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
}

impl IntentParser {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// One attempt against the service; failures fall back to `list`.
    pub async fn parse(&self, utterance: &str) -> ParseOutcome {
        let request = CompletionRequest::new(system_prompt(), utterance.trim())
            .with_temperature(self.temperature);

        let outcome = match self.client.complete(&request).await {
            Ok(response) => decode_intent(&response),
            Err(err) => ParseOutcome::fallback(FallbackReason::Service(err.to_string())),
        };

        match &outcome {
            ParseOutcome::Parsed(intent) => {
                debug!(command = intent.command.name(), "intent parsed");
            }
            ParseOutcome::Fallback { reason, .. } => {
                warn!(?reason, "intent parsing fell back to list");
            }
        }

        outcome
    }
}

fn system_prompt() -> String {
    let now = now_local();
    let stamp = now.format(&Rfc3339).unwrap_or_else(|_| now.date().to_string());
    format!(
        "{PARSE_SYSTEM_PROMPT}\n\nCurrent date and time: {stamp} ({})",
        now.weekday()
    )
}

/// Decodes a model reply, tolerating prose or code fences around the object.
pub fn decode_intent(response: &str) -> ParseOutcome {
    let Some(json) = extract_json(response) else {
        return ParseOutcome::fallback(FallbackReason::Malformed(
            "no JSON object in response".to_string(),
        ));
    };

    let value: serde_json::Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(err) => return ParseOutcome::fallback(FallbackReason::Malformed(err.to_string())),
    };

    match Intent::from_json(&value) {
        Some(intent) => ParseOutcome::Parsed(intent),
        None => ParseOutcome::fallback(FallbackReason::Malformed(
            "response is not a JSON object".to_string(),
        )),
    }
}

fn extract_json(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| &response[start..=end])
}
