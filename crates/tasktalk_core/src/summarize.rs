use crate::llm::{CompletionClient, CompletionRequest, DEFAULT_TEMPERATURE};
use crate::task_store::TaskStore;
use std::sync::Arc;
use tracing::warn;

pub const NOTHING_TO_SUMMARIZE: &str = "No tasks to summarize.";
pub const SUMMARY_FAILED: &str = "Error summarizing tasks.";

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize a to-do list. Summarize the tasks concisely as bullet points, \
mentioning what is done, what is still open, and anything with a due date.";

pub struct Summarizer {
    client: Arc<dyn CompletionClient>,
    temperature: f32,
}

impl Summarizer {
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

    /// Asks the service for a bullet summary of every task in `store`.
    pub async fn summarize(&self, store: &TaskStore) -> String {
        if store.is_empty() {
            return NOTHING_TO_SUMMARIZE.to_string();
        }

        let tasks = match serde_json::to_string_pretty(store.list()) {
            Ok(tasks) => tasks,
            Err(err) => {
                warn!(error = %err, "failed to serialize tasks for summary");
                return SUMMARY_FAILED.to_string();
            }
        };
        let request = CompletionRequest::new(SUMMARY_SYSTEM_PROMPT, format!("Tasks:\n{tasks}"))
            .with_temperature(self.temperature);

        match self.client.complete(&request).await {
            Ok(summary) => summary.trim().to_string(),
            Err(err) => {
                warn!(error = %err, "summary request failed");
                SUMMARY_FAILED.to_string()
            }
        }
    }
}
