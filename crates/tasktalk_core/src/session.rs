use crate::dispatch::Dispatcher;
use crate::llm::CompletionClient;
use crate::parser::IntentParser;
use crate::summarize::Summarizer;
use crate::task_store::TaskStore;
use std::sync::Arc;
use tracing::debug;

/// Runs one utterance at a time through parse and dispatch against an owned store.
pub struct Session {
    store: TaskStore,
    parser: IntentParser,
    summarizer: Summarizer,
}

impl Session {
    pub fn new(store: TaskStore, parser: IntentParser, summarizer: Summarizer) -> Self {
        Self {
            store,
            parser,
            summarizer,
        }
    }

    /// Parser and summarizer sharing one client at the given temperature.
    pub fn with_client(store: TaskStore, client: Arc<dyn CompletionClient>, temperature: f32) -> Self {
        Self::new(
            store,
            IntentParser::new(client.clone()).with_temperature(temperature),
            Summarizer::new(client).with_temperature(temperature),
        )
    }

    pub async fn handle(&mut self, utterance: &str) -> String {
        let outcome = self.parser.parse(utterance).await;
        debug!(
            command = outcome.intent().command.name(),
            fallback = outcome.is_fallback(),
            "utterance parsed"
        );
        let intent = outcome.into_intent();
        Dispatcher::new(&mut self.store, &self.summarizer)
            .dispatch(&intent)
            .await
    }
}
