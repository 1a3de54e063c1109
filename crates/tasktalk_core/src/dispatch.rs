use crate::due::display_due;
use crate::model::{Intent, IntentCommand, Task, TaskDraft};
use crate::summarize::Summarizer;
use crate::task_store::{CompleteOutcome, Selector, TaskStore};
use tracing::debug;

pub const NO_TASKS: &str = "No tasks yet.";
pub const NO_DESCRIPTION: &str = "No description provided for the new task.";
pub const NO_SELECTOR: &str = "Please specify which task to complete.";
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that command.";

/// Maps intents onto the task store, one rendered reply per intent.
pub struct Dispatcher<'a> {
    store: &'a mut TaskStore,
    summarizer: &'a Summarizer,
}

impl<'a> Dispatcher<'a> {
    pub fn new(store: &'a mut TaskStore, summarizer: &'a Summarizer) -> Self {
        Self { store, summarizer }
    }

    pub async fn dispatch(&mut self, intent: &Intent) -> String {
        debug!(command = intent.command.name(), "dispatching intent");
        match &intent.command {
            IntentCommand::Add => self.add(intent),
            IntentCommand::Complete => self.complete(intent),
            IntentCommand::List => self.list(intent.category.as_deref()),
            IntentCommand::Summary => self.summarizer.summarize(&*self.store).await,
            IntentCommand::Unknown(_) => NOT_UNDERSTOOD.to_string(),
        }
    }

    fn add(&mut self, intent: &Intent) -> String {
        let Some(description) = intent.description.as_deref() else {
            return NO_DESCRIPTION.to_string();
        };
        if description.trim().is_empty() {
            return NO_DESCRIPTION.to_string();
        }

        let draft = TaskDraft {
            description: description.to_string(),
            due_date: intent.due_date.clone(),
            category: intent.category.clone(),
        };

        let before = self.store.list().len();
        match self.store.add(draft) {
            Ok(task) => format!(
                "Added task {}: {}{}",
                task.id,
                task.description,
                due_suffix(&task)
            ),
            // A longer list means the task was appended and only the save failed.
            Err(err) => match self.store.list().get(before) {
                Some(task) => format!(
                    "Added task {} in memory but failed to save: {}",
                    task.id,
                    err.message()
                ),
                None => format!("Could not add task: {}", err.message()),
            },
        }
    }

    fn complete(&mut self, intent: &Intent) -> String {
        let fragment = intent
            .description
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty());

        let mut attempts = Vec::with_capacity(2);
        if let Some(id) = intent.id {
            attempts.push(Selector::Id(id));
        }
        if let Some(fragment) = fragment {
            attempts.push(Selector::Fragment(fragment.to_string()));
        }
        if attempts.is_empty() {
            return NO_SELECTOR.to_string();
        }

        for selector in &attempts {
            let outcome = self.store.complete(selector);
            if let Ok(outcome) = &outcome {
                debug!(?selector, found = outcome.is_found(), "complete attempt");
            }
            match outcome {
                Ok(CompleteOutcome::Completed(task)) => {
                    return format!("Marked task {} as completed: {}", task.id, task.description);
                }
                Ok(CompleteOutcome::AlreadyCompleted(task)) => {
                    return format!("Task {} was already completed: {}", task.id, task.description);
                }
                Ok(CompleteOutcome::NotFound) => continue,
                Err(err) => {
                    return format!(
                        "Marked the task as completed but failed to save: {}",
                        err.message()
                    );
                }
            }
        }

        match (intent.id, fragment) {
            (Some(id), Some(fragment)) => {
                format!("No matching task found for id {id} or \"{fragment}\".")
            }
            (Some(id), None) => format!("No matching task found for id {id}."),
            (None, Some(fragment)) => format!("No matching task found for \"{fragment}\"."),
            (None, None) => NO_SELECTOR.to_string(),
        }
    }

    fn list(&self, category: Option<&str>) -> String {
        if self.store.is_empty() {
            return NO_TASKS.to_string();
        }

        let tasks: Vec<&Task> = match category {
            Some(category) => self.store.list_by_category(category),
            None => self.store.list().iter().collect(),
        };

        if tasks.is_empty() {
            return format!("No tasks in category \"{}\".", category.unwrap_or_default());
        }

        tasks
            .into_iter()
            .map(render_task)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One list line: `1. [ ] description (Due: 2025-12-21 17:00) [category]`.
pub fn render_task(task: &Task) -> String {
    let marker = if task.completed { "[x]" } else { "[ ]" };
    let category = task
        .category
        .as_deref()
        .map(|category| format!(" [{category}]"))
        .unwrap_or_default();
    format!(
        "{}. {} {}{}{}",
        task.id,
        marker,
        task.description,
        due_suffix(task),
        category
    )
}

fn due_suffix(task: &Task) -> String {
    task.due_date
        .as_deref()
        .map(|due| format!(" (Due: {})", display_due(due)))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{
        Dispatcher, NO_DESCRIPTION, NO_SELECTOR, NO_TASKS, NOT_UNDERSTOOD, render_task,
    };
    use crate::due::display_due;
    use crate::llm::testing::ScriptedClient;
    use crate::model::{Intent, IntentCommand, TaskDraft};
    use crate::summarize::{NOTHING_TO_SUMMARIZE, Summarizer};
    use crate::task_store::TaskStore;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tasktalk-{nanos}-{file_name}"))
    }

    fn intent(command: IntentCommand) -> Intent {
        Intent::new(command)
    }

    fn add(description: &str) -> Intent {
        Intent {
            description: Some(description.to_string()),
            ..intent(IntentCommand::Add)
        }
    }

    fn complete_id(id: u64) -> Intent {
        Intent {
            id: Some(id),
            ..intent(IntentCommand::Complete)
        }
    }

    fn complete_fragment(fragment: &str) -> Intent {
        Intent {
            description: Some(fragment.to_string()),
            ..intent(IntentCommand::Complete)
        }
    }

    fn offline_summarizer() -> Summarizer {
        Summarizer::new(ScriptedClient::new(Vec::new()))
    }

    #[tokio::test]
    async fn add_then_list_renders_due_date() {
        let path = temp_path("scenario-add.json");
        let mut store = TaskStore::open(&path);
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let added = dispatcher
            .dispatch(&Intent {
                due_date: Some("2025-12-21T17:00:00Z".to_string()),
                ..add("buy groceries at 5 PM tomorrow")
            })
            .await;
        let listed = dispatcher.dispatch(&intent(IntentCommand::List)).await;
        let reloaded = TaskStore::open(&path);
        std::fs::remove_file(&path).ok();

        let due = display_due("2025-12-21T17:00:00Z");
        assert_eq!(
            added,
            format!("Added task 1: buy groceries at 5 PM tomorrow (Due: {due})")
        );
        assert_eq!(
            listed,
            format!("1. [ ] buy groceries at 5 PM tomorrow (Due: {due})")
        );
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.list()[0].id, 1);
        assert!(!reloaded.list()[0].completed);
    }

    #[tokio::test]
    async fn complete_by_fragment_then_list_shows_checked_box() {
        let mut store = TaskStore::in_memory();
        store
            .add(TaskDraft::new("buy groceries at 5 PM tomorrow"))
            .unwrap();
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher.dispatch(&complete_fragment("groceries")).await;
        let listed = dispatcher.dispatch(&intent(IntentCommand::List)).await;

        assert_eq!(
            reply,
            "Marked task 1 as completed: buy groceries at 5 PM tomorrow"
        );
        assert_eq!(listed, "1. [x] buy groceries at 5 PM tomorrow");
    }

    #[tokio::test]
    async fn add_without_description_leaves_store_untouched() {
        let mut store = TaskStore::in_memory();
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let missing = dispatcher.dispatch(&intent(IntentCommand::Add)).await;
        let blank = dispatcher.dispatch(&add("   ")).await;

        assert_eq!(missing, NO_DESCRIPTION);
        assert_eq!(blank, NO_DESCRIPTION);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn complete_prefers_id_over_fragment() {
        let mut store = TaskStore::in_memory();
        store.add(TaskDraft::new("write report")).unwrap();
        store.add(TaskDraft::new("send report")).unwrap();
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher
            .dispatch(&Intent {
                id: Some(2),
                ..complete_fragment("write")
            })
            .await;

        assert_eq!(reply, "Marked task 2 as completed: send report");
        assert!(!store.list()[0].completed);
        assert!(store.list()[1].completed);
    }

    #[tokio::test]
    async fn complete_falls_back_to_fragment_when_id_misses() {
        let mut store = TaskStore::in_memory();
        store.add(TaskDraft::new("water plants")).unwrap();
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher
            .dispatch(&Intent {
                id: Some(9),
                ..complete_fragment("plants")
            })
            .await;

        assert_eq!(reply, "Marked task 1 as completed: water plants");
    }

    #[tokio::test]
    async fn complete_reports_not_found_and_repeat_completion() {
        let mut store = TaskStore::in_memory();
        store.add(TaskDraft::new("pay bills")).unwrap();
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let missing = dispatcher.dispatch(&complete_id(5)).await;
        let missing_text = dispatcher.dispatch(&complete_fragment("laundry")).await;
        let first = dispatcher.dispatch(&complete_id(1)).await;
        let second = dispatcher.dispatch(&complete_id(1)).await;
        let unspecified = dispatcher.dispatch(&intent(IntentCommand::Complete)).await;

        assert_eq!(missing, "No matching task found for id 5.");
        assert_eq!(missing_text, "No matching task found for \"laundry\".");
        assert_eq!(first, "Marked task 1 as completed: pay bills");
        assert_eq!(second, "Task 1 was already completed: pay bills");
        assert_eq!(unspecified, NO_SELECTOR);
        assert!(store.list()[0].completed);
    }

    #[tokio::test]
    async fn list_empty_store_and_order() {
        let mut store = TaskStore::in_memory();
        let summarizer = offline_summarizer();

        {
            let mut dispatcher = Dispatcher::new(&mut store, &summarizer);
            assert_eq!(dispatcher.dispatch(&intent(IntentCommand::List)).await, NO_TASKS);
        }

        store.add(TaskDraft::new("first")).unwrap();
        store
            .add(TaskDraft::new("second").with_category("home"))
            .unwrap();
        store.add(TaskDraft::new("third")).unwrap();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);
        dispatcher.dispatch(&complete_id(2)).await;

        let listed = dispatcher.dispatch(&intent(IntentCommand::List)).await;

        assert_eq!(listed, "1. [ ] first\n2. [x] second [home]\n3. [ ] third");
    }

    #[tokio::test]
    async fn list_filters_by_category() {
        let mut store = TaskStore::in_memory();
        store
            .add(TaskDraft::new("standup").with_category("work"))
            .unwrap();
        store.add(TaskDraft::new("gym")).unwrap();
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let work = dispatcher
            .dispatch(&Intent {
                category: Some("Work".to_string()),
                ..intent(IntentCommand::List)
            })
            .await;
        let none = dispatcher
            .dispatch(&Intent {
                category: Some("garden".to_string()),
                ..intent(IntentCommand::List)
            })
            .await;

        assert_eq!(work, "1. [ ] standup [work]");
        assert_eq!(none, "No tasks in category \"garden\".");
    }

    #[tokio::test]
    async fn summary_on_empty_store_makes_no_remote_call() {
        let client = ScriptedClient::replying("- unused");
        let summarizer = Summarizer::new(client.clone());
        let mut store = TaskStore::in_memory();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher.dispatch(&intent(IntentCommand::Summary)).await;

        assert_eq!(reply, NOTHING_TO_SUMMARIZE);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn summary_forwards_model_reply() {
        let client = ScriptedClient::replying("- Call mom (open)");
        let summarizer = Summarizer::new(client.clone());
        let mut store = TaskStore::in_memory();
        store.add(TaskDraft::new("Call mom")).unwrap();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher.dispatch(&intent(IntentCommand::Summary)).await;

        assert_eq!(reply, "- Call mom (open)");
        assert_eq!(client.requests().len(), 1);
    }

    #[tokio::test]
    async fn unknown_command_is_not_understood() {
        let mut store = TaskStore::in_memory();
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher
            .dispatch(&intent(IntentCommand::Unknown("delete".to_string())))
            .await;

        assert_eq!(reply, NOT_UNDERSTOOD);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failed_flush_is_reported_but_task_kept() {
        let dir = temp_path("store-dir");
        std::fs::create_dir_all(&dir).unwrap();
        let mut store = TaskStore::open(&dir);
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher.dispatch(&add("unsaved")).await;
        std::fs::remove_dir_all(&dir).ok();

        assert!(reply.starts_with("Added task 1 in memory but failed to save"));
        assert_eq!(store.list().len(), 1);
    }

    #[tokio::test]
    async fn failed_save_on_complete_keeps_task_completed() {
        let path = temp_path("complete-unwritable.json");
        let mut store = TaskStore::open(&path);
        store.add(TaskDraft::new("file taxes")).unwrap();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir_all(&path).unwrap();
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher.dispatch(&complete_id(1)).await;
        std::fs::remove_dir_all(&path).ok();

        assert!(reply.starts_with("Marked the task as completed but failed to save"));
        assert!(store.list()[0].completed);
    }

    #[tokio::test]
    async fn exhausted_ids_reject_add_without_keeping_it() {
        let path = temp_path("exhausted.json");
        std::fs::write(
            &path,
            format!("{{\"tasks\": [{{\"id\": {}, \"description\": \"last\"}}]}}", u64::MAX),
        )
        .unwrap();
        let mut store = TaskStore::open(&path);
        let summarizer = offline_summarizer();
        let mut dispatcher = Dispatcher::new(&mut store, &summarizer);

        let reply = dispatcher.dispatch(&add("one more")).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(reply, "Could not add task: task id space exhausted");
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn render_task_without_optional_fields() {
        let mut store = TaskStore::in_memory();
        let task = store.add(TaskDraft::new("plain")).unwrap();
        assert_eq!(render_task(&task), "1. [ ] plain");
    }
}
