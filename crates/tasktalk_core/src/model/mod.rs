mod intent;
mod task;

pub use intent::{Intent, IntentCommand};
pub use task::{Task, TaskDraft};
