use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub description: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub category: Option<String>,
}

/// Input of [`crate::task_store::TaskStore::add`]; the store assigns the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub description: String,
    pub due_date: Option<String>,
    pub category: Option<String>,
}

impl TaskDraft {
    pub fn new<D: Into<String>>(description: D) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_due_date<D: Into<String>>(mut self, due_date: D) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_category<C: Into<String>>(mut self, category: C) -> Self {
        self.category = Some(category.into());
        self
    }
}
