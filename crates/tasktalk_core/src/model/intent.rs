use serde_json::{Map, Value};

/// What the user's utterance asked for, after the model has interpreted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub command: IntentCommand,
    pub description: Option<String>,
    pub due_date: Option<String>,
    pub id: Option<u64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentCommand {
    Add,
    List,
    Complete,
    Summary,
    /// Anything else the model produced, kept verbatim for logging.
    Unknown(String),
}

impl IntentCommand {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "add" => Self::Add,
            "list" => Self::List,
            "complete" => Self::Complete,
            "summary" => Self::Summary,
            _ => Self::Unknown(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Add => "add",
            Self::List => "list",
            Self::Complete => "complete",
            Self::Summary => "summary",
            Self::Unknown(name) => name,
        }
    }
}

impl Intent {
    pub fn new(command: IntentCommand) -> Self {
        Self {
            command,
            description: None,
            due_date: None,
            id: None,
            category: None,
        }
    }

    /// The intent substituted whenever the model's answer cannot be used.
    pub fn list() -> Self {
        Self::new(IntentCommand::List)
    }

    /// Builds an intent from a decoded JSON object.
    ///
    /// Fields of the wrong type are treated as absent rather than rejected.
    /// Returns `None` when the value is not an object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let command = match object.get("command").and_then(Value::as_str) {
            Some(name) => IntentCommand::from_name(name),
            None => IntentCommand::Unknown(String::new()),
        };

        Some(Self {
            command,
            description: text_field(object, &["description"]),
            due_date: text_field(object, &["dueDate", "due_date"]),
            id: id_field(object),
            category: text_field(object, &["category"]),
        })
    }
}

fn text_field(object: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn id_field(object: &Map<String, Value>) -> Option<u64> {
    let id = match object.get("id")? {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().trim_start_matches('#').parse().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
}
