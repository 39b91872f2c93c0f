use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const TASKNAME_MAX_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub taskname: String,
    pub completed: bool,
    pub created: DateTime<Utc>,
}

impl Todo {
    /// Flips the completion flag, the only field the API ever changes.
    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }
}

/// Payload for inserting a todo. `id` is never accepted from the caller and
/// `created` is filled in by the store when left empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewTodo {
    #[serde(default)]
    pub taskname: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub completed: bool,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

impl NewTodo {
    pub fn new(taskname: impl Into<String>) -> Self {
        Self {
            taskname: taskname.into(),
            ..Default::default()
        }
    }
}

pub fn validate_taskname(taskname: &str) -> Result<(), String> {
    if taskname.is_empty() {
        return Err("taskname must not be empty".to_string());
    }
    let len = taskname.chars().count();
    if len > TASKNAME_MAX_LEN {
        return Err(format!(
            "taskname is {} characters, at most {} allowed",
            len, TASKNAME_MAX_LEN
        ));
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Text(String),
}

// Form bodies carry every value as text; a JSON null leaves the default.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Flag::Bool(value)) => Ok(value),
        Some(Flag::Text(text)) => match text.as_str() {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid value for completed: {:?}",
                other
            ))),
        },
    }
}
