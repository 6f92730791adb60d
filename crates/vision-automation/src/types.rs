//! Workflow, task and report records.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// One opaque unit of work within a workflow.
///
/// The engine only reads `name`; every other key belongs to the
/// [`StepExecutor`](crate::StepExecutor).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Step(pub serde_json::Map<String, Value>);

impl Step {
    /// Step with only a `name` key.
    pub fn named(name: &str) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("name".to_string(), Value::String(name.to_string()));
        Self(fields)
    }

    /// Add or replace a key.
    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    /// The step's `name`, if it has a string one.
    pub fn name(&self) -> Option<&str> {
        self.0.get("name").and_then(Value::as_str)
    }

    /// Raw access to a key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Workflow lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Created,
    Running,
    Completed,
    Failed,
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Whether the task has finished.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A named, ordered list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub steps: Vec<Step>,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
}

/// One execution attempt of a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub workflow_id: String,
    pub status: TaskStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Task {
    pub(crate) fn running(id: String, workflow_id: String) -> Self {
        Self {
            id,
            workflow_id,
            status: TaskStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}

/// Immutable snapshot of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub task_id: String,
    pub workflow_id: String,
    pub status: TaskStatus,
    pub generated_at: DateTime<Utc>,
    pub details: Task,
}

/// Result of a store lookup. `NotFound` serializes as `{"status":"not_found"}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NotFound,
        }
    }
}

impl<T: Serialize> Serialize for Lookup<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Found(value) => value.serialize(serializer),
            Self::NotFound => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("status", "not_found")?;
                map.end()
            }
        }
    }
}
