//! Vision Plus automation engine.
//!
//! Runs named, multi-step workflows strictly in order and keeps a record of
//! every execution attempt:
//!
//! - **Workflows**: a name plus an ordered list of opaque step descriptors
//! - **Tasks**: one per execution attempt, `running` until terminal
//! - **Reports**: immutable snapshots taken when a task finishes
//!
//! Step execution is delegated to a [`StepExecutor`]; the engine only decides
//! ordering, bookkeeping, and failure handling.

pub mod engine;
pub mod error;
pub mod ids;
pub mod step;
pub mod types;

pub use engine::AutomationEngine;
pub use error::StepError;
pub use step::{ModelStepExecutor, SimulatedStepExecutor, StepExecutor};
pub use types::{Lookup, Report, Step, Task, TaskStatus, Workflow, WorkflowStatus};
