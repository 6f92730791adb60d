//! Workflow execution engine.
//!
//! Coordinates workflow execution by:
//! - Storing workflows as submitted
//! - Running their steps one at a time under a fresh task
//! - Recording a report once the task reaches a terminal status

use chrono::Utc;
use indexmap::IndexMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::error::StepError;
use crate::ids::IdGenerator;
use crate::step::StepExecutor;
use crate::types::{Lookup, Report, Step, Task, TaskStatus, Workflow, WorkflowStatus};

/// Workflow engine with in-memory workflow, task and report stores.
///
/// Each store sits behind its own lock. When a task finishes, the task update
/// and its report are written while holding both locks (tasks first, then
/// reports), so a status read never observes a terminal task without its
/// report.
pub struct AutomationEngine {
    workflows: RwLock<IndexMap<String, Workflow>>,
    tasks: RwLock<IndexMap<String, Task>>,
    reports: RwLock<IndexMap<String, Report>>,
    executor: Arc<dyn StepExecutor>,
    workflow_ids: IdGenerator,
    task_ids: IdGenerator,
    report_ids: IdGenerator,
}

impl AutomationEngine {
    /// Create an engine that runs steps through `executor`.
    pub fn new(executor: Arc<dyn StepExecutor>) -> Self {
        Self {
            workflows: RwLock::new(IndexMap::new()),
            tasks: RwLock::new(IndexMap::new()),
            reports: RwLock::new(IndexMap::new()),
            executor,
            workflow_ids: IdGenerator::new("workflow"),
            task_ids: IdGenerator::new("task"),
            report_ids: IdGenerator::new("report"),
        }
    }

    /// Store a new workflow with status `created` and return its id.
    pub async fn create_workflow(&self, name: &str, steps: Vec<Step>) -> String {
        let id = self.workflow_ids.next_id();
        let workflow = Workflow {
            id: id.clone(),
            name: name.to_string(),
            steps,
            status: WorkflowStatus::Created,
            created_at: Utc::now(),
        };

        self.workflows.write().await.insert(id.clone(), workflow);
        info!(workflow_id = %id, name = %name, "Created workflow");

        id
    }

    /// Execute a workflow's steps in order under a new task.
    ///
    /// Returns `false` without creating a task if the workflow is unknown.
    /// Otherwise the first failing step stops the run; either way the task is
    /// finalized and reported before returning.
    pub async fn execute_workflow(&self, workflow_id: &str) -> bool {
        let workflow = match self.workflows.read().await.get(workflow_id) {
            Some(workflow) => workflow.clone(),
            None => {
                error!(workflow_id = %workflow_id, "Workflow not found");
                return false;
            }
        };

        let task_id = self.task_ids.next_id();
        self.tasks.write().await.insert(
            task_id.clone(),
            Task::running(task_id.clone(), workflow_id.to_string()),
        );

        info!(
            workflow_id = %workflow_id,
            task_id = %task_id,
            steps = workflow.steps.len(),
            "Workflow execution started"
        );

        let outcome = self.run_steps(&workflow, &task_id).await;
        let succeeded = outcome.is_ok();

        if let Err(ref e) = outcome {
            error!(
                workflow_id = %workflow_id,
                task_id = %task_id,
                error = %e,
                "Workflow execution failed"
            );
        }

        if let Some(report_id) = self.finalize_task(&task_id, outcome).await {
            info!(
                workflow_id = %workflow_id,
                task_id = %task_id,
                report_id = %report_id,
                succeeded,
                "Workflow execution finished"
            );
        }

        succeeded
    }

    /// Run steps sequentially, stopping at the first failure.
    async fn run_steps(&self, workflow: &Workflow, task_id: &str) -> Result<(), StepError> {
        for (index, step) in workflow.steps.iter().enumerate() {
            debug!(
                task_id = %task_id,
                index,
                step = step.name().unwrap_or("<unnamed>"),
                "Running step"
            );
            self.executor.execute(step, task_id).await?;
        }
        Ok(())
    }

    /// Apply the terminal status and record the report in one step.
    async fn finalize_task(&self, task_id: &str, outcome: Result<(), StepError>) -> Option<String> {
        let mut tasks = self.tasks.write().await;
        let mut reports = self.reports.write().await;

        let task = tasks.get_mut(task_id)?;
        match outcome {
            Ok(()) => {
                task.status = TaskStatus::Completed;
                task.completed_at = Some(Utc::now());
            }
            Err(e) => {
                task.status = TaskStatus::Failed;
                task.error = Some(e.to_string());
            }
        }

        let report = self.snapshot(task);
        let report_id = report.id.clone();
        reports.insert(report_id.clone(), report);

        Some(report_id)
    }

    fn snapshot(&self, task: &Task) -> Report {
        Report {
            id: self.report_ids.next_id(),
            task_id: task.id.clone(),
            workflow_id: task.workflow_id.clone(),
            status: task.status,
            generated_at: Utc::now(),
            details: task.clone(),
        }
    }

    /// Snapshot a task's current state into a new report.
    ///
    /// Returns `None` if the task is unknown.
    pub async fn generate_report(&self, task_id: &str) -> Option<String> {
        let tasks = self.tasks.read().await;
        let Some(task) = tasks.get(task_id) else {
            error!(task_id = %task_id, "Task not found for report");
            return None;
        };

        let report = self.snapshot(task);
        let report_id = report.id.clone();
        self.reports.write().await.insert(report_id.clone(), report);

        debug!(task_id = %task_id, report_id = %report_id, "Report generated");
        Some(report_id)
    }

    pub async fn get_workflow_status(&self, workflow_id: &str) -> Lookup<Workflow> {
        self.workflows.read().await.get(workflow_id).cloned().into()
    }

    pub async fn get_task_status(&self, task_id: &str) -> Lookup<Task> {
        self.tasks.read().await.get(task_id).cloned().into()
    }

    pub async fn get_report(&self, report_id: &str) -> Lookup<Report> {
        self.reports.read().await.get(report_id).cloned().into()
    }

    /// Workflow ids in creation order.
    pub async fn list_workflows(&self) -> Vec<String> {
        self.workflows.read().await.keys().cloned().collect()
    }

    /// Task ids in creation order, including finished tasks.
    pub async fn list_active_tasks(&self) -> Vec<String> {
        self.tasks.read().await.keys().cloned().collect()
    }

    /// Report ids in creation order.
    pub async fn list_reports(&self) -> Vec<String> {
        self.reports.read().await.keys().cloned().collect()
    }
}

impl std::fmt::Debug for AutomationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutomationEngine").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every step it sees and fails at a chosen position.
    #[derive(Default)]
    struct RecordingExecutor {
        calls: Mutex<Vec<String>>,
        fail_at: Option<usize>,
    }

    impl RecordingExecutor {
        fn failing_at(index: usize) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_at: Some(index),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StepExecutor for RecordingExecutor {
        async fn execute(&self, step: &Step, _task_id: &str) -> Result<(), StepError> {
            let name = step.name().unwrap_or_default().to_string();
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(name.clone());
                calls.len() - 1
            };

            if self.fail_at == Some(index) {
                return Err(StepError::Failed(format!("{} broke", name)));
            }
            Ok(())
        }
    }

    fn steps(n: usize) -> Vec<Step> {
        (0..n).map(|i| Step::named(&format!("s{}", i + 1))).collect()
    }

    fn engine(executor: Arc<RecordingExecutor>) -> AutomationEngine {
        AutomationEngine::new(executor)
    }

    #[tokio::test]
    async fn test_scan_scenario() {
        let executor = Arc::new(RecordingExecutor::default());
        let engine = engine(executor.clone());

        let id = engine
            .create_workflow("scan", vec![Step::named("a"), Step::named("b")])
            .await;
        assert!(IdGenerator::new("workflow").matches(&id));

        assert!(engine.execute_workflow(&id).await);
        assert_eq!(executor.calls(), vec!["a", "b"]);

        let workflow = engine.get_workflow_status(&id).await.into_option().unwrap();
        assert_eq!(workflow.status, WorkflowStatus::Created);

        let tasks = engine.list_active_tasks().await;
        assert_eq!(tasks.len(), 1);
        let reports = engine.list_reports().await;
        assert_eq!(reports.len(), 1);

        let task = engine.get_task_status(&tasks[0]).await.into_option().unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.workflow_id, id);
        assert!(task.completed_at.is_some());
        assert!(task.error.is_none());

        let report = engine.get_report(&reports[0]).await.into_option().unwrap();
        assert_eq!(report.task_id, task.id);
        assert_eq!(report.workflow_id, id);
        assert_eq!(report.status, TaskStatus::Completed);
        assert_eq!(report.details, task);
    }

    #[tokio::test]
    async fn test_first_failing_step_stops_execution() {
        for n in 1..=5 {
            for k in 0..n {
                let executor = Arc::new(RecordingExecutor::failing_at(k));
                let engine = engine(executor.clone());
                let id = engine.create_workflow("partial", steps(n)).await;

                assert!(!engine.execute_workflow(&id).await);

                let expected: Vec<String> = (0..=k).map(|i| format!("s{}", i + 1)).collect();
                assert_eq!(executor.calls(), expected, "n={} k={}", n, k);

                let task_id = engine.list_active_tasks().await.remove(0);
                let task = engine.get_task_status(&task_id).await.into_option().unwrap();
                assert_eq!(task.status, TaskStatus::Failed);
                assert_eq!(task.error, Some(format!("Step failed: s{} broke", k + 1)));
                assert!(task.completed_at.is_none());
            }
        }
    }

    #[tokio::test]
    async fn test_all_steps_run_in_order() {
        for n in 0..=5 {
            let executor = Arc::new(RecordingExecutor::default());
            let engine = engine(executor.clone());
            let id = engine.create_workflow("full", steps(n)).await;

            assert!(engine.execute_workflow(&id).await);

            let expected: Vec<String> = (0..n).map(|i| format!("s{}", i + 1)).collect();
            assert_eq!(executor.calls(), expected);
        }
    }

    #[tokio::test]
    async fn test_failed_execution_still_reports() {
        let executor = Arc::new(RecordingExecutor::failing_at(0));
        let engine = engine(executor);
        let id = engine.create_workflow("broken", steps(2)).await;

        assert!(!engine.execute_workflow(&id).await);

        let reports = engine.list_reports().await;
        assert_eq!(reports.len(), 1);
        let report = engine.get_report(&reports[0]).await.into_option().unwrap();
        assert_eq!(report.status, TaskStatus::Failed);
        assert_eq!(report.details.error.as_deref(), Some("Step failed: s1 broke"));
    }

    #[tokio::test]
    async fn test_unknown_workflow_creates_no_task() {
        let engine = engine(Arc::new(RecordingExecutor::default()));

        assert!(!engine.execute_workflow("workflow_missing").await);
        assert!(engine.list_active_tasks().await.is_empty());
        assert!(engine.list_reports().await.is_empty());
    }

    #[tokio::test]
    async fn test_reexecution_creates_independent_tasks() {
        let executor = Arc::new(RecordingExecutor::default());
        let engine = engine(executor.clone());
        let id = engine.create_workflow("twice", steps(1)).await;

        assert!(engine.execute_workflow(&id).await);
        assert!(engine.execute_workflow(&id).await);

        let tasks = engine.list_active_tasks().await;
        assert_eq!(tasks.len(), 2);
        assert_ne!(tasks[0], tasks[1]);
        assert_eq!(engine.list_reports().await.len(), 2);
        assert_eq!(executor.calls(), vec!["s1", "s1"]);
    }

    #[tokio::test]
    async fn test_generate_report_snapshots_current_status() {
        let engine = engine(Arc::new(RecordingExecutor::default()));
        let id = engine.create_workflow("snap", steps(1)).await;
        engine.execute_workflow(&id).await;

        let task_id = engine.list_active_tasks().await.remove(0);
        let report_id = engine.generate_report(&task_id).await.unwrap();

        let report = engine.get_report(&report_id).await.into_option().unwrap();
        let task = engine.get_task_status(&task_id).await.into_option().unwrap();
        assert_eq!(report.status, task.status);
        assert_eq!(report.details, task);
        assert_eq!(engine.list_reports().await.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_report_unknown_task() {
        let engine = engine(Arc::new(RecordingExecutor::default()));
        assert!(engine.generate_report("task_missing").await.is_none());
    }

    #[tokio::test]
    async fn test_lookups_return_not_found() {
        let engine = engine(Arc::new(RecordingExecutor::default()));

        assert_eq!(engine.get_workflow_status("nope").await, Lookup::NotFound);
        assert_eq!(engine.get_task_status("nope").await, Lookup::NotFound);
        assert_eq!(engine.get_report("nope").await, Lookup::NotFound);
    }

    #[tokio::test]
    async fn test_workflows_listed_in_creation_order() {
        let engine = engine(Arc::new(RecordingExecutor::default()));
        let first = engine.create_workflow("one", vec![]).await;
        let second = engine.create_workflow("two", vec![]).await;

        assert_eq!(engine.list_workflows().await, vec![first, second]);
    }
}
