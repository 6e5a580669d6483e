//! In-memory simulation engine
//!
//! A self-contained [`ExecutionEngine`] used by tests and local
//! development. It never executes step semantics; it only walks the
//! submitted graph's connections when told to, so branching behavior can
//! be observed through `inspect` without a real engine deployment.

use crate::bridge::{EngineError, ExecutionEngine, ExecutionRef, ExecutionStatus, RunStatus};
use crate::process::types::{BranchKey, ProcessGraph, StepKind};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct SimulatedRun {
    graph: ProcessGraph,
    status: RunStatus,
    current_step_id: Option<String>,
}

/// Engine double holding every submitted run in memory.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    runs: Mutex<HashMap<String, SimulatedRun>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs this engine has accepted.
    pub fn submission_count(&self) -> usize {
        self.runs.lock().unwrap().len()
    }

    /// Advance a run one step along its graph.
    ///
    /// Follows the outgoing connection of the current step whose branch
    /// key matches `branch`; plain steps pass `None`. Arriving on a
    /// terminal step completes the run; having nowhere to go fails it,
    /// mirroring how a stalled execution would surface.
    pub fn advance(
        &self,
        execution_ref: &ExecutionRef,
        branch: Option<BranchKey>,
    ) -> Result<ExecutionStatus, EngineError> {
        let mut runs = self.runs.lock().unwrap();
        let run = runs
            .get_mut(&execution_ref.0)
            .ok_or_else(|| EngineError::UnknownExecution(execution_ref.to_string()))?;

        let Some(current_id) = run.current_step_id.clone() else {
            return Err(EngineError::Rejected("run has no current step".to_string()));
        };

        let next = run
            .graph
            .outgoing(&current_id)
            .find(|c| c.branch_key == branch)
            .map(|c| c.target_step_id.clone());

        match next {
            Some(next_id) => {
                let arrived_terminal = run
                    .graph
                    .step(&next_id)
                    .map(|s| s.kind() == StepKind::Terminal)
                    .unwrap_or(false);
                run.status = if arrived_terminal {
                    RunStatus::Completed
                } else {
                    RunStatus::Running
                };
                run.current_step_id = Some(next_id);
            }
            None => {
                run.status = RunStatus::Failed;
            }
        }

        Ok(ExecutionStatus {
            status: run.status,
            current_step_id: run.current_step_id.clone(),
        })
    }
}

#[async_trait]
impl ExecutionEngine for InMemoryEngine {
    async fn submit(&self, graph: &ProcessGraph) -> Result<ExecutionRef, EngineError> {
        let execution_ref = ExecutionRef(Uuid::new_v4().to_string());
        let current_step_id = graph.start_step().map(|s| s.id.clone());

        self.runs.lock().unwrap().insert(
            execution_ref.0.clone(),
            SimulatedRun {
                graph: graph.clone(),
                status: RunStatus::Pending,
                current_step_id,
            },
        );

        Ok(execution_ref)
    }

    async fn inspect(&self, execution_ref: &ExecutionRef) -> Result<ExecutionStatus, EngineError> {
        let runs = self.runs.lock().unwrap();
        let run = runs
            .get(&execution_ref.0)
            .ok_or_else(|| EngineError::UnknownExecution(execution_ref.to_string()))?;

        Ok(ExecutionStatus {
            status: run.status,
            current_step_id: run.current_step_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::model::GraphModel;
    use crate::process::types::Position;

    #[tokio::test]
    async fn advance_follows_branch_keys() {
        let mut model = GraphModel::new("Branching");
        let start_id = model.graph().start_step().unwrap().id.clone();
        let cond = model
            .add_step(StepKind::Condition, Position::new(0.0, 0.0))
            .unwrap();
        let yes_end = model
            .add_step(StepKind::Terminal, Position::new(0.0, 0.0))
            .unwrap();
        let no_end = model
            .add_step(StepKind::Terminal, Position::new(0.0, 0.0))
            .unwrap();
        model.add_connection(&start_id, &cond, None).unwrap();
        model
            .add_connection(&cond, &yes_end, Some(BranchKey::Yes))
            .unwrap();
        model
            .add_connection(&cond, &no_end, Some(BranchKey::No))
            .unwrap();

        let engine = InMemoryEngine::new();
        let execution_ref = engine.submit(model.graph()).await.unwrap();

        // start -> condition -> yes terminal
        engine.advance(&execution_ref, None).unwrap();
        let status = engine
            .advance(&execution_ref, Some(BranchKey::Yes))
            .unwrap();

        assert_eq!(status.status, RunStatus::Completed);
        assert_eq!(status.current_step_id.as_deref(), Some(yes_end.as_str()));
    }

    #[tokio::test]
    async fn advancing_into_nowhere_fails_the_run() {
        let mut model = GraphModel::new("Stalls");
        let start_id = model.graph().start_step().unwrap().id.clone();
        let form = model
            .add_step(StepKind::Form, Position::new(0.0, 0.0))
            .unwrap();
        model.add_connection(&start_id, &form, None).unwrap();

        let engine = InMemoryEngine::new();
        let execution_ref = engine.submit(model.graph()).await.unwrap();

        engine.advance(&execution_ref, None).unwrap();
        let status = engine.advance(&execution_ref, None).unwrap();
        assert_eq!(status.status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn unknown_reference_is_rejected() {
        let engine = InMemoryEngine::new();
        let err = engine
            .inspect(&ExecutionRef("nope".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownExecution(_)));
    }
}
