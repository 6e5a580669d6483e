//! Execution bridge
//!
//! The sole boundary between the process core and the external execution
//! engine. The bridge submits validated graphs by reference and polls
//! coarse execution status for display; it knows nothing about how any
//! step kind actually executes. Submission is hard-gated on a clean
//! validation report so the engine can never receive a graph the
//! validator has not passed.

// HTTP client implementation of the engine contract
pub mod client;

// In-memory simulation engine for tests and local development
pub mod memory;

use crate::process::registry::ProcessRegistry;
use crate::process::types::ProcessGraph;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

pub use client::HttpEngineClient;
pub use memory::InMemoryEngine;

/// Opaque handle correlating a submitted graph to its runtime progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionRef(pub String);

impl std::fmt::Display for ExecutionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse execution state reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Snapshot of one execution, as reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStatus {
    pub status: RunStatus,
    /// The step the run currently sits on, when the engine knows it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step_id: Option<String>,
}

/// Errors crossing the engine boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine request timed out")]
    Timeout,

    #[error("engine rejected the request: {0}")]
    Rejected(String),

    #[error("engine transport error: {0}")]
    Transport(String),

    #[error("unknown execution reference: {0}")]
    UnknownExecution(String),
}

/// The narrow engine contract: submit a storage record, poll a status.
///
/// Implementations must be side-effect free on the local graph model; a
/// failed or timed-out submit leaves nothing behind, so retry is always
/// safe.
#[async_trait]
pub trait ExecutionEngine: Send + Sync {
    /// Hand a process definition to the engine; returns the opaque
    /// reference the engine will report progress under.
    async fn submit(&self, graph: &ProcessGraph) -> Result<ExecutionRef, EngineError>;

    /// Read-only poll of coarse execution state.
    async fn inspect(&self, execution_ref: &ExecutionRef) -> Result<ExecutionStatus, EngineError>;
}

/// Errors raised by the bridge itself, before or while delegating to the
/// engine.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("process '{0}' is not registered")]
    UnknownProcess(String),

    #[error("process '{process_id}' has {error_count} unresolved validation errors")]
    ValidationRequired {
        process_id: String,
        error_count: usize,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Submits validated graphs and inspects executions.
pub struct ExecutionBridge {
    registry: Arc<ProcessRegistry>,
    engine: Arc<dyn ExecutionEngine>,
}

impl ExecutionBridge {
    pub fn new(registry: Arc<ProcessRegistry>, engine: Arc<dyn ExecutionEngine>) -> Self {
        Self { registry, engine }
    }

    /// Submit a registered process for execution.
    ///
    /// Fails with [`BridgeError::ValidationRequired`] while any
    /// error-severity finding is unresolved; the engine is only reached
    /// with a clean graph. Holds no local submission state, so a timed
    /// out call can simply be retried.
    pub async fn submit(&self, process_id: &str) -> Result<ExecutionRef, BridgeError> {
        let checked = self
            .registry
            .get(process_id)
            .ok_or_else(|| BridgeError::UnknownProcess(process_id.to_string()))?;

        let error_count = checked.report.errors().count();
        if error_count > 0 {
            tracing::warn!(
                "⛔ Refusing to submit process {}: {} validation errors",
                process_id,
                error_count
            );
            return Err(BridgeError::ValidationRequired {
                process_id: process_id.to_string(),
                error_count,
            });
        }

        let execution_ref = self.engine.submit(&checked.graph).await?;
        tracing::info!(
            "🚀 Submitted process {} as execution {}",
            process_id,
            execution_ref
        );
        Ok(execution_ref)
    }

    /// Poll an execution's coarse status. Never mutates the graph.
    pub async fn inspect(
        &self,
        execution_ref: &ExecutionRef,
    ) -> Result<ExecutionStatus, BridgeError> {
        Ok(self.engine.inspect(execution_ref).await?)
    }
}
