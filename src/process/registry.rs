//! Checked-process registry
//!
//! Lock-free, atomic in-memory registry pairing each stored process with
//! its latest validation outcome. Reads never block: each update swaps
//! the whole map pointer, so the API and the execution bridge always see
//! a consistent snapshot while reloads happen concurrently. The bridge
//! consults this registry to enforce the validation gate before any
//! submission leaves the process.

use crate::process::storage::ProcessStorage;
use crate::process::types::ProcessGraph;
use crate::process::validator::{self, ValidationReport};
use anyhow::Result;
use arc_swap::ArcSwap;
use std::{collections::HashMap, sync::Arc};

/// A process definition paired with the findings of its most recent
/// validation pass.
#[derive(Debug, Clone)]
pub struct CheckedProcess {
    pub graph: ProcessGraph,
    pub report: ValidationReport,
}

impl CheckedProcess {
    /// Whether this process may be submitted for execution.
    pub fn is_submittable(&self) -> bool {
        self.report.is_clean()
    }
}

/// Lock-free registry of checked processes.
#[derive(Debug)]
pub struct ProcessRegistry {
    /// Atomic pointer to the process map; key is the process id
    processes: ArcSwap<HashMap<String, CheckedProcess>>,

    /// Persistent storage backing reload operations
    storage: ProcessStorage,
}

impl ProcessRegistry {
    /// Create a new registry over the given storage backend.
    pub fn new(storage: ProcessStorage) -> Self {
        Self {
            processes: ArcSwap::new(Arc::new(HashMap::new())),
            storage,
        }
    }

    /// Populate the registry from storage, validating each definition.
    ///
    /// Called once during startup. A stored graph that trips a
    /// [`validator::GraphFault`] is a core defect; it is logged and left
    /// out of the registry rather than aborting startup.
    pub async fn init_from_storage(&self) -> Result<()> {
        let stored = self.storage.load_all().await?;
        let mut checked = HashMap::new();

        for (id, graph) in stored {
            match validator::validate(&graph) {
                Ok(report) => {
                    checked.insert(id, CheckedProcess { graph, report });
                }
                Err(fault) => {
                    tracing::error!("❌ Internal fault validating process {}: {}", id, fault);
                }
            }
        }

        self.processes.store(Arc::new(checked));

        tracing::info!(
            "Initialized process registry with {} processes",
            self.processes.load().len()
        );

        Ok(())
    }

    /// Reload a single process from storage, re-validate it, and swap it
    /// into the registry atomically. Lock-free for concurrent readers.
    pub async fn reload(&self, process_id: &str) -> Result<()> {
        let graph = self
            .storage
            .get_process(process_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Process not found: {}", process_id))?;

        let report = validator::validate(&graph)
            .map_err(|fault| anyhow::anyhow!("internal fault in process {}: {}", process_id, fault))?;

        let current = self.processes.load();
        let mut updated = (**current).clone();
        updated.insert(process_id.to_string(), CheckedProcess { graph, report });
        self.processes.store(Arc::new(updated));

        tracing::info!("🔄 Reloaded process into registry: {}", process_id);

        Ok(())
    }

    /// Get a checked process by id (lock-free read).
    pub fn get(&self, process_id: &str) -> Option<CheckedProcess> {
        self.processes.load().get(process_id).cloned()
    }

    /// List all registered process ids.
    pub fn list_ids(&self) -> Vec<String> {
        self.processes.load().keys().cloned().collect()
    }

    /// Remove a process from the registry.
    pub fn remove(&self, process_id: &str) {
        let current = self.processes.load();
        if current.contains_key(process_id) {
            let mut updated = (**current).clone();
            updated.remove(process_id);
            self.processes.store(Arc::new(updated));
            tracing::info!("Removed process from registry: {}", process_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::model::GraphModel;
    use crate::process::types::{Position, StepKind};
    use sqlx::sqlite::SqlitePool;

    async fn registry_with_storage() -> (ProcessRegistry, ProcessStorage) {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let storage = ProcessStorage::new(pool);
        storage.init_schema().await.unwrap();
        (ProcessRegistry::new(storage.clone()), storage)
    }

    fn clean_graph() -> crate::process::types::ProcessGraph {
        let mut model = GraphModel::new("Clean");
        let start_id = model.graph().start_step().unwrap().id.clone();
        let end = model
            .add_step(StepKind::Terminal, Position::new(0.0, 0.0))
            .unwrap();
        model.add_connection(&start_id, &end, None).unwrap();
        model.into_graph()
    }

    #[tokio::test]
    async fn reload_pairs_graph_with_validation_outcome() {
        let (registry, storage) = registry_with_storage().await;

        let graph = clean_graph();
        storage.save_process(&graph).await.unwrap();
        registry.reload(&graph.id).await.unwrap();

        let checked = registry.get(&graph.id).unwrap();
        assert!(checked.is_submittable());
        assert_eq!(checked.graph, graph);
    }

    #[tokio::test]
    async fn init_from_storage_loads_everything() {
        let (registry, storage) = registry_with_storage().await;

        let a = clean_graph();
        let b = GraphModel::new("Incomplete").into_graph();
        storage.save_process(&a).await.unwrap();
        storage.save_process(&b).await.unwrap();

        registry.init_from_storage().await.unwrap();

        assert_eq!(registry.list_ids().len(), 2);
        assert!(registry.get(&a.id).unwrap().is_submittable());
        // No terminal step yet, so the incomplete graph must not be
        // submittable.
        assert!(!registry.get(&b.id).unwrap().is_submittable());
    }

    #[tokio::test]
    async fn remove_is_observable_immediately() {
        let (registry, storage) = registry_with_storage().await;
        let graph = clean_graph();
        storage.save_process(&graph).await.unwrap();
        registry.reload(&graph.id).await.unwrap();

        registry.remove(&graph.id);
        assert!(registry.get(&graph.id).is_none());
    }
}
