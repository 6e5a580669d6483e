//! SQLite persistence for process definitions
//!
//! Process graphs are stored as a JSON `definition` column — the same
//! structural record the execution engine consumes — alongside indexed
//! lookup fields. Serialization is purely structural: step and connection
//! ids survive verbatim, and transient editor state never reaches this
//! layer because it lives on `GraphModel`, not on `ProcessGraph`.

use crate::process::types::ProcessGraph;
use anyhow::Result;
use sqlx::{sqlite::SqlitePool, Row};
use std::collections::HashMap;

/// Serialize a graph to the storage record consumed by the execution
/// engine. Round-trip law: `from_json(to_json(g)) == g` for any graph
/// built through model operations.
pub fn to_json(graph: &ProcessGraph) -> Result<String> {
    Ok(serde_json::to_string(graph)?)
}

/// Deserialize a storage record back into a graph.
pub fn from_json(definition: &str) -> Result<ProcessGraph> {
    Ok(serde_json::from_str(definition)?)
}

/// SQLite-backed process storage.
#[derive(Debug, Clone)]
pub struct ProcessStorage {
    pool: SqlitePool,
}

impl ProcessStorage {
    /// Create a new storage instance over an existing connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the process storage schema.
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS processes (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                definition JSON NOT NULL,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_processes_name
            ON processes(name)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Store a new process or update an existing one.
    ///
    /// Uses UPSERT so create and update are one atomic operation; the
    /// backing store's last-write-wins is the cross-session conflict
    /// policy.
    pub async fn save_process(&self, graph: &ProcessGraph) -> Result<()> {
        let definition = to_json(graph)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO processes (id, name, definition, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                definition = excluded.definition,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&graph.id)
        .bind(&graph.name)
        .bind(&definition)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieve a process by id.
    pub async fn get_process(&self, id: &str) -> Result<Option<ProcessGraph>> {
        let row = sqlx::query("SELECT definition FROM processes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let definition: String = row.get("definition");
                Ok(Some(from_json(&definition)?))
            }
            None => Ok(None),
        }
    }

    /// List all processes with basic metadata, newest first.
    pub async fn list_processes(&self) -> Result<Vec<ProcessMetadata>> {
        let rows = sqlx::query(
            "SELECT id, name, created_at, updated_at FROM processes ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut processes = Vec::new();
        for row in rows {
            processes.push(ProcessMetadata {
                id: row.get("id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            });
        }

        Ok(processes)
    }

    /// Load every stored process, keyed by id. Used by the registry at
    /// startup.
    pub async fn load_all(&self) -> Result<HashMap<String, ProcessGraph>> {
        let rows = sqlx::query("SELECT id, definition FROM processes")
            .fetch_all(&self.pool)
            .await?;

        let mut processes = HashMap::new();
        for row in rows {
            let id: String = row.get("id");
            let definition: String = row.get("definition");
            processes.insert(id, from_json(&definition)?);
        }

        Ok(processes)
    }

    /// Delete a process by id. Returns whether anything was removed.
    pub async fn delete_process(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM processes WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Basic process metadata for listing operations.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetadata {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::model::GraphModel;
    use crate::process::types::{BranchKey, Position, StepKind};

    fn branching_graph() -> ProcessGraph {
        let mut model = GraphModel::new("Accreditation triage");
        let start_id = model.graph().start_step().unwrap().id.clone();
        let cond = model
            .add_step(StepKind::Condition, Position::new(200.0, 80.0))
            .unwrap();
        let yes = model
            .add_step(StepKind::Terminal, Position::new(360.0, 20.0))
            .unwrap();
        let no = model
            .add_step(StepKind::Terminal, Position::new(360.0, 140.0))
            .unwrap();
        model.add_connection(&start_id, &cond, None).unwrap();
        model
            .add_connection(&cond, &yes, Some(BranchKey::Yes))
            .unwrap();
        model
            .add_connection(&cond, &no, Some(BranchKey::No))
            .unwrap();
        model.into_graph()
    }

    #[test]
    fn round_trip_preserves_structure() {
        let graph = branching_graph();
        let reloaded = from_json(&to_json(&graph).unwrap()).unwrap();
        assert_eq!(reloaded, graph);
    }

    #[tokio::test]
    async fn save_and_reload_through_sqlite() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let storage = ProcessStorage::new(pool);
        storage.init_schema().await.unwrap();

        let graph = branching_graph();
        storage.save_process(&graph).await.unwrap();

        let reloaded = storage.get_process(&graph.id).await.unwrap().unwrap();
        assert_eq!(reloaded, graph);

        let listed = storage.list_processes().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Accreditation triage");
    }

    #[tokio::test]
    async fn upsert_replaces_the_definition() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let storage = ProcessStorage::new(pool);
        storage.init_schema().await.unwrap();

        let mut graph = branching_graph();
        storage.save_process(&graph).await.unwrap();

        graph.name = "Renamed".to_string();
        storage.save_process(&graph).await.unwrap();

        let reloaded = storage.get_process(&graph.id).await.unwrap().unwrap();
        assert_eq!(reloaded.name, "Renamed");
        assert_eq!(storage.list_processes().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_existed() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let storage = ProcessStorage::new(pool);
        storage.init_schema().await.unwrap();

        let graph = branching_graph();
        storage.save_process(&graph).await.unwrap();

        assert!(storage.delete_process(&graph.id).await.unwrap());
        assert!(!storage.delete_process(&graph.id).await.unwrap());
    }
}
