//! Durable SQLite-backed template store

use crate::templates::{FormTemplate, TemplateRepository};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

/// Template store over the platform database. Templates are stored as
/// JSON rows, the same pattern the process storage uses.
#[derive(Debug, Clone)]
pub struct SqliteTemplateStore {
    pool: SqlitePool,
}

impl SqliteTemplateStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the template schema. Safe to call multiple times.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS form_templates (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                definition JSON NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TemplateRepository for SqliteTemplateStore {
    async fn get(&self, id: &str) -> Result<Option<FormTemplate>> {
        let row = sqlx::query("SELECT definition FROM form_templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let definition: String = row.get("definition");
                Ok(Some(serde_json::from_str(&definition)?))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, template: &FormTemplate) -> Result<()> {
        let definition = serde_json::to_string(template)?;
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO form_templates (id, name, definition, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                definition = excluded.definition,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&template.id)
        .bind(&template.name)
        .bind(&definition)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<FormTemplate>> {
        let rows = sqlx::query("SELECT definition FROM form_templates ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        let mut templates = Vec::new();
        for row in rows {
            let definition: String = row.get("definition");
            templates.push(serde_json::from_str(&definition)?);
        }

        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::types::FormField;

    #[tokio::test]
    async fn put_get_list_round_trip() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        let store = SqliteTemplateStore::new(pool);
        store.init_schema().await.unwrap();

        let template = FormTemplate {
            id: "tpl-basic-data".to_string(),
            name: "Basic applicant data".to_string(),
            fields: vec![FormField {
                key: "fullName".to_string(),
                label: "Full name".to_string(),
                required: true,
            }],
        };

        store.put(&template).await.unwrap();
        assert_eq!(store.get("tpl-basic-data").await.unwrap(), Some(template));
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert_eq!(store.get("missing").await.unwrap(), None);
    }
}
