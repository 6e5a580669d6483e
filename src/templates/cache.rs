//! Ephemeral in-memory template cache
//!
//! Stopgap repository for sessions that cannot reach the durable store.
//! Contents do not survive a restart; anything kept here is expected to
//! be promoted to the durable store eventually.

use crate::templates::{FormTemplate, TemplateRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory template repository.
#[derive(Debug, Default)]
pub struct MemoryTemplateCache {
    templates: RwLock<HashMap<String, FormTemplate>>,
}

impl MemoryTemplateCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for MemoryTemplateCache {
    async fn get(&self, id: &str) -> Result<Option<FormTemplate>> {
        Ok(self.templates.read().await.get(id).cloned())
    }

    async fn put(&self, template: &FormTemplate) -> Result<()> {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<FormTemplate>> {
        let mut templates: Vec<FormTemplate> =
            self.templates.read().await.values().cloned().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }
}
