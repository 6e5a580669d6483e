//! Form template repository
//!
//! Form steps may reference a reusable template by opaque id instead of
//! carrying their own field list. The process core only checks that a
//! reference is present; resolving it goes through this repository
//! interface, with a durable SQLite-backed store for the platform and an
//! ephemeral in-memory cache as the local stopgap. The core depends only
//! on the trait, never on a concrete store.

// Durable SQLite-backed store
pub mod store;

// Ephemeral in-memory cache
pub mod cache;

use crate::process::types::FormField;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use cache::MemoryTemplateCache;
pub use store::SqliteTemplateStore;

/// A reusable form definition managed outside any single process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTemplate {
    /// Opaque template identifier referenced by form steps
    pub id: String,
    pub name: String,
    pub fields: Vec<FormField>,
}

/// Storage-agnostic template access.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Fetch a template by id, `None` when it does not exist.
    async fn get(&self, id: &str) -> Result<Option<FormTemplate>>;

    /// Store or replace a template.
    async fn put(&self, template: &FormTemplate) -> Result<()>;

    /// List every stored template.
    async fn list(&self) -> Result<Vec<FormTemplate>>;
}
