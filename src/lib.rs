//! Credflow: process-graph core for a credentialing platform
//!
//! This library provides the authoring model, validation gate and
//! execution hand-off for credentialing process graphs: typed steps,
//! branch-labelled connections, a lock-free registry of checked
//! processes, and the narrow bridge to the external execution engine.

// Core configuration and setup
pub mod config;

// Process-graph layer - types, catalog, model, validator, persistence
pub mod process;

// Execution bridge - the sole boundary to the external engine
pub mod bridge;

// Form template repository - durable store plus ephemeral cache
pub mod templates;

// HTTP API layer - REST endpoints for process management
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use bridge::{ExecutionBridge, ExecutionEngine, ExecutionRef, ExecutionStatus, RunStatus};
pub use process::{
    BranchKey, Connection, GraphModel, Position, ProcessGraph, ProcessRegistry, Step, StepConfig,
    StepKind, ValidationReport,
};
pub use server::start_server;
pub use templates::{FormTemplate, TemplateRepository};
