//! HTTP API layer
//!
//! REST endpoints embedding the process core in the platform: process
//! CRUD, explicit validation, submission to the execution engine, and
//! form template management.

// Process management endpoints (CRUD + validate + submit)
pub mod processes;

// Re-export router builder
pub use processes::create_process_routes;
