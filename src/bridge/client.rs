//! HTTP client for the external execution engine
//!
//! Implements the engine contract over REST: POST the storage record to
//! start an execution, GET the execution resource to poll status. All
//! calls carry a request timeout; a timed-out submit surfaces as
//! [`EngineError::Timeout`] with no local state left behind.

use crate::bridge::{EngineError, ExecutionEngine, ExecutionRef, ExecutionStatus};
use crate::process::types::ProcessGraph;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Response body of a successful submission.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    execution_ref: String,
}

/// reqwest-based engine client.
#[derive(Debug, Clone)]
pub struct HttpEngineClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEngineClient {
    /// Build a client against the engine's base URL with the given
    /// request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn map_error(err: reqwest::Error) -> EngineError {
        if err.is_timeout() {
            EngineError::Timeout
        } else {
            EngineError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ExecutionEngine for HttpEngineClient {
    async fn submit(&self, graph: &ProcessGraph) -> Result<ExecutionRef, EngineError> {
        let url = format!("{}/executions", self.base_url);
        tracing::debug!("Submitting process {} to {}", graph.id, url);

        let response = self
            .client
            .post(&url)
            .json(graph)
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Rejected(format!("{}: {}", status, body)));
        }

        let submitted: SubmitResponse = response.json().await.map_err(Self::map_error)?;
        Ok(ExecutionRef(submitted.execution_ref))
    }

    async fn inspect(&self, execution_ref: &ExecutionRef) -> Result<ExecutionStatus, EngineError> {
        let url = format!("{}/executions/{}", self.base_url, execution_ref);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(EngineError::UnknownExecution(execution_ref.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Rejected(format!("{}: {}", status, body)));
        }

        response.json().await.map_err(Self::map_error)
    }
}
