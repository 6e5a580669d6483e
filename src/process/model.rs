//! Graph model
//!
//! The authoritative in-memory process graph for one editing session,
//! mutated exclusively through the primitives here. Every mutation either
//! fully applies or leaves the graph untouched — failed calls never leak
//! partial step or connection state to readers. Shape validation of step
//! configs is deliberately deferred to the validator; this layer only
//! enforces the structural invariants that must hold mid-edit (one start
//! step, no dangling endpoints, branch exclusivity).

use crate::process::catalog;
use crate::process::types::{
    BranchKey, Connection, Position, ProcessGraph, StepConfig, StepKind,
};
use thiserror::Error;
use uuid::Uuid;

/// Authoring errors. All recoverable: the author corrects the action and
/// retries; the graph is unchanged after any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("the process already has a start step")]
    StartAlreadyPresent,

    #[error("step '{0}' is the start step and cannot be removed")]
    ProtectedStep(String),

    #[error("step '{0}' does not exist in this process")]
    UnknownStep(String),

    #[error("connection '{0}' does not exist in this process")]
    UnknownConnection(String),

    #[error("step '{step_id}' already has an outgoing '{branch}' connection")]
    DuplicateBranch { step_id: String, branch: &'static str },

    #[error("step kind '{kind}' does not support branch keys")]
    BranchNotSupported { kind: &'static str },

    #[error("step '{step_id}' is of kind '{expected}', got a '{got}' config")]
    ConfigKindMismatch {
        step_id: String,
        expected: &'static str,
        got: &'static str,
    },
}

/// The editable graph plus transient editor-only state.
///
/// The selection lives here, not on [`ProcessGraph`], so persisting a
/// graph structurally strips everything that is not part of the data
/// model.
#[derive(Debug, Clone)]
pub struct GraphModel {
    graph: ProcessGraph,
    selected_step: Option<String>,
}

impl GraphModel {
    /// Create an empty process with the given name and an auto-inserted
    /// start step, the state an author sees when opening the editor for a
    /// new process.
    pub fn new(name: impl Into<String>) -> Self {
        let start = catalog::instantiate(StepKind::Start, Position::new(80.0, 80.0));
        Self {
            graph: ProcessGraph {
                id: Uuid::new_v4().to_string(),
                name: name.into(),
                steps: vec![start],
                connections: Vec::new(),
            },
            selected_step: None,
        }
    }

    /// Hydrate a persisted definition for editing.
    pub fn from_graph(graph: ProcessGraph) -> Self {
        Self {
            graph,
            selected_step: None,
        }
    }

    /// Read-only view of the current graph.
    pub fn graph(&self) -> &ProcessGraph {
        &self.graph
    }

    /// Consume the model, yielding the graph for persistence. Transient
    /// editor state does not survive this.
    pub fn into_graph(self) -> ProcessGraph {
        self.graph
    }

    /// Rename the process.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.graph.name = name.into();
    }

    /// Add a fresh step of the given kind and return its id.
    ///
    /// Adding a second start step is rejected so the single-start
    /// invariant holds across any edit sequence.
    pub fn add_step(&mut self, kind: StepKind, position: Position) -> Result<String, ModelError> {
        if kind == StepKind::Start && self.graph.start_step().is_some() {
            return Err(ModelError::StartAlreadyPresent);
        }
        let step = catalog::instantiate(kind, position);
        let step_id = step.id.clone();
        self.graph.steps.push(step);
        Ok(step_id)
    }

    /// Remove a step, cascading removal of every connection that
    /// references it. The start step is protected.
    pub fn remove_step(&mut self, step_id: &str) -> Result<(), ModelError> {
        let step = self
            .graph
            .step(step_id)
            .ok_or_else(|| ModelError::UnknownStep(step_id.to_string()))?;
        if step.kind() == StepKind::Start {
            return Err(ModelError::ProtectedStep(step_id.to_string()));
        }

        self.graph.steps.retain(|s| s.id != step_id);
        self.graph
            .connections
            .retain(|c| c.source_step_id != step_id && c.target_step_id != step_id);
        if self.selected_step.as_deref() == Some(step_id) {
            self.selected_step = None;
        }
        Ok(())
    }

    /// Move a step to a new layout position. Presentational only.
    pub fn move_step(&mut self, step_id: &str, position: Position) -> Result<(), ModelError> {
        let step = self
            .graph
            .step_mut(step_id)
            .ok_or_else(|| ModelError::UnknownStep(step_id.to_string()))?;
        step.position = position;
        Ok(())
    }

    /// Change a step's label.
    pub fn set_step_label(
        &mut self,
        step_id: &str,
        label: impl Into<String>,
    ) -> Result<(), ModelError> {
        let step = self
            .graph
            .step_mut(step_id)
            .ok_or_else(|| ModelError::UnknownStep(step_id.to_string()))?;
        step.label = label.into();
        Ok(())
    }

    /// Replace a step's config with an updated payload of the same kind.
    ///
    /// The kind is immutable: a config of a different variant is rejected
    /// before anything is touched. Completeness of the new payload is not
    /// checked here — authors save half-filled configs all the time, and
    /// the validator reports the gaps at submission.
    pub fn update_step_config(
        &mut self,
        step_id: &str,
        config: StepConfig,
    ) -> Result<(), ModelError> {
        let step = self
            .graph
            .step_mut(step_id)
            .ok_or_else(|| ModelError::UnknownStep(step_id.to_string()))?;
        if step.kind() != config.kind() {
            return Err(ModelError::ConfigKindMismatch {
                step_id: step_id.to_string(),
                expected: step.kind().as_str(),
                got: config.kind().as_str(),
            });
        }
        step.config = config;
        Ok(())
    }

    /// Connect two steps and return the new connection id.
    ///
    /// Branch keys are only accepted from branching source kinds, and at
    /// most one outgoing connection may exist per branch key — the
    /// exclusivity that makes execution deterministic.
    pub fn add_connection(
        &mut self,
        source_step_id: &str,
        target_step_id: &str,
        branch_key: Option<BranchKey>,
    ) -> Result<String, ModelError> {
        let source = self
            .graph
            .step(source_step_id)
            .ok_or_else(|| ModelError::UnknownStep(source_step_id.to_string()))?;
        if self.graph.step(target_step_id).is_none() {
            return Err(ModelError::UnknownStep(target_step_id.to_string()));
        }

        let source_kind = source.kind();
        if let Some(branch) = branch_key {
            if !source_kind.supports_branching() {
                return Err(ModelError::BranchNotSupported {
                    kind: source_kind.as_str(),
                });
            }
            let taken = self
                .graph
                .outgoing(source_step_id)
                .any(|c| c.branch_key == Some(branch));
            if taken {
                return Err(ModelError::DuplicateBranch {
                    step_id: source_step_id.to_string(),
                    branch: branch.as_str(),
                });
            }
        }

        let connection = Connection {
            id: Uuid::new_v4().to_string(),
            source_step_id: source_step_id.to_string(),
            target_step_id: target_step_id.to_string(),
            branch_key,
        };
        let connection_id = connection.id.clone();
        self.graph.connections.push(connection);
        Ok(connection_id)
    }

    /// Remove a connection.
    pub fn remove_connection(&mut self, connection_id: &str) -> Result<(), ModelError> {
        if self.graph.connection(connection_id).is_none() {
            return Err(ModelError::UnknownConnection(connection_id.to_string()));
        }
        self.graph.connections.retain(|c| c.id != connection_id);
        Ok(())
    }

    /// Mark a step as selected in the editor. Transient, never persisted.
    pub fn select_step(&mut self, step_id: &str) -> Result<(), ModelError> {
        if self.graph.step(step_id).is_none() {
            return Err(ModelError::UnknownStep(step_id.to_string()));
        }
        self.selected_step = Some(step_id.to_string());
        Ok(())
    }

    /// Clear the editor selection.
    pub fn clear_selection(&mut self) {
        self.selected_step = None;
    }

    /// The currently selected step, if any.
    pub fn selected_step(&self) -> Option<&str> {
        self.selected_step.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::types::{ConditionConfig, FormConfig};

    fn pos() -> Position {
        Position::new(0.0, 0.0)
    }

    #[test]
    fn new_model_has_exactly_one_start_step() {
        let model = GraphModel::new("Accreditation");
        let starts: Vec<_> = model
            .graph()
            .steps
            .iter()
            .filter(|s| s.kind() == StepKind::Start)
            .collect();
        assert_eq!(starts.len(), 1);
    }

    #[test]
    fn second_start_step_is_rejected() {
        let mut model = GraphModel::new("p");
        let err = model.add_step(StepKind::Start, pos()).unwrap_err();
        assert_eq!(err, ModelError::StartAlreadyPresent);
        assert_eq!(model.graph().steps.len(), 1);
    }

    #[test]
    fn start_step_cannot_be_removed() {
        let mut model = GraphModel::new("p");
        let start_id = model.graph().start_step().unwrap().id.clone();
        let err = model.remove_step(&start_id).unwrap_err();
        assert_eq!(err, ModelError::ProtectedStep(start_id));
    }

    #[test]
    fn removing_a_step_cascades_its_connections() {
        let mut model = GraphModel::new("p");
        let start_id = model.graph().start_step().unwrap().id.clone();
        let form = model.add_step(StepKind::Form, pos()).unwrap();
        let end = model.add_step(StepKind::Terminal, pos()).unwrap();

        model.add_connection(&start_id, &form, None).unwrap();
        model.add_connection(&form, &end, None).unwrap();
        assert_eq!(model.graph().connections.len(), 2);

        model.remove_step(&form).unwrap();

        assert!(model.graph().step(&form).is_none());
        assert!(
            model.graph().connections.is_empty(),
            "no orphaned connection may remain observable"
        );
    }

    #[test]
    fn duplicate_branch_key_is_rejected_and_graph_unchanged() {
        let mut model = GraphModel::new("p");
        let cond = model.add_step(StepKind::Condition, pos()).unwrap();
        let yes_end = model.add_step(StepKind::Terminal, pos()).unwrap();
        let other_end = model.add_step(StepKind::Terminal, pos()).unwrap();

        model
            .add_connection(&cond, &yes_end, Some(BranchKey::Yes))
            .unwrap();
        let before = model.graph().clone();

        let err = model
            .add_connection(&cond, &other_end, Some(BranchKey::Yes))
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateBranch {
                step_id: cond.clone(),
                branch: "yes",
            }
        );
        assert_eq!(model.graph(), &before);

        // The other branch is still free.
        model
            .add_connection(&cond, &other_end, Some(BranchKey::No))
            .unwrap();
    }

    #[test]
    fn branch_key_on_single_outflow_kind_is_rejected() {
        let mut model = GraphModel::new("p");
        let form = model.add_step(StepKind::Form, pos()).unwrap();
        let end = model.add_step(StepKind::Terminal, pos()).unwrap();

        let err = model
            .add_connection(&form, &end, Some(BranchKey::Yes))
            .unwrap_err();
        assert_eq!(err, ModelError::BranchNotSupported { kind: "form" });
    }

    #[test]
    fn connection_to_unknown_step_is_rejected() {
        let mut model = GraphModel::new("p");
        let start_id = model.graph().start_step().unwrap().id.clone();
        let err = model.add_connection(&start_id, "ghost", None).unwrap_err();
        assert_eq!(err, ModelError::UnknownStep("ghost".to_string()));
        assert!(model.graph().connections.is_empty());
    }

    #[test]
    fn config_update_keeps_the_kind_immutable() {
        let mut model = GraphModel::new("p");
        let form = model.add_step(StepKind::Form, pos()).unwrap();

        let err = model
            .update_step_config(&form, StepConfig::Condition(ConditionConfig::default()))
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::ConfigKindMismatch {
                step_id: form.clone(),
                expected: "form",
                got: "condition",
            }
        );

        model
            .update_step_config(
                &form,
                StepConfig::Form(FormConfig {
                    template_id: Some("tpl-1".to_string()),
                    fields: vec![],
                }),
            )
            .unwrap();
    }

    #[test]
    fn selection_is_transient_editor_state() {
        let mut model = GraphModel::new("p");
        let start_id = model.graph().start_step().unwrap().id.clone();
        model.select_step(&start_id).unwrap();
        assert_eq!(model.selected_step(), Some(start_id.as_str()));

        // Persisting goes through the graph, which has no selection.
        let json = serde_json::to_value(model.graph()).unwrap();
        assert!(json.get("selectedStep").is_none());
        assert!(json.get("selected_step").is_none());
    }

    #[test]
    fn removing_selected_step_clears_selection() {
        let mut model = GraphModel::new("p");
        let form = model.add_step(StepKind::Form, pos()).unwrap();
        model.select_step(&form).unwrap();
        model.remove_step(&form).unwrap();
        assert_eq!(model.selected_step(), None);
    }
}
