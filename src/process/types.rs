//! Core process-graph type definitions
//!
//! Defines the fundamental structures for credentialing process graphs:
//! steps, connections, branch keys and the per-kind configuration payloads.
//! These types are serialized to/from JSON for persistence and for hand-off
//! to the execution engine, so their serde shape is the storage contract.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A complete process definition: steps plus the connections between them.
///
/// Graphs are stored as JSON and submitted to the execution engine in the
/// same shape. Step and connection ids must survive every round trip
/// verbatim because the engine correlates runtime progress against them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessGraph {
    /// Stable process identifier (e.g., "proc-accreditation-renewal")
    pub id: String,
    /// Author-assigned process name, non-empty at submission
    pub name: String,
    /// Steps keyed by their `id` field; insertion order is preserved
    pub steps: Vec<Step>,
    /// Directed connections between steps
    pub connections: Vec<Connection>,
}

impl ProcessGraph {
    /// Look up a step by id.
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Look up a step by id, mutably.
    pub fn step_mut(&mut self, step_id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == step_id)
    }

    /// Look up a connection by id.
    pub fn connection(&self, connection_id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == connection_id)
    }

    /// The designated start step, if the graph has one.
    ///
    /// A well-formed graph has exactly one; the validator reports zero or
    /// several as errors rather than this method guessing.
    pub fn start_step(&self) -> Option<&Step> {
        self.steps.iter().find(|s| s.kind() == StepKind::Start)
    }

    /// All terminal steps in insertion order.
    pub fn terminal_steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(|s| s.kind() == StepKind::Terminal)
    }

    /// Connections leaving the given step.
    pub fn outgoing<'a>(
        &'a self,
        step_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.source_step_id == step_id)
    }
}

/// A single typed step in a process graph.
///
/// The step kind is determined by the config variant and is therefore
/// immutable once the step exists; changing kind means deleting the step
/// and creating a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Opaque unique identifier, stable across edits
    pub id: String,
    /// Human-readable short name, non-empty at submission
    pub label: String,
    /// Kind tag plus kind-specific payload, serialized as adjacent
    /// `kind` / `config` keys
    #[serde(flatten)]
    pub config: StepConfig,
    /// Free-form layout coordinates, presentational only
    pub position: Position,
}

impl Step {
    /// The step's kind, derived from its config variant.
    pub fn kind(&self) -> StepKind {
        self.config.kind()
    }
}

/// 2D layout coordinates. Never affect semantics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The closed set of step kinds understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    /// Entry point of the process; exactly one per graph
    Start,
    /// Completion marker; no outgoing connection required
    Terminal,
    /// Collects applicant data through a form or a reusable template
    Form,
    /// Approval gate routed to a set of eligible reviewers
    Approval,
    /// Boolean decision with labelled yes/no outcomes
    Condition,
    /// Electronic signature request for a set of signers
    Signature,
    /// Outbound HTTP call to an external system
    HttpCall,
    /// Outbound webhook notification
    Webhook,
    /// Mutation against a managed database table
    DatabaseOp,
    /// Stored script evaluated by the execution engine
    Function,
    /// Bounded repetition over the steps it encloses
    Loop,
    /// Outbound e-mail notification
    Email,
}

/// Kind-specific configuration payload.
///
/// One variant per step kind so the validator and any renderer can match
/// exhaustively; adding a kind is a compile-checked, single-point change
/// here and in the catalog. Serialized with the kind as an adjacent tag:
/// `{ "kind": "form", "config": { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "config", rename_all = "kebab-case")]
pub enum StepConfig {
    Start(StartConfig),
    Terminal(TerminalConfig),
    Form(FormConfig),
    Approval(ApprovalConfig),
    Condition(ConditionConfig),
    Signature(SignatureConfig),
    HttpCall(HttpCallConfig),
    Webhook(WebhookConfig),
    DatabaseOp(DatabaseOpConfig),
    Function(FunctionConfig),
    Loop(LoopConfig),
    Email(EmailConfig),
}

impl StepConfig {
    /// The kind tag for this payload.
    pub fn kind(&self) -> StepKind {
        match self {
            StepConfig::Start(_) => StepKind::Start,
            StepConfig::Terminal(_) => StepKind::Terminal,
            StepConfig::Form(_) => StepKind::Form,
            StepConfig::Approval(_) => StepKind::Approval,
            StepConfig::Condition(_) => StepKind::Condition,
            StepConfig::Signature(_) => StepKind::Signature,
            StepConfig::HttpCall(_) => StepKind::HttpCall,
            StepConfig::Webhook(_) => StepKind::Webhook,
            StepConfig::DatabaseOp(_) => StepKind::DatabaseOp,
            StepConfig::Function(_) => StepKind::Function,
            StepConfig::Loop(_) => StepKind::Loop,
            StepConfig::Email(_) => StepKind::Email,
        }
    }
}

/// Start step configuration.
///
/// A start step without a trigger can only be invoked manually; the
/// validator surfaces that as a warning, not an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<TriggerConfig>,
}

/// How a process run is started.
///
/// Expected shapes:
/// - `{ "type": "storage-event", "table": "applications", "event": "insert" }`
/// - `{ "type": "webhook", "url": "/hooks/renewal" }`
/// - `{ "type": "schedule", "expression": "0 0 6 * * *" }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TriggerConfig {
    /// Fires when a row event happens on a managed table
    StorageEvent {
        #[serde(default)]
        table: String,
        #[serde(default)]
        event: String,
    },
    /// Fires when the named endpoint is called
    Webhook {
        #[serde(default)]
        url: String,
    },
    /// Fires on a cron-style schedule
    Schedule {
        #[serde(default)]
        expression: String,
    },
}

/// Terminal step configuration. The optional outcome is a free-form
/// completion label ("approved", "rejected", "withdrawn").
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
}

/// Form step configuration.
///
/// Either references a reusable template by opaque id or carries its own
/// field definitions; one of the two must be present at submission.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

/// A single field definition inside a form step or a form template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    /// Machine key the collected value is stored under
    pub key: String,
    /// Label shown to the applicant
    pub label: String,
    #[serde(default)]
    pub required: bool,
}

/// Approval step configuration. Reviewer ids are opaque identity
/// references; permission checks belong to the authorization subsystem.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalConfig {
    #[serde(default)]
    pub reviewers: Vec<String>,
}

/// Condition step configuration: the boolean question being evaluated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    #[serde(default)]
    pub question: String,
}

/// Signature step configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureConfig {
    #[serde(default)]
    pub signers: Vec<String>,
    /// Signature provider hint, resolved by the execution engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// HTTP call step configuration.
///
/// Expected config: `{ "url": "https://api.example.com/sync", "method": "POST" }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpCallConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub method: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// Webhook step configuration: target URL only, method is the engine's
/// concern.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    #[serde(default)]
    pub url: String,
}

/// Database mutation step configuration.
///
/// Expected config: `{ "table": "accreditations", "operation": "update" }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseOpConfig {
    #[serde(default)]
    pub table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<DbOperation>,
}

/// The mutation a database-op step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbOperation {
    Insert,
    Update,
    Delete,
}

/// Function step configuration. The script is stored verbatim and
/// evaluated by the execution engine, never here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    #[serde(default)]
    pub script: String,
}

/// Loop step configuration. `max_iterations` keeps authored loops
/// bounded; the engine may stop earlier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoopConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<u32>,
}

/// E-mail step configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailConfig {
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_template: Option<String>,
}

/// Named outcome of a decision step. Only condition steps carry branch
/// keys on their outgoing connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchKey {
    Yes,
    No,
}

/// A directed connection between two steps.
///
/// Display label and color are not stored: they are pure projections of
/// `branch_key`, recomputed on read (see the branch resolver), so the
/// visual state can never diverge from the semantic state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub source_step_id: String,
    pub target_step_id: String,
    /// Present only when the source step kind supports named outcomes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_key: Option<BranchKey>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_serializes_with_adjacent_kind_and_config() {
        let step = Step {
            id: "s1".to_string(),
            label: "Background check".to_string(),
            config: StepConfig::Condition(ConditionConfig {
                question: "Documents complete?".to_string(),
            }),
            position: Position::new(120.0, 40.0),
        };

        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["kind"], "condition");
        assert_eq!(json["config"]["question"], "Documents complete?");
        assert_eq!(json["position"]["x"], 120.0);
    }

    #[test]
    fn connection_serializes_camel_case_engine_contract() {
        let conn = Connection {
            id: "c1".to_string(),
            source_step_id: "s1".to_string(),
            target_step_id: "s2".to_string(),
            branch_key: Some(BranchKey::Yes),
        };

        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json["sourceStepId"], "s1");
        assert_eq!(json["targetStepId"], "s2");
        assert_eq!(json["branchKey"], "yes");
    }

    #[test]
    fn branch_key_is_omitted_when_absent() {
        let conn = Connection {
            id: "c1".to_string(),
            source_step_id: "s1".to_string(),
            target_step_id: "s2".to_string(),
            branch_key: None,
        };

        let json = serde_json::to_value(&conn).unwrap();
        assert!(json.get("branchKey").is_none());
    }

    #[test]
    fn trigger_config_deserializes_by_type_tag() {
        let trigger: TriggerConfig = serde_json::from_str(
            r#"{ "type": "storage-event", "table": "applications", "event": "insert" }"#,
        )
        .unwrap();

        match trigger {
            TriggerConfig::StorageEvent { table, event } => {
                assert_eq!(table, "applications");
                assert_eq!(event, "insert");
            }
            other => panic!("unexpected trigger: {:?}", other),
        }
    }

    #[test]
    fn kind_is_derived_from_config_variant() {
        let config = StepConfig::DatabaseOp(DatabaseOpConfig {
            table: "accreditations".to_string(),
            operation: Some(DbOperation::Update),
        });
        assert_eq!(config.kind(), StepKind::DatabaseOp);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["kind"], "database-op");
        assert_eq!(json["config"]["operation"], "update");
    }
}
