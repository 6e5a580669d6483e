//! Step type catalog
//!
//! The closed registry of step kinds: display metadata, default
//! configuration shapes for instantiation, and the required-field
//! predicate the validator consumes. The catalog is compile-time state —
//! a fieldless enum plus `'static` descriptor tables — so it is read-only
//! process-wide and exhaustively enumerable, with no runtime registration.

use crate::process::types::{
    ApprovalConfig, ConditionConfig, DatabaseOpConfig, EmailConfig, FormConfig, FunctionConfig,
    HttpCallConfig, LoopConfig, Position, SignatureConfig, StartConfig, Step, StepConfig,
    StepKind, TerminalConfig, WebhookConfig,
};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Raised when a kind string from outside the closed set reaches the
/// catalog (typically a client sending a bad `kind` to the API).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown step kind: '{0}'")]
pub struct UnknownKindError(pub String);

/// Coarse grouping of step kinds, used by the editor palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KindCategory {
    /// Start, terminal and loop steps
    Control,
    /// Steps that gather data or human decisions
    Collection,
    /// Branching steps
    Decision,
    /// Steps that reach external systems
    Integration,
    /// Outbound notifications
    Notification,
}

/// Static description of a step kind.
#[derive(Debug, Clone, Copy)]
pub struct KindDescriptor {
    pub display_name: &'static str,
    pub category: KindCategory,
    /// Config fields the validator requires to be present and non-empty
    pub required_config_fields: &'static [&'static str],
}

impl StepKind {
    /// Every kind in the catalog, in palette order.
    pub const ALL: [StepKind; 12] = [
        StepKind::Start,
        StepKind::Terminal,
        StepKind::Form,
        StepKind::Approval,
        StepKind::Condition,
        StepKind::Signature,
        StepKind::HttpCall,
        StepKind::Webhook,
        StepKind::DatabaseOp,
        StepKind::Function,
        StepKind::Loop,
        StepKind::Email,
    ];

    /// The wire name of this kind ("http-call", "database-op", ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Start => "start",
            StepKind::Terminal => "terminal",
            StepKind::Form => "form",
            StepKind::Approval => "approval",
            StepKind::Condition => "condition",
            StepKind::Signature => "signature",
            StepKind::HttpCall => "http-call",
            StepKind::Webhook => "webhook",
            StepKind::DatabaseOp => "database-op",
            StepKind::Function => "function",
            StepKind::Loop => "loop",
            StepKind::Email => "email",
        }
    }

    /// Static metadata for this kind.
    pub fn describe(&self) -> KindDescriptor {
        match self {
            StepKind::Start => KindDescriptor {
                display_name: "Start",
                category: KindCategory::Control,
                required_config_fields: &[],
            },
            StepKind::Terminal => KindDescriptor {
                display_name: "End",
                category: KindCategory::Control,
                required_config_fields: &[],
            },
            StepKind::Form => KindDescriptor {
                display_name: "Form",
                category: KindCategory::Collection,
                required_config_fields: &["templateId|fields"],
            },
            StepKind::Approval => KindDescriptor {
                display_name: "Approval",
                category: KindCategory::Collection,
                required_config_fields: &["reviewers"],
            },
            StepKind::Condition => KindDescriptor {
                display_name: "Condition",
                category: KindCategory::Decision,
                required_config_fields: &["question"],
            },
            StepKind::Signature => KindDescriptor {
                display_name: "Signature",
                category: KindCategory::Collection,
                required_config_fields: &["signers"],
            },
            StepKind::HttpCall => KindDescriptor {
                display_name: "HTTP Call",
                category: KindCategory::Integration,
                required_config_fields: &["url", "method"],
            },
            StepKind::Webhook => KindDescriptor {
                display_name: "Webhook",
                category: KindCategory::Integration,
                required_config_fields: &["url"],
            },
            StepKind::DatabaseOp => KindDescriptor {
                display_name: "Database",
                category: KindCategory::Integration,
                required_config_fields: &["table", "operation"],
            },
            StepKind::Function => KindDescriptor {
                display_name: "Function",
                category: KindCategory::Integration,
                required_config_fields: &["script"],
            },
            StepKind::Loop => KindDescriptor {
                display_name: "Loop",
                category: KindCategory::Control,
                required_config_fields: &["maxIterations"],
            },
            StepKind::Email => KindDescriptor {
                display_name: "E-mail",
                category: KindCategory::Notification,
                required_config_fields: &["to", "subject"],
            },
        }
    }

    /// Whether outgoing connections from this kind carry branch keys.
    pub fn supports_branching(&self) -> bool {
        matches!(self, StepKind::Condition)
    }

    /// The empty/default config shape a fresh step of this kind starts
    /// with. Required fields are deliberately left blank; completeness is
    /// the validator's job, not instantiation's.
    pub fn default_config(&self) -> StepConfig {
        match self {
            StepKind::Start => StepConfig::Start(StartConfig::default()),
            StepKind::Terminal => StepConfig::Terminal(TerminalConfig::default()),
            StepKind::Form => StepConfig::Form(FormConfig::default()),
            StepKind::Approval => StepConfig::Approval(ApprovalConfig::default()),
            StepKind::Condition => StepConfig::Condition(ConditionConfig::default()),
            StepKind::Signature => StepConfig::Signature(SignatureConfig::default()),
            StepKind::HttpCall => StepConfig::HttpCall(HttpCallConfig::default()),
            StepKind::Webhook => StepConfig::Webhook(WebhookConfig::default()),
            StepKind::DatabaseOp => StepConfig::DatabaseOp(DatabaseOpConfig::default()),
            StepKind::Function => StepConfig::Function(FunctionConfig::default()),
            StepKind::Loop => StepConfig::Loop(LoopConfig::default()),
            StepKind::Email => StepConfig::Email(EmailConfig::default()),
        }
    }
}

impl FromStr for StepKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepKind::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKindError(s.to_string()))
    }
}

/// Build a fresh step of the given kind at the given position.
///
/// The id is a new uuid, the config is the kind's default shape and the
/// label starts as the display name. Never touches existing state.
pub fn instantiate(kind: StepKind, position: Position) -> Step {
    Step {
        id: Uuid::new_v4().to_string(),
        label: kind.describe().display_name.to_string(),
        config: kind.default_config(),
        position,
    }
}

/// The required-field predicate: which of a step's required config fields
/// are currently missing or empty.
///
/// Field names follow the wire form so validation messages match what the
/// author sees in the editor. An empty result means the config is complete.
pub fn missing_required_fields(config: &StepConfig) -> Vec<&'static str> {
    let mut missing = Vec::new();
    match config {
        // Trigger completeness is a dedicated validator check, not a
        // required field: a start step with no trigger is merely manual.
        StepConfig::Start(_) => {}
        StepConfig::Terminal(_) => {}
        StepConfig::Form(c) => {
            let has_template = c.template_id.as_deref().is_some_and(|t| !t.is_empty());
            if !has_template && c.fields.is_empty() {
                missing.push("templateId|fields");
            }
        }
        StepConfig::Approval(c) => {
            if c.reviewers.is_empty() {
                missing.push("reviewers");
            }
        }
        StepConfig::Condition(c) => {
            if c.question.trim().is_empty() {
                missing.push("question");
            }
        }
        StepConfig::Signature(c) => {
            if c.signers.is_empty() {
                missing.push("signers");
            }
        }
        StepConfig::HttpCall(c) => {
            if c.url.trim().is_empty() {
                missing.push("url");
            }
            if c.method.trim().is_empty() {
                missing.push("method");
            }
        }
        StepConfig::Webhook(c) => {
            if c.url.trim().is_empty() {
                missing.push("url");
            }
        }
        StepConfig::DatabaseOp(c) => {
            if c.table.trim().is_empty() {
                missing.push("table");
            }
            if c.operation.is_none() {
                missing.push("operation");
            }
        }
        StepConfig::Function(c) => {
            if c.script.trim().is_empty() {
                missing.push("script");
            }
        }
        StepConfig::Loop(c) => {
            if c.max_iterations.is_none() {
                missing.push("maxIterations");
            }
        }
        StepConfig::Email(c) => {
            if c.to.is_empty() {
                missing.push("to");
            }
            if c.subject.trim().is_empty() {
                missing.push("subject");
            }
        }
    }
    missing
}
