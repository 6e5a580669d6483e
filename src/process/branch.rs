//! Branch resolver
//!
//! Maps a source step kind and the outgoing handle chosen at
//! connection-draw time to a branch key, and projects branch keys into
//! display labels and colors. Everything here is a pure function of its
//! inputs: re-deriving the projection from a persisted graph always
//! reproduces the visualization the author saw, which is what makes the
//! serialization round trip faithful.

use crate::process::types::{BranchKey, Connection, StepKind};
use thiserror::Error;

/// Raised when a connection is drawn from a handle the source kind does
/// not expose.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("step kind '{kind}' has no outgoing handle '{handle}'")]
pub struct UnknownHandleError {
    pub kind: &'static str,
    pub handle: String,
}

/// Resolve the branch key for a connection drawn from `handle` on a step
/// of the given kind.
///
/// Condition steps expose the "yes" and "no" handles; every other kind
/// exposes a single unnamed outflow and yields no branch key.
pub fn branch_for_handle(
    kind: StepKind,
    handle: &str,
) -> Result<Option<BranchKey>, UnknownHandleError> {
    if !kind.supports_branching() {
        return Ok(None);
    }
    match handle {
        "yes" => Ok(Some(BranchKey::Yes)),
        "no" => Ok(Some(BranchKey::No)),
        other => Err(UnknownHandleError {
            kind: kind.as_str(),
            handle: other.to_string(),
        }),
    }
}

/// Display styling for a connection, derived from its branch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: &'static str,
    pub animated: bool,
}

/// Affirming outcome color (green family).
const AFFIRM: EdgeStyle = EdgeStyle {
    stroke: "#16a34a",
    animated: true,
};

/// Negating outcome color (red family).
const NEGATE: EdgeStyle = EdgeStyle {
    stroke: "#dc2626",
    animated: true,
};

/// Default styling for single-outflow connections.
const NEUTRAL: EdgeStyle = EdgeStyle {
    stroke: "#64748b",
    animated: false,
};

impl BranchKey {
    /// The label rendered on the edge.
    pub fn label(&self) -> &'static str {
        match self {
            BranchKey::Yes => "\u{2713} Sim",
            BranchKey::No => "\u{2717} N\u{e3}o",
        }
    }

    /// The styling rendered on the edge.
    pub fn style(&self) -> EdgeStyle {
        match self {
            BranchKey::Yes => AFFIRM,
            BranchKey::No => NEGATE,
        }
    }

    /// The wire name of this branch ("yes" / "no").
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchKey::Yes => "yes",
            BranchKey::No => "no",
        }
    }
}

impl Connection {
    /// Edge label, recomputed from the branch key. `None` for plain
    /// single-outflow connections.
    pub fn label(&self) -> Option<&'static str> {
        self.branch_key.map(|b| b.label())
    }

    /// Edge styling, recomputed from the branch key.
    pub fn style(&self) -> EdgeStyle {
        self.branch_key.map(|b| b.style()).unwrap_or(NEUTRAL)
    }
}
