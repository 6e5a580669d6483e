//! Graph validator
//!
//! The correctness gate between authoring and execution. Takes a full
//! process graph and produces an ordered list of findings — errors block
//! submission, warnings do not. Malformed graphs are the expected input
//! here and are reported as data, never as exceptions, so the editor can
//! show the author every problem at once. The only hard failure is a
//! [`GraphFault`]: a connection referencing a step that does not exist,
//! which the graph model makes impossible and therefore indicates a bug
//! in the core rather than an authoring mistake.

use crate::process::catalog;
use crate::process::types::{ProcessGraph, Step, StepKind, TriggerConfig};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Severity of a finding. Submission is gated on errors only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Machine-readable finding categories, stable across message wording
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingCode {
    EmptyGraph,
    MissingStart,
    MultipleStart,
    ManualTriggerOnly,
    MissingTriggerField,
    InvalidSchedule,
    MissingTerminal,
    OrphanStep,
    DeadEndStep,
    NoPathToTerminal,
    MissingConfigField,
    UnlabeledStep,
    UnnamedProcess,
}

/// A single validation result, referencing the offending step or
/// connection when applicable.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub severity: Severity,
    pub code: FindingCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
}

impl Finding {
    fn error(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            step_id: None,
            connection_id: None,
        }
    }

    fn warning(code: FindingCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            step_id: None,
            connection_id: None,
        }
    }

    fn for_step(mut self, step_id: &str) -> Self {
        self.step_id = Some(step_id.to_string());
        self
    }
}

/// The ordered outcome of one validation pass.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    /// Whether the graph is eligible for submission.
    pub fn is_clean(&self) -> bool {
        !self.has_errors()
    }

    /// Whether any error-severity finding exists.
    pub fn has_errors(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity == Severity::Error)
    }

    /// Error-severity findings only.
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
    }

    /// Warning-severity findings only.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
    }
}

/// Model-invariant violations surfaced during validation. These are
/// defects in the core, not authoring mistakes, and are surfaced
/// distinctly so they are never confused with fixable findings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphFault {
    #[error("connection '{connection_id}' references missing step '{step_id}'")]
    DanglingConnection {
        connection_id: String,
        step_id: String,
    },
}

/// Validate a full process graph.
///
/// Check order follows the editor's reporting order; it has no bearing on
/// correctness. An empty graph short-circuits to the single "non-empty
/// graph" finding so authors of a blank canvas are not buried in
/// follow-on noise.
pub fn validate(graph: &ProcessGraph) -> Result<ValidationReport, GraphFault> {
    let mut report = ValidationReport::default();

    // 1. Non-empty graph.
    if graph.steps.is_empty() {
        report.findings.push(Finding::error(
            FindingCode::EmptyGraph,
            "the process has no steps",
        ));
        return Ok(report);
    }

    // Resolve connection endpoints up front; a dangling endpoint is a
    // graph-model bug, not a finding.
    let index = GraphIndex::build(graph)?;

    // 2. Exactly one start step.
    let starts: Vec<&Step> = graph
        .steps
        .iter()
        .filter(|s| s.kind() == StepKind::Start)
        .collect();
    match starts.len() {
        0 => report.findings.push(Finding::error(
            FindingCode::MissingStart,
            "the process has no start step",
        )),
        1 => {}
        n => report.findings.push(Finding::error(
            FindingCode::MultipleStart,
            format!("the process has {} start steps; exactly one is allowed", n),
        )),
    }

    // 3. Start trigger completeness.
    for &start in &starts {
        check_trigger(start, &mut report);
    }

    // 4. At least one terminal step.
    let has_terminal = graph.terminal_steps().next().is_some();
    if !has_terminal {
        report.findings.push(Finding::error(
            FindingCode::MissingTerminal,
            "the process has no end step",
        ));
    }

    // 5. No orphan steps: every non-start step id must appear among the
    // connection endpoints.
    let endpoints: HashSet<&str> = graph
        .connections
        .iter()
        .flat_map(|c| [c.source_step_id.as_str(), c.target_step_id.as_str()])
        .collect();
    for step in &graph.steps {
        if step.kind() != StepKind::Start && !endpoints.contains(step.id.as_str()) {
            report.findings.push(
                Finding::error(
                    FindingCode::OrphanStep,
                    format!("step '{}' is not connected to the process flow", step.label),
                )
                .for_step(&step.id),
            );
        }
    }

    // Connected steps that are not terminals still need a way forward,
    // or execution stalls silently.
    for step in &graph.steps {
        let connected =
            step.kind() == StepKind::Start || endpoints.contains(step.id.as_str());
        let has_outgoing = graph.outgoing(&step.id).next().is_some();
        if connected && step.kind() != StepKind::Terminal && !has_outgoing {
            report.findings.push(
                Finding::error(
                    FindingCode::DeadEndStep,
                    format!("step '{}' has no outgoing connection", step.label),
                )
                .for_step(&step.id),
            );
        }
    }

    // 6. Reachability: a cycle-safe forward traversal from the start step
    // must visit at least one terminal. Only meaningful when the start is
    // unambiguous and a terminal exists at all.
    if let [start] = starts.as_slice() {
        if has_terminal && !index.reaches_terminal(graph, &start.id) {
            report.findings.push(Finding::error(
                FindingCode::NoPathToTerminal,
                "no path leads from the start step to an end step",
            ));
        }
    }

    // 7. Per-step configuration completeness, via the catalog predicate.
    for step in &graph.steps {
        for field in catalog::missing_required_fields(&step.config) {
            report.findings.push(
                Finding::error(
                    FindingCode::MissingConfigField,
                    format!("step '{}' is missing required field '{}'", step.label, field),
                )
                .for_step(&step.id),
            );
        }
        if step.label.trim().is_empty() {
            report.findings.push(
                Finding::error(FindingCode::UnlabeledStep, "step has an empty label")
                    .for_step(&step.id),
            );
        }
    }

    if graph.name.trim().is_empty() {
        report.findings.push(Finding::error(
            FindingCode::UnnamedProcess,
            "the process has no name",
        ));
    }

    Ok(report)
}

/// Trigger subtype completeness for a start step. No trigger at all only
/// warns: the process stays runnable through manual invocation.
fn check_trigger(start: &Step, report: &mut ValidationReport) {
    use crate::process::types::StepConfig;

    let StepConfig::Start(config) = &start.config else {
        return;
    };

    let Some(trigger) = &config.trigger else {
        report.findings.push(
            Finding::warning(
                FindingCode::ManualTriggerOnly,
                format!(
                    "start step '{}' has no trigger and will require manual invocation",
                    start.label
                ),
            )
            .for_step(&start.id),
        );
        return;
    };

    let mut missing_fields: Vec<&str> = Vec::new();
    match trigger {
        TriggerConfig::StorageEvent { table, event } => {
            if table.trim().is_empty() {
                missing_fields.push("table");
            }
            if event.trim().is_empty() {
                missing_fields.push("event");
            }
        }
        TriggerConfig::Webhook { url } => {
            if url.trim().is_empty() {
                missing_fields.push("url");
            }
        }
        TriggerConfig::Schedule { expression } => {
            if expression.trim().is_empty() {
                missing_fields.push("expression");
            } else {
                // Structural check only: 5-7 whitespace-separated fields,
                // the shape the scheduler accepts. Full cron parsing is
                // the engine's concern.
                let fields = expression.split_whitespace().count();
                if !(5..=7).contains(&fields) {
                    report.findings.push(
                        Finding::error(
                            FindingCode::InvalidSchedule,
                            format!(
                                "start step '{}' has an invalid schedule expression '{}'",
                                start.label, expression
                            ),
                        )
                        .for_step(&start.id),
                    );
                }
            }
        }
    }

    for field in missing_fields {
        report.findings.push(
            Finding::error(
                FindingCode::MissingTriggerField,
                format!(
                    "start step '{}' trigger is missing required field '{}'",
                    start.label, field
                ),
            )
            .for_step(&start.id),
        );
    }
}

/// Petgraph view of a process graph with id <-> index maps, used for the
/// reachability traversal.
struct GraphIndex {
    graph: DiGraph<(), ()>,
    step_index: HashMap<String, NodeIndex>,
}

impl GraphIndex {
    fn build(process: &ProcessGraph) -> Result<Self, GraphFault> {
        let mut graph = DiGraph::new();
        let mut step_index = HashMap::new();

        for step in &process.steps {
            let idx = graph.add_node(());
            step_index.insert(step.id.clone(), idx);
        }

        for connection in &process.connections {
            let from = step_index.get(&connection.source_step_id).ok_or_else(|| {
                GraphFault::DanglingConnection {
                    connection_id: connection.id.clone(),
                    step_id: connection.source_step_id.clone(),
                }
            })?;
            let to = step_index.get(&connection.target_step_id).ok_or_else(|| {
                GraphFault::DanglingConnection {
                    connection_id: connection.id.clone(),
                    step_id: connection.target_step_id.clone(),
                }
            })?;
            graph.add_edge(*from, *to, ());
        }

        Ok(Self { graph, step_index })
    }

    /// Depth-first from the start step; visited marking makes this safe
    /// on cyclic graphs (loop steps legitimately create cycles).
    fn reaches_terminal(&self, process: &ProcessGraph, start_id: &str) -> bool {
        let Some(&start) = self.step_index.get(start_id) else {
            return false;
        };

        let terminal_indices: HashSet<NodeIndex> = process
            .terminal_steps()
            .filter_map(|s| self.step_index.get(&s.id).copied())
            .collect();

        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(visited) = dfs.next(&self.graph) {
            if terminal_indices.contains(&visited) {
                return true;
            }
        }
        false
    }
}
