//! End-to-end scenarios: author a process through the graph model,
//! validate it, persist it, submit it through the bridge and observe
//! execution progress through the in-memory simulation engine.

use credflow::bridge::{BridgeError, ExecutionBridge, ExecutionEngine, InMemoryEngine, RunStatus};
use credflow::process::registry::ProcessRegistry;
use credflow::process::storage::ProcessStorage;
use credflow::process::types::{
    BranchKey, ConditionConfig, FormConfig, Position, StartConfig, StepConfig, StepKind,
    TriggerConfig,
};
use credflow::process::validator::{self, FindingCode};
use credflow::process::GraphModel;
use sqlx::sqlite::SqlitePool;
use std::sync::Arc;

async fn test_harness() -> (ProcessStorage, Arc<ProcessRegistry>, Arc<InMemoryEngine>, ExecutionBridge) {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    let storage = ProcessStorage::new(pool);
    storage.init_schema().await.unwrap();

    let registry = Arc::new(ProcessRegistry::new(storage.clone()));
    let engine = Arc::new(InMemoryEngine::new());
    let bridge = ExecutionBridge::new(
        Arc::clone(&registry),
        Arc::clone(&engine) as Arc<dyn ExecutionEngine>,
    );

    (storage, registry, engine, bridge)
}

/// start -> form -> condition -> { yes: approved, no: rejected }
struct BranchingProcess {
    model: GraphModel,
    approved: String,
    rejected: String,
}

fn branching_process() -> BranchingProcess {
    let mut model = GraphModel::new("Accreditation triage");
    let start_id = model.graph().start_step().unwrap().id.clone();

    let form = model
        .add_step(StepKind::Form, Position::new(220.0, 80.0))
        .unwrap();
    let cond = model
        .add_step(StepKind::Condition, Position::new(380.0, 80.0))
        .unwrap();
    let approved = model
        .add_step(StepKind::Terminal, Position::new(540.0, 20.0))
        .unwrap();
    let rejected = model
        .add_step(StepKind::Terminal, Position::new(540.0, 140.0))
        .unwrap();

    model.add_connection(&start_id, &form, None).unwrap();
    model.add_connection(&form, &cond, None).unwrap();
    model
        .add_connection(&cond, &approved, Some(BranchKey::Yes))
        .unwrap();
    model
        .add_connection(&cond, &rejected, Some(BranchKey::No))
        .unwrap();

    model
        .update_step_config(
            &form,
            StepConfig::Form(FormConfig {
                template_id: Some("tpl-applicant-data".to_string()),
                fields: vec![],
            }),
        )
        .unwrap();
    model
        .update_step_config(
            &cond,
            StepConfig::Condition(ConditionConfig {
                question: "Documentation approved?".to_string(),
            }),
        )
        .unwrap();

    BranchingProcess {
        model,
        approved,
        rejected,
    }
}

#[tokio::test]
async fn condition_branching_runs_along_the_yes_edge() {
    let (storage, registry, engine, bridge) = test_harness().await;
    let process = branching_process();

    // Zero validation errors before submission.
    let report = validator::validate(process.model.graph()).unwrap();
    assert!(!report.has_errors(), "unexpected errors: {:?}", report.findings);

    let graph = process.model.into_graph();
    storage.save_process(&graph).await.unwrap();
    registry.reload(&graph.id).await.unwrap();

    let execution_ref = bridge.submit(&graph.id).await.unwrap();

    // start -> form -> condition, then take the yes branch.
    engine.advance(&execution_ref, None).unwrap();
    engine.advance(&execution_ref, None).unwrap();
    engine.advance(&execution_ref, Some(BranchKey::Yes)).unwrap();

    let status = bridge.inspect(&execution_ref).await.unwrap();
    assert_eq!(status.status, RunStatus::Completed);
    assert_eq!(
        status.current_step_id.as_deref(),
        Some(process.approved.as_str())
    );
    assert_ne!(process.approved, process.rejected);
}

#[tokio::test]
async fn no_branch_reaches_the_rejected_terminal() {
    let (storage, registry, engine, bridge) = test_harness().await;
    let process = branching_process();
    let graph = process.model.into_graph();

    storage.save_process(&graph).await.unwrap();
    registry.reload(&graph.id).await.unwrap();
    let execution_ref = bridge.submit(&graph.id).await.unwrap();

    engine.advance(&execution_ref, None).unwrap();
    engine.advance(&execution_ref, None).unwrap();
    engine.advance(&execution_ref, Some(BranchKey::No)).unwrap();

    let status = bridge.inspect(&execution_ref).await.unwrap();
    assert_eq!(
        status.current_step_id.as_deref(),
        Some(process.rejected.as_str())
    );
}

#[tokio::test]
async fn missing_trigger_table_blocks_submission() {
    let (storage, registry, engine, bridge) = test_harness().await;

    let mut process = branching_process();
    let start_id = process.model.graph().start_step().unwrap().id.clone();
    process
        .model
        .update_step_config(
            &start_id,
            StepConfig::Start(StartConfig {
                trigger: Some(TriggerConfig::StorageEvent {
                    table: String::new(),
                    event: "insert".to_string(),
                }),
            }),
        )
        .unwrap();

    // Exactly one error, naming the start step and the missing field.
    let report = validator::validate(process.model.graph()).unwrap();
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, FindingCode::MissingTriggerField);
    assert_eq!(errors[0].step_id.as_deref(), Some(start_id.as_str()));
    assert!(errors[0].message.contains("'table'"));

    let graph = process.model.into_graph();
    storage.save_process(&graph).await.unwrap();
    registry.reload(&graph.id).await.unwrap();

    let err = bridge.submit(&graph.id).await.unwrap_err();
    assert!(matches!(err, BridgeError::ValidationRequired { .. }));
    assert_eq!(engine.submission_count(), 0);
}

#[tokio::test]
async fn persisted_branching_graph_round_trips_structurally() {
    let (storage, _registry, _engine, _bridge) = test_harness().await;
    let graph = branching_process().model.into_graph();

    storage.save_process(&graph).await.unwrap();
    let reloaded = storage.get_process(&graph.id).await.unwrap().unwrap();

    assert_eq!(reloaded, graph);
    // Branch-key projections survive the reload unchanged.
    let labels: Vec<_> = reloaded.connections.iter().map(|c| c.label()).collect();
    let original: Vec<_> = graph.connections.iter().map(|c| c.label()).collect();
    assert_eq!(labels, original);
}

#[tokio::test]
async fn fixing_the_findings_unblocks_submission() {
    let (storage, registry, _engine, bridge) = test_harness().await;

    // Saved while still incomplete: no terminal, no connections.
    let mut model = GraphModel::new("Renewal");
    let start_id = model.graph().start_step().unwrap().id.clone();
    let graph = model.graph().clone();
    storage.save_process(&graph).await.unwrap();
    registry.reload(&graph.id).await.unwrap();
    assert!(matches!(
        bridge.submit(&graph.id).await.unwrap_err(),
        BridgeError::ValidationRequired { .. }
    ));

    // The author connects a terminal and saves again.
    let end = model
        .add_step(StepKind::Terminal, Position::new(240.0, 80.0))
        .unwrap();
    model.add_connection(&start_id, &end, None).unwrap();
    let fixed = model.into_graph();
    storage.save_process(&fixed).await.unwrap();
    registry.reload(&fixed.id).await.unwrap();

    bridge.submit(&fixed.id).await.unwrap();
}
