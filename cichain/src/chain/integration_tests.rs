//! End-to-end runs of the built-in chain against a store.

use super::*;
use crate::config::ChainConfig;
use crate::core::{FailureReason, PipelineStatus};
use crate::entities::{Command, Pipeline, PlanLimits, Project};
use crate::errors::ChainError;
use crate::events::CollectingEventSink;
use crate::store::{InMemoryPipelineStore, MockPipelineStore, PipelineStore, StoreError};
use crate::testing::{
    assert_command_errors, assert_pipeline_dropped, assert_pipeline_untouched,
    pipeline_with_jobs, TestProject,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

struct Harness {
    store: Arc<InMemoryPipelineStore>,
    sink: Arc<CollectingEventSink>,
    chain: Sequence,
}

fn harness(config: ChainConfig) -> Harness {
    let store = Arc::new(InMemoryPipelineStore::new());
    let sink = Arc::new(CollectingEventSink::new());
    let chain = Sequence::with_default_steps(Arc::clone(&store) as Arc<dyn PipelineStore>)
        .with_config(config)
        .with_event_sink(sink.clone());
    Harness { store, sink, chain }
}

async fn seed_alive_pipelines(store: &InMemoryPipelineStore, project: &Arc<Project>, count: usize) {
    for _ in 0..count {
        let mut pipeline = Pipeline::new(project.clone(), "main", "seed");
        store.save(&mut pipeline).await.unwrap();
    }
}

fn performed_steps(sink: &CollectingEventSink) -> Vec<String> {
    sink.events_of_type("chain.step.completed")
        .into_iter()
        .filter_map(|(_, data)| data?.get("step")?.as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn test_within_all_limits_completes() {
    let h = harness(ChainConfig::default());
    let project = TestProject::new()
        .with_limits(
            PlanLimits::new()
                .with_active_pipelines(5)
                .with_pipeline_size(10)
                .with_active_jobs(100),
        )
        .build();
    seed_alive_pipelines(&h.store, &project, 2).await;

    let mut pipeline = pipeline_with_jobs(project.clone(), 3);
    let mut command = Command::new(project, "main");

    let outcome = h.chain.run(&mut pipeline, &mut command).await.unwrap();

    assert_eq!(outcome, SequenceOutcome::Completed);
    assert_pipeline_untouched(&pipeline);
    assert!(!pipeline.is_persisted());
    assert_command_errors(&command, &[]);
    assert_eq!(
        performed_steps(&h.sink),
        vec!["limit_activity", "limit_size", "limit_job_activity"]
    );
}

#[tokio::test]
async fn test_activity_limit_drops_and_breaks() {
    let h = harness(ChainConfig::default());
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_active_pipelines(1).with_active_jobs(1))
        .build();
    seed_alive_pipelines(&h.store, &project, 2).await;

    let mut pipeline = pipeline_with_jobs(project.clone(), 1);
    let mut command = Command::new(project, "main");

    let outcome = h.chain.run(&mut pipeline, &mut command).await.unwrap();

    assert_eq!(
        outcome,
        SequenceOutcome::Broken {
            step: "limit_activity".to_string()
        }
    );
    assert_pipeline_dropped(&pipeline, FailureReason::ActivityLimitExceeded);
    assert!(pipeline.is_persisted());
    assert_command_errors(&command, &[]);
    assert_eq!(performed_steps(&h.sink), vec!["limit_activity"]);

    let stored = h.store.get(pipeline.id.unwrap()).unwrap();
    assert_eq!(stored.status, PipelineStatus::Failed);
}

#[tokio::test]
async fn test_size_limit_with_save_incompleted() {
    let h = harness(ChainConfig::default());
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_pipeline_size(2).with_active_pipelines(3))
        .build();
    seed_alive_pipelines(&h.store, &project, 2).await;

    let mut pipeline = pipeline_with_jobs(project.clone(), 5);
    let mut command = Command::new(project, "main").with_save_incompleted(true);

    let outcome = h.chain.run(&mut pipeline, &mut command).await.unwrap();

    assert_eq!(
        outcome,
        SequenceOutcome::Broken {
            step: "limit_size".to_string()
        }
    );
    assert_pipeline_dropped(&pipeline, FailureReason::SizeLimitExceeded);
    assert!(pipeline.is_persisted());
    assert_command_errors(&command, &["Pipeline size limit exceeded by 3 jobs!"]);
    assert_eq!(performed_steps(&h.sink), vec!["limit_activity", "limit_size"]);
}

#[tokio::test]
async fn test_activity_counts_the_pipeline_being_created() {
    let h = harness(ChainConfig::default());
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_active_pipelines(1))
        .build();
    seed_alive_pipelines(&h.store, &project, 1).await;

    let mut pipeline = pipeline_with_jobs(project.clone(), 1);
    let mut command = Command::new(project, "main");

    let outcome = h.chain.run(&mut pipeline, &mut command).await.unwrap();

    assert_eq!(
        outcome,
        SequenceOutcome::Broken {
            step: "limit_activity".to_string()
        }
    );
    assert_pipeline_dropped(&pipeline, FailureReason::ActivityLimitExceeded);
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn test_activity_breaks_before_size_is_checked() {
    let h = harness(ChainConfig::default());
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_active_pipelines(1).with_pipeline_size(1))
        .build();
    seed_alive_pipelines(&h.store, &project, 3).await;

    let mut pipeline = pipeline_with_jobs(project.clone(), 5);
    let mut command = Command::new(project, "main").with_save_incompleted(true);

    let outcome = h.chain.run(&mut pipeline, &mut command).await.unwrap();

    assert_eq!(
        outcome,
        SequenceOutcome::Broken {
            step: "limit_activity".to_string()
        }
    );
    assert_pipeline_dropped(&pipeline, FailureReason::ActivityLimitExceeded);
    assert_command_errors(&command, &[]);
    assert_eq!(performed_steps(&h.sink), vec!["limit_activity"]);
}

#[tokio::test]
async fn test_size_limit_without_save_incompleted() {
    let h = harness(ChainConfig::default());
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_pipeline_size(2))
        .build();

    let mut pipeline = pipeline_with_jobs(project.clone(), 3);
    let mut command = Command::new(project, "main");

    let outcome = h.chain.run(&mut pipeline, &mut command).await.unwrap();

    assert!(outcome.is_broken());
    assert_pipeline_untouched(&pipeline);
    assert!(!pipeline.is_persisted());
    assert!(h.store.is_empty());
    assert_command_errors(&command, &["Pipeline size limit exceeded by 1 job!"]);
    assert_eq!(command.errors[0].code, FailureReason::SizeLimitExceeded.code());
}

#[tokio::test]
async fn test_job_activity_limit_breaks() {
    let h = harness(ChainConfig::default().with_job_activity_window_hours(1));
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_active_jobs(4))
        .build();
    let mut busy = pipeline_with_jobs(project.clone(), 6);
    h.store.save(&mut busy).await.unwrap();

    let mut pipeline = pipeline_with_jobs(project.clone(), 1);
    let mut command = Command::new(project, "main");

    let outcome = h.chain.run(&mut pipeline, &mut command).await.unwrap();

    assert_eq!(
        outcome,
        SequenceOutcome::Broken {
            step: "limit_job_activity".to_string()
        }
    );
    assert_pipeline_dropped(&pipeline, FailureReason::JobActivityLimitExceeded);
}

#[tokio::test]
async fn test_conflicts_are_retried() {
    let h = harness(ChainConfig::default());
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_active_pipelines(1))
        .build();
    seed_alive_pipelines(&h.store, &project, 1).await;

    let mut pipeline = pipeline_with_jobs(project.clone(), 1);
    h.store.save(&mut pipeline).await.unwrap();
    h.store.inject_conflicts(3);
    let mut command = Command::new(project, "main");

    let outcome = h.chain.run(&mut pipeline, &mut command).await.unwrap();

    assert!(outcome.is_broken());
    assert_pipeline_dropped(&pipeline, FailureReason::ActivityLimitExceeded);
    let stored = h.store.get(pipeline.id.unwrap()).unwrap();
    assert_eq!(stored.failure_reason, Some(FailureReason::ActivityLimitExceeded));
    assert_eq!(stored.lock_version, pipeline.lock_version);
}

#[tokio::test]
async fn test_exhausted_conflicts_surface_stale_object() {
    let h = harness(
        ChainConfig::default().with_optimistic_lock(RetryConfig::new().with_max_attempts(2)),
    );
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_active_pipelines(1))
        .build();
    seed_alive_pipelines(&h.store, &project, 1).await;

    let mut pipeline = pipeline_with_jobs(project.clone(), 1);
    h.store.save(&mut pipeline).await.unwrap();
    h.store.inject_conflicts(5);
    let mut command = Command::new(project, "main");

    let err = h.chain.run(&mut pipeline, &mut command).await.unwrap_err();

    assert!(matches!(
        err,
        ChainError::Store(StoreError::StaleObject { .. })
    ));
    assert!(h.sink.events_of_type("chain.broken").is_empty());
}

#[tokio::test]
async fn test_store_errors_propagate() {
    let mut store = MockPipelineStore::new();
    store
        .expect_alive_pipelines_count()
        .times(1)
        .returning(|_| Err(StoreError::Backend("connection refused".to_string())));
    store.expect_save().never();

    let chain = Sequence::new(StepKind::defaults(), Arc::new(store))
        .with_event_sink(Arc::new(CollectingEventSink::new()));

    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_active_pipelines(1))
        .build();
    let mut pipeline = pipeline_with_jobs(project.clone(), 1);
    let mut command = Command::new(project, "main");

    let err = chain.run(&mut pipeline, &mut command).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Store backend error: connection refused"
    );
    assert_pipeline_untouched(&pipeline);
}

#[tokio::test]
async fn test_disabled_limits_never_query_store() {
    let mut store = MockPipelineStore::new();
    store.expect_alive_pipelines_count().never();
    store.expect_active_jobs_count().never();
    store.expect_save().never();

    let chain = Sequence::with_default_steps(Arc::new(store))
        .with_event_sink(Arc::new(CollectingEventSink::new()));

    let project = TestProject::new().build();
    let mut pipeline = pipeline_with_jobs(project.clone(), 500);
    let mut command = Command::new(project, "main").with_save_incompleted(true);

    assert_eq!(
        chain.run(&mut pipeline, &mut command).await.unwrap(),
        SequenceOutcome::Completed
    );
}

#[tokio::test]
async fn test_chain_logs_with_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let h = harness(ChainConfig::default());
    let project = TestProject::new()
        .with_limits(PlanLimits::new().with_pipeline_size(1))
        .build();
    let mut pipeline = pipeline_with_jobs(project.clone(), 2);
    let mut command = Command::new(project, "main");

    assert!(h.chain.run(&mut pipeline, &mut command).await.unwrap().is_broken());
}
