//! Benchmarks for `extends` resolution and the pipeline chain.

use cichain::prelude::*;
use cichain::testing::{pipeline_with_jobs, TestProject};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn document(jobs: usize) -> Map<String, Value> {
    let mut doc = Map::new();
    doc.insert(
        ".base".to_string(),
        json!({"image": "ruby:3.3", "variables": {"RAILS_ENV": "test"}, "tags": ["docker"]}),
    );
    doc.insert(
        ".rspec".to_string(),
        json!({"extends": ".base", "script": ["bundle exec rspec"], "variables": {"CI": "1"}}),
    );
    for i in 0..jobs {
        doc.insert(
            format!("rspec {i}"),
            json!({"extends": [".rspec", ".base"], "variables": {"NODE": i}}),
        );
    }
    doc
}

fn extends_benchmark(c: &mut Criterion) {
    let doc = document(500);
    c.bench_function("extends_500_jobs", |b| {
        b.iter(|| Collection::new(black_box(&doc)).map(Collection::into_hash))
    });
}

fn chain_benchmark(c: &mut Criterion) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let Ok(runtime) = tokio::runtime::Builder::new_current_thread().build() else {
        return;
    };
    let project = TestProject::new()
        .with_limits(
            PlanLimits::new()
                .with_pipeline_size(100)
                .with_active_pipelines(50)
                .with_active_jobs(1_000),
        )
        .build();
    let store: Arc<dyn PipelineStore> = Arc::new(InMemoryPipelineStore::new());
    let chain = Sequence::with_default_steps(store).with_event_sink(Arc::new(NoOpEventSink));

    c.bench_function("chain_default_steps", |b| {
        b.iter(|| {
            let mut pipeline = pipeline_with_jobs(project.clone(), 20);
            let mut command = Command::new(project.clone(), "main");
            runtime.block_on(chain.run(&mut pipeline, &mut command))
        })
    });
}

criterion_group!(benches, extends_benchmark, chain_benchmark);
criterion_main!(benches);
