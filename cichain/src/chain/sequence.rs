//! Runs chain steps in order until one asks to stop.

use super::step::{StepContext, StepFactory, StepKind};
use super::Step;
use crate::config::ChainConfig;
use crate::entities::{Command, Pipeline};
use crate::errors::ChainError;
use crate::events::{get_event_sink, EventSink};
use crate::store::PipelineStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// How a chain run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SequenceOutcome {
    /// Every step ran without asking to stop.
    Completed,
    /// A step asked to stop; later steps were not built.
    Broken {
        /// Name of the step that stopped the chain.
        step: String,
    },
}

impl SequenceOutcome {
    /// Returns true if a step stopped the chain.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        matches!(self, Self::Broken { .. })
    }
}

/// An ordered, short-circuiting list of steps.
///
/// Each step is built right before it runs and sees the effects of the steps
/// before it. The sequence holds no state between runs.
pub struct Sequence<F: StepFactory = StepKind> {
    steps: Vec<F>,
    ctx: StepContext,
    sink: Arc<dyn EventSink>,
}

impl Sequence<StepKind> {
    /// Creates a sequence with the built-in steps in their default order.
    #[must_use]
    pub fn with_default_steps(store: Arc<dyn PipelineStore>) -> Self {
        Self::new(StepKind::defaults(), store)
    }
}

impl<F: StepFactory> Sequence<F> {
    /// Creates a sequence over `steps`.
    #[must_use]
    pub fn new(steps: Vec<F>, store: Arc<dyn PipelineStore>) -> Self {
        Self {
            steps,
            ctx: StepContext::new(store),
            sink: get_event_sink(),
        }
    }

    /// Sets the chain settings.
    #[must_use]
    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.ctx = self.ctx.with_config(config);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The step factories, in order.
    #[must_use]
    pub fn steps(&self) -> &[F] {
        &self.steps
    }

    /// Runs the steps against `pipeline` and `command`.
    ///
    /// # Errors
    ///
    /// The first error from building or performing a step is returned as is;
    /// the remaining steps are skipped.
    pub async fn run(
        &self,
        pipeline: &mut Pipeline,
        command: &mut Command,
    ) -> Result<SequenceOutcome, ChainError> {
        for factory in &self.steps {
            let step = factory.build(pipeline, command, &self.ctx).await?;

            let started = Instant::now();
            step.perform(pipeline, command).await?;
            let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            debug!(
                step = step.name(),
                request_id = %command.request_id,
                status = %pipeline.status,
                duration_ms,
                "Chain step performed"
            );
            self.sink.emit(
                "chain.step.completed",
                Some(json!({
                    "step": step.name(),
                    "request_id": command.request_id,
                    "pipeline_id": pipeline.id,
                    "duration_ms": duration_ms,
                })),
            );

            if step.should_break(pipeline, command) {
                info!(
                    step = step.name(),
                    request_id = %command.request_id,
                    project_id = pipeline.project.id,
                    status = %pipeline.status,
                    errors = command.errors.len(),
                    "Pipeline chain broken"
                );
                self.sink.emit(
                    "chain.broken",
                    Some(json!({
                        "step": step.name(),
                        "request_id": command.request_id,
                        "pipeline_id": pipeline.id,
                        "status": pipeline.status,
                        "failure_reason": pipeline.failure_reason,
                        "errors": command.error_messages(),
                    })),
                );
                return Ok(SequenceOutcome::Broken {
                    step: step.name().to_string(),
                });
            }
        }

        self.sink.emit(
            "chain.completed",
            Some(json!({
                "request_id": command.request_id,
                "pipeline_id": pipeline.id,
                "steps": self.steps.len(),
            })),
        );
        Ok(SequenceOutcome::Completed)
    }
}

impl<F: StepFactory> std::fmt::Debug for Sequence<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("steps", &self.steps)
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
