//! Scripted chain steps for exercising a [`crate::chain::Sequence`].

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::chain::{Step, StepContext, StepFactory};
use crate::entities::{Command, Pipeline};
use crate::errors::ChainError;

/// Shared record of which scripted steps were built and performed.
#[derive(Debug, Clone, Default)]
pub struct StepLog {
    built: Arc<Mutex<Vec<String>>>,
    performed: Arc<Mutex<Vec<String>>>,
}

impl StepLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of built steps, in order.
    #[must_use]
    pub fn built(&self) -> Vec<String> {
        self.built.lock().clone()
    }

    /// Names of performed steps, in order.
    #[must_use]
    pub fn performed(&self) -> Vec<String> {
        self.performed.lock().clone()
    }
}

/// A step whose behavior is fixed up front.
///
/// It acts as its own factory: building returns a copy of itself.
#[derive(Debug, Clone)]
pub struct ScriptedStep {
    name: String,
    breaks: bool,
    error: Option<String>,
    log: Option<StepLog>,
}

impl ScriptedStep {
    /// Creates a step that does nothing and never breaks.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            breaks: false,
            error: None,
            log: None,
        }
    }

    /// Makes the step stop the chain.
    #[must_use]
    pub fn breaking(mut self) -> Self {
        self.breaks = true;
        self
    }

    /// Makes `perform` fail with [`ChainError::Internal`].
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }

    /// Records builds and performs into `log`.
    #[must_use]
    pub fn recording_into(mut self, log: &StepLog) -> Self {
        self.log = Some(log.clone());
        self
    }
}

#[async_trait]
impl StepFactory for ScriptedStep {
    type Step = Self;

    async fn build(
        &self,
        _pipeline: &Pipeline,
        _command: &Command,
        _ctx: &StepContext,
    ) -> Result<Self, ChainError> {
        if let Some(log) = &self.log {
            log.built.lock().push(self.name.clone());
        }
        Ok(self.clone())
    }
}

#[async_trait]
impl Step for ScriptedStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn perform(
        &self,
        _pipeline: &mut Pipeline,
        _command: &mut Command,
    ) -> Result<(), ChainError> {
        if let Some(log) = &self.log {
            log.performed.lock().push(self.name.clone());
        }
        match &self.error {
            Some(message) => Err(ChainError::Internal(message.clone())),
            None => Ok(()),
        }
    }

    fn should_break(&self, _pipeline: &Pipeline, _command: &Command) -> bool {
        self.breaks
    }
}
