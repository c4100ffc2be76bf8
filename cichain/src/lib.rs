//! # cichain
//!
//! Building blocks for creating CI pipelines:
//!
//! - **Pipeline chain**: an ordered, short-circuiting list of steps that
//!   enforce plan quotas before a pipeline is created
//! - **`extends` resolution**: deep merging of CI configuration entries with
//!   their bases, with cycle and depth checks
//! - **Build timeouts**: picking the timeout that applies to a build from the
//!   job, the project and the runner
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cichain::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run(project: Arc<Project>, mut pipeline: Pipeline) -> Result<(), ChainError> {
//! let store: Arc<dyn PipelineStore> = Arc::new(InMemoryPipelineStore::new());
//! let chain = Sequence::with_default_steps(store);
//!
//! let mut command = Command::new(project, "main").with_save_incompleted(true);
//! if chain.run(&mut pipeline, &mut command).await?.is_broken() {
//!     for error in &command.errors {
//!         eprintln!("{error}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod chain;
pub mod config;
pub mod core;
pub mod entities;
pub mod errors;
pub mod events;
pub mod quota;
pub mod store;
pub mod testing;
pub mod timeout;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::chain::{
        RetryConfig, Sequence, SequenceOutcome, Step, StepContext, StepFactory, StepKind,
    };
    pub use crate::config::extendable::Collection;
    pub use crate::config::{ChainConfig, ExtendsConfig};
    pub use crate::core::{FailureReason, PipelineEvent, PipelineStatus};
    pub use crate::entities::{
        Build, BuildMetadata, Command, Namespace, Pipeline, PlanLimits, Project, Runner,
        StageSeed,
    };
    pub use crate::errors::{ChainError, CommandError, ExtensionError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::quota::Limit;
    pub use crate::store::{InMemoryPipelineStore, PipelineStore, StoreError};
    pub use crate::timeout::{Timeout, TimeoutCalculator, TimeoutSource};
    pub use crate::utils::{parse_duration, Timestamp};
}
