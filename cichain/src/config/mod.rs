//! Chain settings and CI configuration processing.

pub mod extendable;
mod settings;

pub use settings::{ChainConfig, ExtendsConfig};
