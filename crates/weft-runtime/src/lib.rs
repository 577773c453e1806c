#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod capability;
pub mod engine;
mod error;
pub mod graph;
pub mod job;
pub mod message;
pub mod node;

#[doc(hidden)]
pub mod prelude;

pub use error::{BoxedError, ContextError, Error, Result};

/// Tracing target for runtime operations.
pub const TRACING_TARGET: &str = "weft_runtime";
