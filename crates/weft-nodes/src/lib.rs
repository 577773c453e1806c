#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

use weft_runtime::node::NodeRegistry;

pub mod constant;
pub mod image;
pub mod input;
pub mod list;
pub mod math;
pub mod model;
pub mod output;
pub mod util;

#[cfg(test)]
mod scenarios;

/// Tracing target for builtin node operations.
pub const TRACING_TARGET: &str = "weft_nodes";

/// Registers every builtin node type.
pub fn register_builtins(registry: &mut NodeRegistry) -> &mut NodeRegistry {
    registry
        .register::<input::IntegerInput>()
        .register::<input::FloatInput>()
        .register::<input::StringInput>()
        .register::<input::BooleanInput>()
        .register::<input::ImageInput>()
        .register::<input::ListInput>()
        .register::<output::ValueOutput>()
        .register::<output::ImageOutput>()
        .register::<constant::ListConstant>()
        .register::<math::Add>()
        .register::<math::Subtract>()
        .register::<math::Multiply>()
        .register::<math::Divide>()
        .register::<list::Length>()
        .register::<image::Blend>()
        .register::<util::Now>()
        .register::<model::Prediction>()
}

/// Creates a registry with the scope types and every builtin node type.
pub fn builtin_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_builtins(&mut registry);
    registry
}
