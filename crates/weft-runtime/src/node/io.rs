//! Resolved node inputs and produced node outputs.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::NodeError;
use crate::capability::AssetRef;

/// Fully resolved input values of a node.
///
/// Built from schema defaults, overlaid by literals, overlaid by upstream
/// results bound through edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct NodeInputs(Map<String, Value>);

impl NodeInputs {
    /// Creates an empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an input value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Returns an input value, treating `null` as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    /// Returns an input value or fails with `invalid_input`.
    pub fn require(&self, name: &str) -> Result<&Value, NodeError> {
        self.get(name).ok_or_else(|| {
            NodeError::invalid_input().with_message(format!("missing input '{name}'"))
        })
    }

    /// Returns an integer input.
    pub fn i64(&self, name: &str) -> Result<i64, NodeError> {
        self.require(name)?
            .as_i64()
            .ok_or_else(|| mismatch(name, "an integer"))
    }

    /// Returns a numeric input as a float.
    pub fn f64(&self, name: &str) -> Result<f64, NodeError> {
        self.require(name)?
            .as_f64()
            .ok_or_else(|| mismatch(name, "a number"))
    }

    /// Returns a string input.
    pub fn str(&self, name: &str) -> Result<&str, NodeError> {
        self.require(name)?
            .as_str()
            .ok_or_else(|| mismatch(name, "a string"))
    }

    /// Returns a boolean input.
    pub fn bool(&self, name: &str) -> Result<bool, NodeError> {
        self.require(name)?
            .as_bool()
            .ok_or_else(|| mismatch(name, "a boolean"))
    }

    /// Returns a list input.
    pub fn list(&self, name: &str) -> Result<&[Value], NodeError> {
        self.require(name)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| mismatch(name, "a list"))
    }

    /// Returns a stored asset reference.
    pub fn asset(&self, name: &str) -> Result<AssetRef, NodeError> {
        let value = self.require(name)?;
        serde_json::from_value(value.clone()).map_err(|e| {
            mismatch(name, "an asset reference").with_source(e)
        })
    }

    /// Returns the inputs as a JSON map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the inputs and returns the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

fn mismatch(name: &str, expected: &str) -> NodeError {
    NodeError::invalid_input().with_message(format!("input '{name}' is not {expected}"))
}

/// Values produced by a node, keyed by output slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, From, Into)]
#[serde(transparent)]
pub struct NodeOutputs(Map<String, Value>);

impl NodeOutputs {
    /// Creates an empty output set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates outputs holding a single value in the `output` slot.
    pub fn output(value: impl Into<Value>) -> Self {
        Self::new().with("output", value)
    }

    /// Adds a slot value.
    pub fn with(mut self, slot: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(slot.into(), value.into());
        self
    }

    /// Sets a slot value.
    pub fn insert(&mut self, slot: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(slot.into(), value.into());
    }

    /// Returns a slot value.
    pub fn get(&self, slot: &str) -> Option<&Value> {
        self.0.get(slot)
    }

    /// Returns the outputs as a JSON map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the outputs and returns the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::node::NodeErrorKind;

    fn inputs(value: Value) -> NodeInputs {
        NodeInputs::from(value.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_typed_getters() {
        let inputs = inputs(json!({ "a": 3, "b": 1.5, "s": "x", "l": [1, 2], "n": null }));
        assert_eq!(inputs.i64("a").ok(), Some(3));
        assert_eq!(inputs.f64("a").ok(), Some(3.0));
        assert_eq!(inputs.f64("b").ok(), Some(1.5));
        assert_eq!(inputs.str("s").ok(), Some("x"));
        assert_eq!(inputs.list("l").map(<[Value]>::len).ok(), Some(2));
        assert!(inputs.get("n").is_none());
    }

    #[test]
    fn test_missing_and_mismatched() {
        let inputs = inputs(json!({ "s": "x" }));
        let missing = inputs.f64("a").expect_err("missing input accepted");
        assert_eq!(missing.kind(), NodeErrorKind::InvalidInput);
        assert_eq!(missing.to_string(), "invalid_input: missing input 'a'");

        let mismatched = inputs.i64("s").expect_err("string accepted as integer");
        assert_eq!(mismatched.to_string(), "invalid_input: input 's' is not an integer");
    }

    #[test]
    fn test_asset_input() {
        let inputs = inputs(json!({
            "image": { "type": "image", "uri": "memory://1", "content_type": "image/png" }
        }));
        let asset = inputs.asset("image").expect("asset");
        assert_eq!(asset.uri, "memory://1");
    }

    #[test]
    fn test_outputs() {
        let outputs = NodeOutputs::output(15).with("extra", "x");
        assert_eq!(outputs.get("output"), Some(&json!(15)));
        assert_eq!(outputs.as_map().len(), 2);
    }
}
