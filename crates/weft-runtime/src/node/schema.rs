//! Node type schemas.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumString};

/// Role a node type plays in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    /// Ordinary computation.
    #[default]
    Processing,
    /// Receives a job parameter through its `value` property.
    Input,
    /// Contributes its `output` slot to the job result under its `name`.
    Output,
    /// Runs its body once per element of its `input` list.
    Loop,
    /// Runs its body once with named inputs and outputs.
    Group,
    /// Injects a value into a loop or group body.
    GroupInput,
    /// Exports a value out of a loop or group body.
    GroupOutput,
}

impl NodeKind {
    /// Returns whether nodes of this kind own a nested scope.
    pub fn is_scope(self) -> bool {
        matches!(self, Self::Loop | Self::Group)
    }
}

/// Type of a property or output slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PropertyType {
    /// Any JSON value.
    #[default]
    Any,
    /// Integer number.
    Int,
    /// Floating point number; integers widen to it.
    Float,
    /// UTF-8 string.
    String,
    /// Boolean.
    Bool,
    /// JSON array.
    List,
    /// JSON object.
    Object,
    /// Stored image reference.
    Image,
}

impl PropertyType {
    /// Returns whether a literal value fits this type. `null` fits every type.
    pub fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) | (Self::Any, _) => true,
            (Self::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Float, Value::Number(_)) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::List, Value::Array(_)) => true,
            (Self::Object, Value::Object(_)) => true,
            (Self::Image, Value::Object(map)) => map.get("uri").is_some_and(Value::is_string),
            _ => false,
        }
    }

    /// Returns whether an output of this type may feed a property of `target`.
    pub fn is_assignable_to(self, target: PropertyType) -> bool {
        self == target
            || self == Self::Any
            || target == Self::Any
            || (self == Self::Int && target == Self::Float)
    }
}

/// Declaration of an input property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySchema {
    /// Property name.
    pub name: String,
    /// Property type.
    #[serde(rename = "type")]
    pub ty: PropertyType,
    /// Value used when neither a literal nor an edge provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertySchema {
    /// Creates a property without a default.
    pub fn new(name: impl Into<String>, ty: PropertyType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            description: None,
        }
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Declaration of an output slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    /// Slot name.
    pub name: String,
    /// Slot type.
    #[serde(rename = "type")]
    pub ty: PropertyType,
}

impl OutputSlot {
    /// Creates an output slot.
    pub fn new(name: impl Into<String>, ty: PropertyType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Static description of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSchema {
    /// Namespaced type tag.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Display title.
    pub title: String,
    /// Engine role.
    #[serde(default)]
    pub kind: NodeKind,
    /// Input properties in declaration order.
    #[serde(default)]
    pub properties: Vec<PropertySchema>,
    /// Output slots in declaration order.
    #[serde(default)]
    pub outputs: Vec<OutputSlot>,
}

impl NodeSchema {
    /// Creates an empty processing schema titled after the type tag.
    pub fn new(node_type: impl Into<String>) -> Self {
        let node_type = node_type.into();
        let title = node_type
            .rsplit('.')
            .next()
            .unwrap_or(node_type.as_str())
            .to_owned();
        Self {
            node_type,
            title,
            kind: NodeKind::Processing,
            properties: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the engine role.
    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Appends an input property.
    pub fn with_property(mut self, property: PropertySchema) -> Self {
        self.properties.push(property);
        self
    }

    /// Appends an output slot.
    pub fn with_output(mut self, name: impl Into<String>, ty: PropertyType) -> Self {
        self.outputs.push(OutputSlot::new(name, ty));
        self
    }

    /// Returns a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns an output slot by name.
    pub fn output(&self, name: &str) -> Option<&OutputSlot> {
        self.outputs.iter().find(|slot| slot.name == name)
    }

    /// Returns the declared property defaults.
    pub fn defaults(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .filter_map(|p| Some((p.name.clone(), p.default.clone()?)))
            .collect()
    }
}
