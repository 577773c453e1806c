//! Run request submitted by a caller.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::graph::Workflow;

/// A request to execute a workflow.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RunRequest {
    /// Identifier of the stored workflow.
    #[serde(default)]
    pub workflow_id: String,
    /// Identifier of the requesting user.
    #[serde(default)]
    pub user_id: String,
    /// Credential forwarded to external collaborators; never serialized.
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
    /// Workflow graph to run.
    pub graph: Workflow,
    /// Parameters bound to input nodes by name.
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RunRequest {
    /// Creates a request for a graph without parameters.
    pub fn new(graph: Workflow) -> Self {
        Self {
            graph,
            ..Default::default()
        }
    }

    /// Sets the user ID.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Sets the workflow ID.
    pub fn with_workflow_id(mut self, workflow_id: impl Into<String>) -> Self {
        self.workflow_id = workflow_id.into();
        self
    }

    /// Sets the auth token.
    pub fn with_auth_token(mut self, auth_token: impl Into<String>) -> Self {
        self.auth_token = Some(auth_token.into());
        self
    }

    /// Adds a parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl fmt::Debug for RunRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunRequest")
            .field("workflow_id", &self.workflow_id)
            .field("user_id", &self.user_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("graph", &self.graph)
            .field("params", &self.params)
            .finish()
    }
}
