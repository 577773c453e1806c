//! Messages streamed to the caller while a job runs.
//!
//! Messages are serialized as newline-delimited JSON, tagged by `type`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display};

use crate::graph::NodeId;
use crate::job::{JobId, JobStatus};

/// Status carried by a node update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeStatus {
    /// The node was dispatched.
    Starting,
    /// The node finished and its outputs were recorded.
    Completed,
    /// The node failed.
    Failed,
}

/// A progress or status message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// A node changed status.
    NodeUpdate {
        /// Node ID.
        node_id: NodeId,
        /// Node type tag.
        node_type: String,
        /// New status.
        status: NodeStatus,
        /// Failure message of a failed node.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        /// Outputs of a completed node.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Map<String, Value>>,
        /// Whether the outputs were served from the cache.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        cached: bool,
    },
    /// A running node reported progress.
    NodeProgress {
        /// Node ID.
        node_id: NodeId,
        /// Units of work done.
        progress: u64,
        /// Units of work in total.
        total: u64,
    },
    /// The job changed status.
    #[serde(alias = "workflow_update")]
    JobUpdate {
        /// Job ID.
        job_id: JobId,
        /// New status.
        status: JobStatus,
        /// Values of the root output nodes, keyed by their name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Map<String, Value>>,
        /// Failure message of a failed job.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

impl Message {
    /// Creates a `starting` node update.
    pub fn node_starting(node_id: NodeId, node_type: impl Into<String>) -> Self {
        Self::NodeUpdate {
            node_id,
            node_type: node_type.into(),
            status: NodeStatus::Starting,
            error: None,
            result: None,
            cached: false,
        }
    }

    /// Creates a `completed` node update.
    pub fn node_completed(
        node_id: NodeId,
        node_type: impl Into<String>,
        result: Map<String, Value>,
        cached: bool,
    ) -> Self {
        Self::NodeUpdate {
            node_id,
            node_type: node_type.into(),
            status: NodeStatus::Completed,
            error: None,
            result: Some(result),
            cached,
        }
    }

    /// Creates a `failed` node update.
    pub fn node_failed(
        node_id: NodeId,
        node_type: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self::NodeUpdate {
            node_id,
            node_type: node_type.into(),
            status: NodeStatus::Failed,
            error: Some(error.into()),
            result: None,
            cached: false,
        }
    }

    /// Creates a job update.
    pub fn job_update(job_id: JobId, status: JobStatus) -> Self {
        Self::JobUpdate {
            job_id,
            status,
            result: None,
            error: None,
        }
    }

    /// Returns the node the message refers to, if any.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NodeUpdate { node_id, .. } | Self::NodeProgress { node_id, .. } => Some(node_id),
            Self::JobUpdate { .. } => None,
        }
    }

    /// Returns whether this is the final message of a job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::JobUpdate { status, .. } if status.is_finished())
    }

    /// Serializes the message as a single NDJSON line without the newline.
    pub fn to_ndjson(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_node_update_wire_format() {
        let message = Message::node_completed(
            NodeId::from("add"),
            "math.Add",
            json!({ "output": 15 }).as_object().cloned().unwrap_or_default(),
            false,
        );
        let json = serde_json::to_value(&message).expect("serialization failed");
        assert_eq!(
            json,
            json!({
                "type": "node_update",
                "node_id": "add",
                "node_type": "math.Add",
                "status": "completed",
                "result": { "output": 15 }
            })
        );
    }

    #[test]
    fn test_cached_flag_is_emitted_when_set() {
        let message = Message::node_completed(NodeId::from("a"), "math.Add", Map::new(), true);
        let line = message.to_ndjson().expect("serialization failed");
        assert!(line.contains("\"cached\":true"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_workflow_update_alias() {
        let job_id = JobId::new();
        let message: Message = serde_json::from_value(json!({
            "type": "workflow_update",
            "job_id": job_id,
            "status": "completed"
        }))
        .expect("deserialization failed");
        assert_eq!(message, Message::job_update(job_id, JobStatus::Completed));
        assert!(message.is_terminal());
        assert!(!Message::job_update(job_id, JobStatus::Running).is_terminal());
    }

    #[test]
    fn test_progress_wire_format() {
        let message = Message::NodeProgress {
            node_id: NodeId::from("model"),
            progress: 1,
            total: 4,
        };
        assert_eq!(
            serde_json::to_value(&message).expect("serialization failed"),
            json!({ "type": "node_progress", "node_id": "model", "progress": 1, "total": 4 })
        );
        assert_eq!(message.node_id(), Some(&NodeId::from("model")));
    }
}
