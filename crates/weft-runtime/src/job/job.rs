//! Job record.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::{JobId, JobStatus, RunRequest};
use crate::graph::Workflow;

/// A single execution of a workflow.
///
/// Mutated only by the runner that owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job ID.
    pub id: JobId,
    /// Identifier of the stored workflow.
    pub workflow_id: String,
    /// Identifier of the requesting user.
    pub user_id: String,
    /// Current status.
    pub status: JobStatus,
    /// Creation timestamp.
    pub created_at: Timestamp,
    /// When the job started running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the job reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
    /// Failure message of a failed job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Snapshot of the workflow definition.
    pub graph: Workflow,
}

impl Job {
    /// Creates a pending job for a run request.
    pub fn new(id: JobId, request: &RunRequest) -> Self {
        Self {
            id,
            workflow_id: request.workflow_id.clone(),
            user_id: request.user_id.clone(),
            status: JobStatus::Pending,
            created_at: Timestamp::now(),
            started_at: None,
            completed_at: None,
            error: None,
            graph: request.graph.clone(),
        }
    }

    /// Moves the job to `next`, stamping the matching timestamp.
    ///
    /// Returns `false` and leaves the job untouched if the transition is
    /// not legal from the current status.
    pub fn transition(&mut self, next: JobStatus, error: Option<String>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }

        let now = Timestamp::now();
        match next {
            JobStatus::Running => self.started_at = Some(now),
            _ if next.is_finished() => self.completed_at = Some(now),
            _ => {}
        }
        self.status = next;
        self.error = error;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_timestamps() {
        let mut job = Job::new(JobId::new(), &RunRequest::new(Workflow::default()));
        assert!(job.transition(JobStatus::Running, None));
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_none());

        assert!(job.transition(JobStatus::Failed, Some("boom".into())));
        assert!(job.completed_at.is_some());
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut job = Job::new(JobId::new(), &RunRequest::new(Workflow::default()));
        assert!(job.transition(JobStatus::Running, None));
        assert!(job.transition(JobStatus::Completed, None));
        assert!(!job.transition(JobStatus::Failed, Some("late".into())));
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.error.is_none());
    }
}
