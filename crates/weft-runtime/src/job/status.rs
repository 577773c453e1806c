//! Job status enumeration.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Execution status of a job.
///
/// A job moves `Pending → Running → {Completed, Failed, Cancelled}`; the
/// three finished states are terminal.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
#[derive(Serialize, Deserialize, AsRefStr, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    /// Job is waiting to start.
    #[default]
    Pending,
    /// Job is executing.
    Running,
    /// Job finished successfully.
    Completed,
    /// Job stopped because a node or the context failed.
    Failed,
    /// Job was cancelled.
    Cancelled,
}

impl JobStatus {
    /// Returns whether the job is waiting to start.
    #[inline]
    pub fn is_pending(self) -> bool {
        matches!(self, JobStatus::Pending)
    }

    /// Returns whether the job is executing.
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, JobStatus::Running)
    }

    /// Returns whether the job completed successfully.
    #[inline]
    pub fn is_completed(self) -> bool {
        matches!(self, JobStatus::Completed)
    }

    /// Returns whether the job failed.
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, JobStatus::Failed)
    }

    /// Returns whether the job was cancelled.
    #[inline]
    pub fn is_cancelled(self) -> bool {
        matches!(self, JobStatus::Cancelled)
    }

    /// Returns whether the job has finished (completed, failed, or cancelled).
    #[inline]
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Returns whether moving to `next` is a legal transition.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Pending, JobStatus::Running) => true,
            (JobStatus::Pending, JobStatus::Cancelled) => true,
            (JobStatus::Running, next) => next.is_finished(),
            _ => false,
        }
    }
}
