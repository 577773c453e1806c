//! Job persistence.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Job, JobId};
use crate::{Error, Result};

/// Persists job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Stores a new job.
    async fn create(&self, job: &Job) -> Result<()>;

    /// Returns a job owned by `user_id`.
    async fn find(&self, user_id: &str, job_id: JobId) -> Result<Job>;

    /// Replaces a stored job.
    async fn update(&self, job: &Job) -> Result<()>;
}

/// Process-local job store.
#[derive(Debug, Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl InMemoryJobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.id) {
            return Err(Error::Internal(format!("job {} already exists", job.id)));
        }
        jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn find(&self, user_id: &str, job_id: JobId) -> Result<Job> {
        self.jobs
            .read()
            .await
            .get(&job_id)
            .filter(|job| job.user_id == user_id)
            .cloned()
            .ok_or(Error::JobNotFound(job_id))
    }

    async fn update(&self, job: &Job) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let stored = jobs.get_mut(&job.id).ok_or(Error::JobNotFound(job.id))?;
        *stored = job.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Workflow;
    use crate::job::{JobStatus, RunRequest};

    fn job(user_id: &str) -> Job {
        Job::new(
            JobId::new(),
            &RunRequest::new(Workflow::default()).with_user_id(user_id),
        )
    }

    #[tokio::test]
    async fn test_create_find_update() {
        let store = InMemoryJobStore::new();
        let mut job = job("u1");
        store.create(&job).await.expect("create failed");
        assert!(store.create(&job).await.is_err());

        job.transition(JobStatus::Running, None);
        store.update(&job).await.expect("update failed");

        let found = store.find("u1", job.id).await.expect("find failed");
        assert_eq!(found.status, JobStatus::Running);
    }

    #[tokio::test]
    async fn test_find_is_scoped_to_user() {
        let store = InMemoryJobStore::new();
        let job = job("u1");
        store.create(&job).await.expect("create failed");

        let error = store.find("u2", job.id).await.expect_err("foreign job returned");
        assert!(matches!(error, Error::JobNotFound(id) if id == job.id));
    }

    #[tokio::test]
    async fn test_update_missing() {
        let store = InMemoryJobStore::new();
        assert!(store.update(&job("u1")).await.is_err());
    }
}
