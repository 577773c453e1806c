//! Job records, statuses and persistence.

mod id;
mod job;
mod request;
mod status;
mod store;

pub use id::JobId;
pub use job::Job;
pub use request::RunRequest;
pub use status::JobStatus;
pub use store::{InMemoryJobStore, JobStore};
