//! Runner configuration.

use derive_builder::Builder;
use tokio::sync::Semaphore;

/// Configuration for the workflow runner.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(
    name = "RunnerConfigBuilder",
    pattern = "owned",
    setter(into, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct RunnerConfig {
    /// Maximum number of leaf nodes executing at once; unbounded when `None`.
    #[builder(default, setter(strip_option))]
    pub max_concurrency: Option<usize>,

    /// Whether in-flight node bodies are dropped on cancellation instead of
    /// being left to observe the token themselves.
    #[builder(default)]
    pub abort_on_cancel: bool,

    /// Device passed to `move_to_device` for nodes that require a GPU.
    #[builder(default = "\"cpu\".to_owned()")]
    pub device: String,
}

impl RunnerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(0)) = self.max_concurrency {
            return Err("max_concurrency must be at least 1".into());
        }
        if let Some(Some(n)) = self.max_concurrency
            && n > Semaphore::MAX_PERMITS
        {
            return Err(format!("max_concurrency must be at most {}", Semaphore::MAX_PERMITS));
        }
        if self.device.as_deref().is_some_and(str::is_empty) {
            return Err("device must not be empty".into());
        }
        Ok(())
    }
}

impl RunnerConfig {
    /// Returns a builder for creating a runner configuration.
    pub fn builder() -> RunnerConfigBuilder {
        RunnerConfigBuilder::default()
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            abort_on_cancel: false,
            device: "cpu".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = RunnerConfig::builder().build().expect("build failed");
        assert_eq!(config, RunnerConfig::default());
    }

    #[test]
    fn test_builder_rejects_zero_concurrency() {
        assert!(RunnerConfig::builder().with_max_concurrency(0usize).build().is_err());
        let config = RunnerConfig::builder()
            .with_max_concurrency(2usize)
            .with_abort_on_cancel(true)
            .with_device("cuda:0")
            .build()
            .expect("build failed");
        assert_eq!(config.max_concurrency, Some(2));
        assert!(config.abort_on_cancel);
    }

    #[test]
    fn test_builder_rejects_oversized_concurrency() {
        let error = RunnerConfig::builder()
            .with_max_concurrency(usize::MAX)
            .build()
            .expect_err("oversized limit accepted");
        assert!(error.to_string().contains("max_concurrency must be at most"));

        let config = RunnerConfig::builder()
            .with_max_concurrency(Semaphore::MAX_PERMITS)
            .build()
            .expect("build failed");
        assert_eq!(config.max_concurrency, Some(Semaphore::MAX_PERMITS));
    }
}
