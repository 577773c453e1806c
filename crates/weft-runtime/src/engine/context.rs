//! Per-run processing context.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::{Map, Value};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use super::TRACING_TARGET;
use crate::capability::{AssetStorage, Capabilities, NodeCache, PredictionClient};
use crate::error::ContextError;
use crate::graph::NodeId;
use crate::job::JobId;
use crate::message::Message;

/// Key of a recorded result.
type ResultKey = (NodeId, String);

/// FIFO message queue shared by a run and all of its scope contexts.
struct MessageChannel {
    tx: mpsc::UnboundedSender<Message>,
    rx: Mutex<mpsc::UnboundedReceiver<Message>>,
    pending: AtomicUsize,
}

impl MessageChannel {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            pending: AtomicUsize::new(0),
        }
    }

    fn received(&self, message: Option<Message>) -> Option<Message> {
        if message.is_some() {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
        message
    }
}

/// Mutable state of one run.
///
/// Holds the write-once results table, the message channel, the injected
/// capabilities and the cancellation token. Scope bodies run in a
/// [`child`](Self::child) context that shares everything but the results.
pub struct ProcessingContext {
    job_id: JobId,
    results: RwLock<HashMap<ResultKey, Value>>,
    channel: Arc<MessageChannel>,
    capabilities: Capabilities,
    cancellation: CancellationToken,
}

impl ProcessingContext {
    /// Creates a context without capabilities.
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            results: RwLock::new(HashMap::new()),
            channel: Arc::new(MessageChannel::new()),
            capabilities: Capabilities::default(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Sets the capabilities available to node bodies.
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Sets the cancellation token of the run.
    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Creates a scope context sharing the channel, capabilities and
    /// cancellation, with an empty results table.
    pub fn child(&self) -> Self {
        Self {
            job_id: self.job_id,
            results: RwLock::new(HashMap::new()),
            channel: Arc::clone(&self.channel),
            capabilities: self.capabilities.clone(),
            cancellation: self.cancellation.clone(),
        }
    }

    /// Returns the job ID.
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Returns a recorded result.
    pub fn get_result(&self, node_id: &NodeId, slot: &str) -> Option<Value> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        results.get(&(node_id.clone(), slot.to_owned())).cloned()
    }

    /// Records a result. Each key may be written once per run.
    pub fn set_result(
        &self,
        node_id: NodeId,
        slot: impl Into<String>,
        value: Value,
    ) -> Result<(), ContextError> {
        let slot = slot.into();
        let mut results = self.results.write().unwrap_or_else(PoisonError::into_inner);
        let key = (node_id, slot);
        if results.contains_key(&key) {
            let (node_id, slot) = key;
            return Err(ContextError::DuplicateResult { node_id, slot });
        }
        results.insert(key, value);
        Ok(())
    }

    /// Returns all recorded outputs of a node, keyed by slot.
    pub fn node_results(&self, node_id: &NodeId) -> Map<String, Value> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        results
            .iter()
            .filter(|((id, _), _)| id == node_id)
            .map(|((_, slot), value)| (slot.clone(), value.clone()))
            .collect()
    }

    /// Returns a snapshot of the results table.
    pub fn results(&self) -> HashMap<(NodeId, String), Value> {
        self.results
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Appends a message to the channel. Never blocks.
    pub fn post_message(&self, message: Message) {
        self.channel.pending.fetch_add(1, Ordering::AcqRel);
        if self.channel.tx.send(message).is_err() {
            self.channel.pending.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!(target: TRACING_TARGET, job_id = %self.job_id, "Message channel closed");
        }
    }

    /// Returns whether messages are waiting to be popped.
    pub fn has_messages(&self) -> bool {
        self.channel.pending.load(Ordering::Acquire) > 0
    }

    /// Pops the next message, blocking the current thread until one arrives.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context; use
    /// [`pop_message_async`](Self::pop_message_async) there.
    pub fn pop_message(&self) -> Option<Message> {
        let message = self.channel.rx.blocking_lock().blocking_recv();
        self.channel.received(message)
    }

    /// Pops the next message, suspending until one arrives.
    ///
    /// Cancel-safe: dropping the future never loses a message.
    pub async fn pop_message_async(&self) -> Option<Message> {
        let message = self.channel.rx.lock().await.recv().await;
        self.channel.received(message)
    }

    /// Pops the next message if one is immediately available.
    pub fn try_pop_message(&self) -> Option<Message> {
        let mut rx = self.channel.rx.try_lock().ok()?;
        let message = rx.try_recv().ok();
        self.channel.received(message)
    }

    /// Pops every message that is immediately available.
    pub fn drain_messages(&self) -> Vec<Message> {
        std::iter::from_fn(|| self.try_pop_message()).collect()
    }

    /// Returns the injected capabilities.
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Returns the asset storage capability.
    pub fn assets(&self) -> Result<&dyn AssetStorage, ContextError> {
        self.capabilities
            .assets()
            .ok_or(ContextError::MissingCapability("assets"))
    }

    /// Returns the prediction capability.
    pub fn predictions(&self) -> Result<&dyn PredictionClient, ContextError> {
        self.capabilities
            .predictions()
            .ok_or(ContextError::MissingCapability("predictions"))
    }

    /// Returns the node cache capability.
    pub fn cache(&self) -> Result<&dyn NodeCache, ContextError> {
        self.capabilities
            .cache()
            .ok_or(ContextError::MissingCapability("cache"))
    }

    /// Returns the cancellation token of the run.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancels the run.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Returns whether the run has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

impl fmt::Debug for ProcessingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingContext")
            .field("job_id", &self.job_id)
            .field("pending_messages", &self.channel.pending.load(Ordering::Relaxed))
            .field("capabilities", &self.capabilities)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_results_are_write_once() {
        let ctx = ProcessingContext::new(JobId::new());
        let node = NodeId::from("a");
        ctx.set_result(node.clone(), "output", json!(1)).expect("first write failed");

        let error = ctx
            .set_result(node.clone(), "output", json!(2))
            .expect_err("second write accepted");
        assert!(matches!(error, ContextError::DuplicateResult { .. }));
        assert_eq!(ctx.get_result(&node, "output"), Some(json!(1)));
        assert_eq!(ctx.get_result(&node, "other"), None);
        assert_eq!(ctx.node_results(&node).len(), 1);
    }

    #[test]
    fn test_child_has_private_results() {
        let ctx = ProcessingContext::new(JobId::new());
        let child = ctx.child();
        child
            .set_result(NodeId::from("a"), "output", json!(1))
            .expect("write failed");
        assert!(ctx.results().is_empty());

        child.post_message(Message::job_update(ctx.job_id(), crate::job::JobStatus::Running));
        assert!(ctx.has_messages());

        ctx.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_messages_are_fifo() {
        let ctx = ProcessingContext::new(JobId::new());
        assert!(!ctx.has_messages());
        for i in 0..3 {
            ctx.post_message(Message::NodeProgress {
                node_id: NodeId::from("n"),
                progress: i,
                total: 3,
            });
        }
        assert!(ctx.has_messages());

        let first = ctx.pop_message_async().await;
        assert!(matches!(first, Some(Message::NodeProgress { progress: 0, .. })));
        let rest = ctx.drain_messages();
        assert_eq!(rest.len(), 2);
        assert!(matches!(rest[1], Message::NodeProgress { progress: 2, .. }));
        assert!(!ctx.has_messages());
    }

    #[test]
    fn test_blocking_pop_outside_runtime() {
        let ctx = ProcessingContext::new(JobId::new());
        ctx.post_message(Message::job_update(ctx.job_id(), crate::job::JobStatus::Completed));
        let message = ctx.pop_message().expect("message missing");
        assert!(message.is_terminal());
        assert!(!ctx.has_messages());
    }

    #[test]
    fn test_missing_capabilities() {
        let ctx = ProcessingContext::new(JobId::new());
        assert!(matches!(
            ctx.predictions().err(),
            Some(ContextError::MissingCapability("predictions"))
        ));
        let ctx = ctx.with_capabilities(Capabilities::in_memory());
        assert!(ctx.assets().is_ok());
        assert!(ctx.cache().is_ok());
    }
}
