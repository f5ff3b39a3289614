//! Progress events and the sinks that receive them
//!
//! Emitting never blocks the pipeline: channel sinks use `try_send` and drop
//! events when the consumer falls behind.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

use crate::domain::model::PipelineStage;

/// One coarse progress update
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    /// Variant name when the run belongs to a batch
    pub variant: Option<String>,
    pub stage: PipelineStage,
    /// 0-100, non-decreasing within a run
    pub percent: u8,
    pub message: String,
}

impl ProgressEvent {
    /// Event at the stage's fixed checkpoint
    pub fn for_stage(stage: PipelineStage) -> Self {
        Self {
            variant: None,
            stage,
            percent: stage.checkpoint(),
            message: stage.message().to_string(),
        }
    }
}

/// Receiver of progress events
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn emit(&self, event: ProgressEvent) {
        self(event)
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Forwards events into a bounded channel, dropping them when it is full
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    sender: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(sender: mpsc::Sender<ProgressEvent>) -> Self {
        Self { sender }
    }

    /// Sink plus the receiving half of a channel of `capacity` events
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self::new(sender), receiver)
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        if let Err(err) = self.sender.try_send(event) {
            debug!("Dropping progress event: {}", err);
        }
    }
}

/// Tags every event with a variant name before forwarding it
pub struct VariantProgressSink {
    variant: String,
    inner: Arc<dyn ProgressSink>,
}

impl VariantProgressSink {
    pub fn new(variant: impl Into<String>, inner: Arc<dyn ProgressSink>) -> Self {
        Self {
            variant: variant.into(),
            inner,
        }
    }
}

impl ProgressSink for VariantProgressSink {
    fn emit(&self, mut event: ProgressEvent) {
        event.variant = Some(self.variant.clone());
        self.inner.emit(event);
    }
}
