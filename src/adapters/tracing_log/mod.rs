// Tracing log adapter - Progress events routed into structured logs

use tracing::info;

use crate::engine::progress::{ProgressEvent, ProgressSink};

/// Logs every progress event at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgressSink;

impl TracingProgressSink {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressSink for TracingProgressSink {
    fn emit(&self, event: ProgressEvent) {
        match &event.variant {
            Some(variant) => info!(
                variant = %variant,
                stage = %event.stage,
                percent = event.percent,
                "{}",
                event.message
            ),
            None => info!(
                stage = %event.stage,
                percent = event.percent,
                "{}",
                event.message
            ),
        }
    }
}
