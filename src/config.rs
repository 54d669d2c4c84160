//! Configuration types for audio streams.

use std::time::Duration;

/// What to do when the bounded frame queue is full.
///
/// The policy is an explicit configuration point: choose whether a slow
/// processing stage back-pressures the decoder or sheds load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePolicy {
    /// Wait for space, back-pressuring the decoder. No audio is lost.
    Block,
    /// Discard the newest frame and emit
    /// [`StreamEvent::QueueOverflow`](crate::StreamEvent::QueueOverflow).
    DropNewest,
}

/// Configuration for stream behavior.
///
/// Use [`StreamConfig::default()`] for sensible defaults, or customize as
/// needed.
///
/// # Example
///
/// ```
/// use av_audio::{QueuePolicy, StreamConfig};
///
/// let config = StreamConfig {
///     queue_policy: QueuePolicy::DropNewest,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Capacity of the decoded-frame queue between ingestion and
    /// processing, in frames.
    ///
    /// Default: 9
    pub queue_depth: usize,

    /// Behavior when the frame queue is full.
    ///
    /// Default: [`QueuePolicy::Block`] (back-pressure the decoder)
    pub queue_policy: QueuePolicy,

    /// Number of retry attempts for failed sink writes.
    ///
    /// Default: 3
    pub sink_retry_attempts: u32,

    /// Initial delay between sink retry attempts.
    ///
    /// Uses exponential backoff (delay doubles each attempt).
    /// Default: 100ms
    pub sink_retry_delay: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            queue_depth: 9,
            queue_policy: QueuePolicy::Block,
            sink_retry_attempts: 3,
            sink_retry_delay: Duration::from_millis(100),
        }
    }
}
