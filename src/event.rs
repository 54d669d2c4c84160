//! Runtime events for monitoring stream health.
//!
//! Events are non-fatal notifications about stream behavior. The stream
//! continues running after events are emitted - they're for logging/metrics,
//! not error handling.

use std::sync::Arc;

/// Runtime events emitted while an audio stream is running.
///
/// These are informational events, not errors. The stream continues
/// running after any event is emitted. Use the [`EventCallback`] to
/// log these or update metrics.
///
/// # Example
///
/// ```
/// use av_audio::StreamEvent;
///
/// fn handle_event(event: StreamEvent) {
///     match event {
///         StreamEvent::FrameProduced { pts } => {
///             println!("packet at pts {pts}");
///         }
///         StreamEvent::FrameDropped { reason } => {
///             eprintln!("dropped a frame: {reason}");
///         }
///         StreamEvent::QueueOverflow { dropped_frames } => {
///             eprintln!("queue overflow, {dropped_frames} frames dropped so far");
///         }
///         StreamEvent::ClockResynced { pts_seconds } => {
///             eprintln!("clock hard-set to {pts_seconds}s");
///         }
///         StreamEvent::SinkError { sink_name, error } => {
///             eprintln!("sink '{sink_name}' error: {error}");
///         }
///         StreamEvent::EndOfStream => {
///             println!("stream finished");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A converted packet was handed to the output path.
    FrameProduced {
        /// Presentation timestamp of the packet, in time-base ticks.
        pts: i64,
    },

    /// A decoded frame produced no output packet.
    ///
    /// Raised when resampler configuration fails, a compensation request is
    /// rejected, or conversion fails. The stream continues with the next
    /// frame; the missing packet is the only other observable effect.
    FrameDropped {
        /// Why the frame was dropped.
        reason: String,
    },

    /// The bounded frame queue was full and a frame was discarded.
    ///
    /// Only emitted under [`QueuePolicy::DropNewest`]; with
    /// [`QueuePolicy::Block`] the decoder is back-pressured instead.
    ///
    /// [`QueuePolicy::DropNewest`]: crate::QueuePolicy::DropNewest
    /// [`QueuePolicy::Block`]: crate::QueuePolicy::Block
    QueueOverflow {
        /// Total frames dropped to overflow so far in this session.
        dropped_frames: u64,
    },

    /// The shared clock was hard-set to a frame's presentation time.
    ///
    /// Happens when the measured audio/video desync reaches the no-sync
    /// threshold - typically after a seek or on broken initial timestamps.
    ClockResynced {
        /// The presentation time written to the clock, in seconds.
        pts_seconds: f64,
    },

    /// A sink encountered an error during write.
    ///
    /// The router will retry according to [`StreamConfig`](crate::StreamConfig)
    /// settings.
    SinkError {
        /// Name of the sink that errored.
        sink_name: String,
        /// Description of the error.
        error: String,
    },

    /// The end-of-stream marker passed through the pipeline.
    EndOfStream,
}

/// Callback type for receiving runtime events.
///
/// Register an event callback via [`AudioStreamBuilder::on_event()`] to
/// receive notifications about dropped frames, clock resyncs, and sink
/// errors.
///
/// [`AudioStreamBuilder::on_event()`]: crate::AudioStreamBuilder::on_event
pub type EventCallback = Arc<dyn Fn(StreamEvent) + Send + Sync>;

/// Creates an [`EventCallback`] from a closure.
///
/// This is a convenience function for creating event callbacks without
/// manually wrapping in `Arc`.
///
/// # Example
///
/// ```
/// use av_audio::{event_callback, StreamEvent};
///
/// let callback = event_callback(|event| {
///     println!("Got event: {:?}", event);
/// });
/// ```
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(StreamEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}
