//! Sink trait and implementations for packet destinations.
//!
//! A [`Sink`] is any destination that can receive finished audio packets:
//! a playback queue, an encoder, a UI meter. The crate provides
//! [`ChannelSink`], which forwards packets to a tokio mpsc channel; custom
//! destinations implement the trait.

mod channel;

pub use channel::ChannelSink;

use crate::error::SinkError;
use crate::frame::OutputPacket;
use async_trait::async_trait;

/// A destination for finished audio packets.
///
/// Sinks receive packets from the router and process them (enqueue for
/// playback, feed an encoder, forward to a channel, etc.).
///
/// # Implementation Notes
///
/// - Methods take `&self` - use interior mutability (`Mutex`, `RwLock`) if needed
/// - All methods are async and run on the tokio runtime
/// - `on_start` is called before any packet flows; open resources here
/// - `on_stop` is called during graceful shutdown and at end of stream
/// - `write` may be called again after an error (retry); ensure idempotence
///
/// # Example
///
/// ```
/// use av_audio::{OutputPacket, Sink, SinkError};
/// use async_trait::async_trait;
///
/// struct PrintSink {
///     name: String,
/// }
///
/// #[async_trait]
/// impl Sink for PrintSink {
///     fn name(&self) -> &str {
///         &self.name
///     }
///
///     async fn write(&self, packet: &OutputPacket) -> Result<(), SinkError> {
///         println!("Received {} samples at pts {}", packet.sample_count(), packet.pts);
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Sink: Send + Sync {
    /// Human-readable name for logging and error messages.
    fn name(&self) -> &str;

    /// Called once before streaming begins.
    ///
    /// Use this to open resources or establish connections. Errors here are
    /// fatal and will prevent the stream from starting.
    ///
    /// Default implementation does nothing.
    async fn on_start(&self) -> Result<(), SinkError> {
        Ok(())
    }

    /// Write a finished packet.
    ///
    /// Errors are recoverable - the router will emit a
    /// [`StreamEvent::SinkError`] and retry based on [`StreamConfig`]
    /// settings.
    ///
    /// [`StreamEvent::SinkError`]: crate::StreamEvent::SinkError
    /// [`StreamConfig`]: crate::StreamConfig
    async fn write(&self, packet: &OutputPacket) -> Result<(), SinkError>;

    /// Called during graceful shutdown and after the end-of-stream marker.
    ///
    /// Use this to flush buffers or clean up resources. This is called even
    /// if errors occurred during streaming.
    ///
    /// Default implementation does nothing.
    async fn on_stop(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
