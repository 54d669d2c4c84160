//! Audio stream session management.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::caps::StreamCaps;
use crate::error::AudioStreamError;
use crate::frame::EncodedPacket;

/// Statistics about a running stream.
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Total frames pulled from the decoder.
    pub frames_decoded: u64,
    /// Total packets handed to the output path.
    pub packets_emitted: u64,
    /// Frames processed but producing no packet (resampler failures).
    pub frames_dropped: u64,
    /// Frames discarded to queue overflow (drop policy only).
    pub queue_overflows: u64,
    /// Sample-rate compensation requests issued so far.
    pub compensations: u64,
    /// Most recent clock skew (`pts - clock`) in seconds.
    pub clock_skew: f64,
}

/// Internal state shared between Session and background tasks.
pub(crate) struct SessionState {
    pub running: AtomicBool,
    pub frames_decoded: AtomicU64,
    pub packets_emitted: AtomicU64,
    pub frames_dropped: AtomicU64,
    pub queue_overflows: AtomicU64,
    pub compensations: AtomicU64,
    /// Clock skew in seconds, stored as `f64::to_bits`.
    pub clock_skew_bits: AtomicU64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            frames_decoded: AtomicU64::new(0),
            packets_emitted: AtomicU64::new(0),
            frames_dropped: AtomicU64::new(0),
            queue_overflows: AtomicU64::new(0),
            compensations: AtomicU64::new(0),
            clock_skew_bits: AtomicU64::new(0f64.to_bits()),
        }
    }
}

/// Handle to a running audio stream.
///
/// The `Session` is returned by [`AudioStreamBuilder::start()`]. Encoded
/// packets are fed in via [`push_packet()`](Session::push_packet); the
/// pipeline decodes, synchronizes, and converts them in background tasks
/// until [`finish()`](Session::finish) marks the end of the stream or
/// [`stop()`](Session::stop) tears the pipeline down.
///
/// # Example
///
/// ```ignore
/// let session = AudioStream::builder()
///     .decoder(Box::new(my_decoder))
///     .clock(clock.clone())
///     .add_sink(ChannelSink::new(tx))
///     .start()
///     .await?;
///
/// for packet in demuxer_packets {
///     session.push_packet(packet).await?;
/// }
/// session.finish().await?;
/// session.stop().await?;
/// ```
///
/// [`AudioStreamBuilder::start()`]: crate::AudioStreamBuilder::start
pub struct Session {
    state: Arc<SessionState>,
    caps: StreamCaps,
    input_tx: mpsc::Sender<Option<EncodedPacket>>,
    ingest_handle: Option<JoinHandle<()>>,
    process_handle: Option<JoinHandle<()>>,
    router_handle: Option<JoinHandle<()>>,
}

impl Session {
    /// Creates a new session over the spawned pipeline tasks.
    pub(crate) fn new(
        state: Arc<SessionState>,
        caps: StreamCaps,
        input_tx: mpsc::Sender<Option<EncodedPacket>>,
        ingest_handle: JoinHandle<()>,
        process_handle: JoinHandle<()>,
        router_handle: JoinHandle<()>,
    ) -> Self {
        Self {
            state,
            caps,
            input_tx,
            ingest_handle: Some(ingest_handle),
            process_handle: Some(process_handle),
            router_handle: Some(router_handle),
        }
    }

    /// Negotiated output caps for this stream.
    pub fn caps(&self) -> StreamCaps {
        self.caps
    }

    /// Returns `true` while the pipeline is running.
    pub fn is_running(&self) -> bool {
        self.state.running.load(Ordering::SeqCst)
    }

    /// Returns current session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            frames_decoded: self.state.frames_decoded.load(Ordering::SeqCst),
            packets_emitted: self.state.packets_emitted.load(Ordering::SeqCst),
            frames_dropped: self.state.frames_dropped.load(Ordering::SeqCst),
            queue_overflows: self.state.queue_overflows.load(Ordering::SeqCst),
            compensations: self.state.compensations.load(Ordering::SeqCst),
            clock_skew: self.clock_skew(),
        }
    }

    /// Most recent clock skew (`pts - clock`) in seconds.
    ///
    /// Diagnostic value; updated on every processed frame.
    pub fn clock_skew(&self) -> f64 {
        f64::from_bits(self.state.clock_skew_bits.load(Ordering::SeqCst))
    }

    /// Feeds one encoded packet into the pipeline.
    ///
    /// Applies back-pressure when the pipeline is busy.
    pub async fn push_packet(&self, packet: EncodedPacket) -> Result<(), AudioStreamError> {
        self.input_tx
            .send(Some(packet))
            .await
            .map_err(|_| AudioStreamError::InputClosed)
    }

    /// Marks the end of the stream.
    ///
    /// The end-of-stream marker flows through the pipeline behind any
    /// packets still in flight; sinks are stopped once it arrives.
    pub async fn finish(&self) -> Result<(), AudioStreamError> {
        self.input_tx
            .send(None)
            .await
            .map_err(|_| AudioStreamError::InputClosed)
    }

    /// Gracefully stops the stream.
    ///
    /// This will:
    /// 1. Send the end-of-stream marker (if not already sent)
    /// 2. Wait for in-flight frames to drain to sinks
    /// 3. Call `on_stop()` on all sinks
    /// 4. Wait for background tasks to complete
    pub async fn stop(mut self) -> Result<(), AudioStreamError> {
        self.stop_internal().await
    }

    async fn stop_internal(&mut self) -> Result<(), AudioStreamError> {
        // A second end marker after finish() is harmless: the ingest task
        // has already exited and the send simply fails
        let _ = self.input_tx.send(None).await;

        if let Some(handle) = self.ingest_handle.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.process_handle.take() {
            let _ = handle.await;
        }
        if let Some(handle) = self.router_handle.take() {
            let _ = handle.await;
        }

        self.state.running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.state.running.load(Ordering::SeqCst) {
            // Session dropped without explicit stop() - trigger background
            // shutdown via the end marker
            self.state.running.store(false, Ordering::SeqCst);
            let _ = self.input_tx.try_send(None);
        }
    }
}
