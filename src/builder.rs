//! Builder pattern for `AudioStream`.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::caps;
use crate::clock::GlobalClock;
use crate::config::StreamConfig;
use crate::decode::AudioDecoder;
use crate::error::AudioStreamError;
use crate::event::EventCallback;
use crate::frame::TimeBase;
use crate::pipeline::{IngestStage, ProcessStage, Router};
use crate::resample::{LinearEngine, ResampleEngine};
use crate::session::{Session, SessionState};
use crate::sink::Sink;
use crate::stream::StreamProcessor;

/// Channel capacity for encoded packets flowing into the ingest task.
/// Small on purpose: back-pressure should reach the caller quickly.
const INPUT_CHANNEL_CAPACITY: usize = 16;

/// Channel capacity for finished packets flowing to the router.
const PACKET_CHANNEL_CAPACITY: usize = 100;

/// Channel capacity for router commands.
/// Only need 1 since commands are rare (just Stop).
const COMMAND_CHANNEL_CAPACITY: usize = 1;

/// Entry point for building audio streams.
///
/// Use [`AudioStream::builder()`] to configure and start a pipeline.
pub struct AudioStream;

impl AudioStream {
    /// Creates a new builder with default settings.
    pub fn builder() -> AudioStreamBuilder {
        AudioStreamBuilder::new()
    }
}

/// Builder for configuring and starting the audio branch of a stream
/// pipeline.
///
/// # Example
///
/// ```ignore
/// use av_audio::{AudioStream, ChannelSink, GlobalClock, OutputPacket, TimeBase};
/// use tokio::sync::mpsc;
///
/// let clock = GlobalClock::new(); // shared with the video branch
/// let (tx, mut rx) = mpsc::channel::<OutputPacket>(100);
///
/// let session = AudioStream::builder()
///     .decoder(Box::new(my_decoder))
///     .clock(clock.clone())
///     .time_base(TimeBase::new(1, 48000))
///     .add_sink(ChannelSink::new(tx))
///     .on_event(|e| tracing::warn!(?e, "stream event"))
///     .start()
///     .await?;
///
/// // Feed demuxed packets, then receive synchronized output:
/// // session.push_packet(packet).await?;
/// // while let Some(packet) = rx.recv().await { ... }
/// ```
#[must_use]
pub struct AudioStreamBuilder {
    decoder: Option<Box<dyn AudioDecoder>>,
    engine: Option<Box<dyn ResampleEngine>>,
    clock: Option<GlobalClock>,
    sinks: Vec<Arc<dyn Sink>>,
    event_callback: Option<EventCallback>,
    config: StreamConfig,
    time_base: TimeBase,
    stream_index: usize,
    stream_id: i64,
}

impl Default for AudioStreamBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioStreamBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            decoder: None,
            engine: None,
            clock: None,
            sinks: Vec::new(),
            event_callback: None,
            config: StreamConfig::default(),
            time_base: TimeBase::new(1, 48000),
            stream_index: 0,
            stream_id: 0,
        }
    }

    /// Sets the decoder the pipeline pulls frames from. Required.
    pub fn decoder(mut self, decoder: Box<dyn AudioDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Sets the resample engine.
    ///
    /// Default: the built-in [`LinearEngine`].
    pub fn engine(mut self, engine: Box<dyn ResampleEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Sets the shared presentation clock.
    ///
    /// Pass a clone of the clock the sibling video branch uses; a fresh
    /// clock starting at zero is created otherwise.
    pub fn clock(mut self, clock: GlobalClock) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Adds a sink to receive finished packets.
    pub fn add_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Sets the stream configuration (queue depth/policy, sink retries).
    pub fn config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the stream's time base.
    ///
    /// Default: 1/48000, matching a typical 48 kHz audio track.
    pub fn time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    /// Sets the stream's container index, carried on every packet.
    pub fn stream_index(mut self, index: usize) -> Self {
        self.stream_index = index;
        self
    }

    /// Sets the stream's container id, carried on every packet.
    pub fn stream_id(mut self, id: i64) -> Self {
        self.stream_id = id;
        self
    }

    /// Registers a callback for runtime events.
    pub fn on_event<F>(mut self, callback: F) -> Self
    where
        F: Fn(crate::event::StreamEvent) + Send + Sync + 'static,
    {
        self.event_callback = Some(Arc::new(callback));
        self
    }

    /// Starts the pipeline and returns a [`Session`] handle.
    ///
    /// # Errors
    ///
    /// Fails when no decoder or no sinks were configured, or when a sink's
    /// `on_start` fails. Nothing after a successful start is fatal to the
    /// stream.
    pub async fn start(self) -> Result<Session, AudioStreamError> {
        let decoder = self.decoder.ok_or(AudioStreamError::NoDecoderConfigured)?;
        if self.sinks.is_empty() {
            return Err(AudioStreamError::NoSinksConfigured);
        }

        let signal = decoder.signal_params();
        let stream_caps = caps::negotiate(&signal);
        let clock = self.clock.unwrap_or_default();
        let engine = self
            .engine
            .unwrap_or_else(|| Box::new(LinearEngine::new()));

        tracing::info!(
            ?stream_caps,
            queue_depth = self.config.queue_depth,
            policy = ?self.config.queue_policy,
            "starting audio stream pipeline"
        );

        let mut processor =
            StreamProcessor::with_engine(signal, clock, self.time_base, engine)
                .with_stream_identity(self.stream_index, self.stream_id);
        if let Some(ref callback) = self.event_callback {
            processor = processor.with_event_callback(callback.clone());
        }

        let mut router = Router::new(self.sinks, self.config.clone());
        if let Some(ref callback) = self.event_callback {
            router = router.with_event_callback(callback.clone());
        }
        router.start_sinks().await?;

        let state = Arc::new(SessionState::new());
        let (input_tx, input_rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let (frame_tx, frame_rx) = mpsc::channel(self.config.queue_depth.max(1));
        let (packet_tx, packet_rx) = mpsc::channel(PACKET_CHANNEL_CAPACITY);
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let ingest = IngestStage::new(
            decoder,
            input_rx,
            frame_tx,
            self.config.queue_policy,
            state.clone(),
            self.event_callback.clone(),
        );
        let process = ProcessStage::new(
            processor,
            frame_rx,
            packet_tx,
            cmd_tx,
            state.clone(),
            self.event_callback.clone(),
        );

        let ingest_handle = tokio::spawn(ingest.run());
        let process_handle = tokio::spawn(process.run());
        let router_handle = tokio::spawn(router.run(packet_rx, cmd_rx));

        Ok(Session::new(
            state,
            stream_caps,
            input_tx,
            ingest_handle,
            process_handle,
            router_handle,
        ))
    }
}
