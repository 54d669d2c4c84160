//! Per-frame stream processing: timestamp repair, sync, conversion, and
//! packet assembly.
//!
//! [`StreamProcessor`] is the synchronous core of the crate. The async
//! pipeline drives it from a task, but it can equally be driven directly
//! for a single-threaded, queue-less setup:
//!
//! ```
//! use av_audio::{
//!     CodecChannelLayout, CodecSampleFormat, EncodedPacket, GlobalClock, MockDecoder,
//!     ProcessorOutput, SignalParams, StreamProcessor, TimeBase,
//! };
//!
//! let params = SignalParams {
//!     format: CodecSampleFormat::S16,
//!     layout: CodecChannelLayout::Mono,
//!     rate: 48000,
//! };
//! let mut decoder = MockDecoder::new(params);
//! decoder.queue_packet_frames(vec![decoder.silence_frame(Some(0), 1024)]);
//!
//! let mut processor = StreamProcessor::new(params, GlobalClock::new(), TimeBase::new(1, 48000));
//! let outputs = processor.process_packet(&mut decoder, Some(&EncodedPacket::new(vec![0u8; 16])));
//! assert!(matches!(outputs[0], ProcessorOutput::Packet(_)));
//! ```

use std::sync::Arc;

use crate::caps::{self, StreamCaps};
use crate::clock::GlobalClock;
use crate::decode::{self, AudioDecoder, SignalParams};
use crate::event::{EventCallback, StreamEvent};
use crate::frame::{DecodedFrame, EncodedPacket, OutputPacket, TimeBase};
use crate::resample::{LinearEngine, ResampleEngine, ResampleHandle, ResampleSpec};
use crate::sync::{SamplePlan, SyncEstimator};

/// One unit of processor output.
#[derive(Debug, Clone)]
pub enum ProcessorOutput {
    /// A finished packet ready for the output path.
    Packet(OutputPacket),
    /// The end-of-stream marker; no further output follows.
    EndOfStream,
}

/// The audio branch's per-stream processing core.
///
/// Consumes decoded frames strictly in arrival order and produces
/// timestamp-synchronized packets. Owns the sync estimator state and the
/// configured resample handle; both live exactly as long as the processor.
pub struct StreamProcessor {
    signal: SignalParams,
    clock: GlobalClock,
    sync: SyncEstimator,
    engine: Box<dyn ResampleEngine>,
    handle: Option<Box<dyn ResampleHandle>>,
    time_base: TimeBase,
    stream_index: usize,
    stream_id: i64,
    /// Next expected pts in ticks, used to repair frames without one.
    next_pts: i64,
    /// Most recent clock skew in seconds, for diagnostics/UI.
    last_skew: f64,
    /// Compensation requests issued so far.
    compensations: u64,
    event_callback: Option<EventCallback>,
}

impl StreamProcessor {
    /// Creates a processor for a stream with the given declared signal
    /// parameters, shared clock, and time base.
    ///
    /// Uses the built-in [`LinearEngine`] for resampling; see
    /// [`with_engine`](Self::with_engine) to supply another engine.
    pub fn new(signal: SignalParams, clock: GlobalClock, time_base: TimeBase) -> Self {
        Self::with_engine(signal, clock, time_base, Box::new(LinearEngine::new()))
    }

    /// Creates a processor using a custom resample engine.
    pub fn with_engine(
        signal: SignalParams,
        clock: GlobalClock,
        time_base: TimeBase,
        engine: Box<dyn ResampleEngine>,
    ) -> Self {
        Self {
            signal,
            clock,
            sync: SyncEstimator::new(),
            engine,
            handle: None,
            time_base,
            stream_index: 0,
            stream_id: 0,
            next_pts: 0,
            last_skew: 0.0,
            compensations: 0,
            event_callback: None,
        }
    }

    /// Sets the stream's container index and id, carried on every packet.
    pub fn with_stream_identity(mut self, index: usize, id: i64) -> Self {
        self.stream_index = index;
        self.stream_id = id;
        self
    }

    /// Sets the event callback for drop/resync notifications.
    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Negotiated output caps, derived from the decoder's declared
    /// parameters and independent of any specific frame.
    pub fn caps(&self) -> StreamCaps {
        caps::negotiate(&self.signal)
    }

    /// Most recent clock skew (`pts - clock`) in seconds.
    ///
    /// Updated on every processed frame, whatever branch the sync estimator
    /// took. Purely diagnostic; nothing in the pipeline consumes it.
    pub fn clock_skew(&self) -> f64 {
        self.last_skew
    }

    /// Compensation requests issued so far.
    pub fn compensations(&self) -> u64 {
        self.compensations
    }

    /// Runs one encoded packet (or the end marker) through the full path.
    ///
    /// `None` is the end-of-stream marker: it is forwarded directly to the
    /// output path without touching the decoder. Otherwise the packet is
    /// submitted - a rejected submission drops it silently - and every frame
    /// the decoder yields for it is processed in order.
    pub fn process_packet(
        &mut self,
        decoder: &mut dyn AudioDecoder,
        packet: Option<&EncodedPacket>,
    ) -> Vec<ProcessorOutput> {
        let Some(packet) = packet else {
            return vec![ProcessorOutput::EndOfStream];
        };

        if let Err(e) = decoder.submit(packet) {
            tracing::trace!(error = %e, "packet submission rejected, dropping");
            return Vec::new();
        }

        decode::drain(decoder)
            .iter()
            .filter_map(|frame| self.process_frame(frame))
            .map(ProcessorOutput::Packet)
            .collect()
    }

    /// Processes one decoded frame into at most one packet.
    ///
    /// Repairs a missing timestamp from the running sample position, then
    /// converts. The tracked next-pts advances whether or not conversion
    /// succeeded, keeping later repaired timestamps continuous.
    pub fn process_frame(&mut self, frame: &DecodedFrame) -> Option<OutputPacket> {
        let pts = frame.pts.unwrap_or(self.next_pts);
        let packet = self.convert(frame, pts);
        self.next_pts = pts + frame.sample_count as i64;
        packet
    }

    /// Synchronizes, converts, and assembles one frame.
    fn convert(&mut self, frame: &DecodedFrame, pts: i64) -> Option<OutputPacket> {
        let pts_seconds = pts as f64 * self.time_base.value();
        let eval = self
            .sync
            .evaluate(pts_seconds, frame.sample_count, frame.sample_rate, &self.clock);
        self.last_skew = eval.diff;

        if eval.resynced {
            tracing::debug!(pts_seconds, "desync too large, clock hard-set");
            self.emit_event(StreamEvent::ClockResynced { pts_seconds });
        }

        // Resolve the output side and (re)configure the resampler when the
        // conversion changes or on first use
        let out_format = caps::output_format(frame.format);
        let out_layout = caps::output_layout(frame.layout);
        let spec = ResampleSpec {
            in_format: frame.format,
            in_layout: frame.layout,
            in_rate: frame.sample_rate,
            out_format,
            out_layout,
            out_rate: frame.sample_rate,
        };

        if self.handle.as_ref().map(|h| *h.spec() != spec).unwrap_or(true) {
            let result = match self.handle.take() {
                Some(old) => self.engine.reconfigure(old, &spec),
                None => self.engine.configure(&spec),
            };
            match result {
                Ok(handle) => {
                    tracing::debug!(?spec, "resampler configured");
                    self.handle = Some(handle);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "resampler configuration failed");
                    self.drop_frame(format!("resampler configuration failed: {e}"));
                    return None;
                }
            }
        }

        let handle = self.handle.as_mut()?;

        let wanted = match eval.plan {
            SamplePlan::Keep => frame.sample_count,
            SamplePlan::Adjust { wanted } => {
                let delta = wanted as i64 - frame.sample_count as i64;
                if let Err(e) = handle.set_compensation(delta, wanted as i64) {
                    tracing::warn!(error = %e, delta, "compensation request rejected");
                    self.drop_frame(format!("compensation rejected: {e}"));
                    return None;
                }
                self.compensations += 1;
                wanted
            }
        };

        let handle = self.handle.as_mut()?;
        let data = match handle.convert(frame, wanted) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(error = %e, "error converting audio");
                self.drop_frame(format!("conversion failed: {e}"));
                return None;
            }
        };

        let caps = StreamCaps {
            format: out_format,
            bits_per_sample: out_format.bits_per_sample(),
            channels: out_layout.channels(),
            rate: frame.sample_rate,
            layout: out_layout,
            align: false,
        };

        Some(OutputPacket {
            caps,
            data: Arc::new(data),
            pts,
            time_base: self.time_base,
            stream_index: self.stream_index,
            stream_id: self.stream_id,
        })
    }

    fn drop_frame(&self, reason: String) {
        self.emit_event(StreamEvent::FrameDropped { reason });
    }

    fn emit_event(&self, event: StreamEvent) {
        if let Some(ref callback) = self.event_callback {
            callback(event);
        }
    }
}
