//! # av-audio
//!
//! **Note:** This crate is under active development. The API may change before 1.0.
//!
//! Timestamp-synchronized audio branch for A/V stream pipelines.
//!
//! `av-audio` consumes decoded audio frames and produces resampled packets
//! aligned to a presentation clock shared with a sibling video branch. Sync
//! is maintained by an exponentially-weighted drift estimator that nudges
//! playback speed through bounded sample-rate compensation.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use av_audio::{AudioStream, ChannelSink, GlobalClock, OutputPacket, TimeBase};
//! use tokio::sync::mpsc;
//!
//! let clock = GlobalClock::new(); // share a clone with the video branch
//! let (tx, mut rx) = mpsc::channel::<OutputPacket>(100);
//!
//! let session = AudioStream::builder()
//!     .decoder(Box::new(my_decoder))          // wraps your codec library
//!     .clock(clock.clone())
//!     .time_base(TimeBase::new(1, 48000))
//!     .add_sink(ChannelSink::new(tx))
//!     .on_event(|e| tracing::warn!(?e, "stream event"))
//!     .start()
//!     .await?;
//!
//! // Feed demuxed packets as they arrive
//! session.push_packet(packet).await?;
//!
//! // Consume synchronized, resampled packets
//! while let Some(packet) = rx.recv().await {
//!     // Hand to the playback device, an encoder, etc.
//! }
//!
//! session.finish().await?;
//! session.stop().await?;
//! ```
//!
//! ## Architecture
//!
//! The pipeline keeps decoding, processing, and delivery decoupled:
//!
//! - **Ingest task**: Submits encoded packets, drains the decoder
//! - **Frame queue**: Bounded (depth 9 by default) with an explicit
//!   block-vs-drop policy toward the decoder
//! - **Process task**: Timestamp repair → sync estimation → resample →
//!   packet assembly, strictly in arrival order
//! - **Router task**: Fans packets out to all sinks with retry
//!
//! No runtime failure is fatal to the stream: decode and resample errors
//! drop the affected unit of work and the pipeline keeps going.

// Audio code requires intentional numeric casts between sample formats
#![warn(missing_docs)]
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless
)]
// unwrap/expect allowed in tests only
#![allow(clippy::unwrap_used)]
// These doc lints are too strict for internal implementation details
#![allow(clippy::missing_panics_doc, clippy::missing_errors_doc)]

mod builder;
mod caps;
mod clock;
mod config;
pub mod decode;
mod error;
mod event;
pub mod format;
mod frame;
mod pipeline;
pub mod resample;
mod session;
mod sink;
mod stream;
mod sync;

pub use builder::{AudioStream, AudioStreamBuilder};
pub use caps::{
    negotiate, output_format, output_layout, ChannelLayout, CodecChannelLayout, CodecSampleFormat,
    SampleFormat, StreamCaps,
};
pub use clock::GlobalClock;
pub use config::{QueuePolicy, StreamConfig};
pub use decode::{AudioDecoder, MockDecoder, SignalParams};
pub use error::{AudioStreamError, DecodeError, ResampleError, SinkError};
pub use event::{event_callback, EventCallback, StreamEvent};
pub use frame::{DecodedFrame, EncodedPacket, OutputPacket, TimeBase};
pub use resample::{LinearEngine, ResampleEngine, ResampleHandle, ResampleSpec};
pub use session::{Session, SessionStats};
pub use sink::{ChannelSink, Sink};
pub use stream::{ProcessorOutput, StreamProcessor};
pub use sync::{SamplePlan, SyncEstimator, SyncEvaluation};
