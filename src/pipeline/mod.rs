//! Async pipeline tasks around the synchronous processing core.
//!
//! The pipeline connects the decoder to the sinks through bounded channels:
//!
//! ```text
//! Session input → Ingest task → Frame queue (depth 9) → Process task → Router task → Sinks
//! ```
//!
//! - **Ingest**: Submits encoded packets and drains the decoder
//! - **Frame queue**: Bounded queue providing back-pressure toward the
//!   decoder (or load shedding, per [`QueuePolicy`](crate::QueuePolicy))
//! - **Process**: Runs the stream processor frame by frame
//! - **Router**: Fans finished packets out to all sinks with retry logic
//!
//! The end-of-stream marker travels through the same channels as a
//! sentinel, so every stage drains in order before shutting down.

mod ingest;
mod process;
mod router;

pub(crate) use ingest::IngestStage;
pub(crate) use process::ProcessStage;
pub(crate) use router::{Router, RouterCommand};

use crate::frame::DecodedFrame;

/// Item flowing through the bounded frame queue.
#[derive(Debug, Clone)]
pub(crate) enum FrameItem {
    /// A decoded frame awaiting processing.
    Frame(DecodedFrame),
    /// End-of-stream sentinel; processing stops after draining.
    EndOfStream,
}
