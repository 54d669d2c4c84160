//! Error types for av-audio.
//!
//! Errors are split into two categories:
//! - **Fatal errors** ([`AudioStreamError`]): Prevent the stream from starting
//! - **Recoverable errors** ([`DecodeError`], [`ResampleError`], [`SinkError`]):
//!   Runtime failures that drop a single unit of work while the stream
//!   continues running

/// Fatal errors that prevent an audio stream from starting.
///
/// These errors are returned from [`AudioStreamBuilder::start()`] and indicate
/// that the pipeline cannot be created. Runtime issues (decode failures,
/// resampler rejections, slow sinks) never kill a running stream - they drop
/// the affected frame and are surfaced via the event callback instead.
///
/// [`AudioStreamBuilder::start()`]: crate::AudioStreamBuilder::start
#[derive(Debug, thiserror::Error)]
pub enum AudioStreamError {
    /// No decoder was configured before starting.
    #[error("no decoder configured - provide one with decoder() before calling start()")]
    NoDecoderConfigured,

    /// No sinks were configured before starting.
    #[error("no sinks configured - add at least one sink")]
    NoSinksConfigured,

    /// A sink failed during initialization.
    #[error("sink '{sink_name}' failed to start: {reason}")]
    SinkStartFailed {
        /// Name of the sink that failed.
        sink_name: String,
        /// Why the sink failed to start.
        reason: String,
    },

    /// The session's input channel is closed (the pipeline has shut down).
    #[error("session input closed")]
    InputClosed,
}

/// Errors reported by an [`AudioDecoder`](crate::AudioDecoder) implementation.
///
/// Decode errors are recoverable: a failed `submit` drops the encoded packet,
/// a failed `pull` ends the drain loop for that packet. The stream keeps
/// running either way.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The decoder rejected the submitted packet.
    #[error("packet rejected: {reason}")]
    PacketRejected {
        /// Description of why the packet was rejected.
        reason: String,
    },

    /// Decoding failed while pulling frames.
    #[error("decode failed: {reason}")]
    DecodeFailed {
        /// Description of what went wrong.
        reason: String,
    },
}

impl DecodeError {
    /// Creates a packet-rejected error with the given reason.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::PacketRejected {
            reason: reason.into(),
        }
    }

    /// Creates a decode-failed error with the given reason.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::DecodeFailed {
            reason: reason.into(),
        }
    }
}

/// Errors reported by a resample engine.
///
/// All resample errors are recoverable - the frame that triggered them
/// produces no output packet and the stream moves on to the next frame.
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    /// The requested conversion is not supported by the engine.
    #[error("unsupported conversion: {details}")]
    UnsupportedConversion {
        /// Description of the unsupported input/output combination.
        details: String,
    },

    /// The compensation request was rejected.
    #[error("invalid compensation: {delta} samples over {over}")]
    InvalidCompensation {
        /// Requested sample delta.
        delta: i64,
        /// Span the delta was to be spread over.
        over: i64,
    },

    /// Conversion of a frame failed.
    #[error("conversion failed: {reason}")]
    ConversionFailed {
        /// Description of what went wrong.
        reason: String,
    },
}

/// Errors that can occur within a [`Sink`](crate::Sink) implementation.
///
/// Sink errors are recoverable - the router will emit a [`StreamEvent::SinkError`]
/// and may retry the operation.
///
/// [`StreamEvent::SinkError`]: crate::StreamEvent::SinkError
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// A write operation failed.
    #[error("write failed: {reason}")]
    WriteFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// The receiving channel was closed.
    #[error("channel closed")]
    ChannelClosed,

    /// The sink was used before initialization.
    #[error("sink not initialized (call on_start first)")]
    NotInitialized,

    /// Custom error for user-implemented sinks.
    #[error("{0}")]
    Custom(String),
}

impl SinkError {
    /// Creates a custom sink error with the given message.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Creates a write failed error with the given reason.
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::WriteFailed {
            reason: reason.into(),
        }
    }
}
