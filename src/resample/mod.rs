//! Resampler abstraction and the built-in reference engine.
//!
//! The resampling engine is external to the core: anything that can convert
//! audio between sample rate/format/layout triples and apply small
//! sample-count compensations can sit behind these traits. A configured
//! [`ResampleHandle`] is exclusively owned by one stream processor and
//! replaced - old handle released first - whenever the negotiated conversion
//! changes.
//!
//! [`LinearEngine`] provides a dependency-free linear-interpolation engine
//! good enough for speech and for testing the pipeline end to end.

mod linear;

pub use linear::LinearEngine;

use crate::caps::{ChannelLayout, CodecChannelLayout, CodecSampleFormat, SampleFormat};
use crate::error::ResampleError;
use crate::frame::DecodedFrame;

/// A resolved conversion: input triple → output triple.
///
/// The stream processor reconfigures its handle whenever this spec changes
/// between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampleSpec {
    /// Input sample format.
    pub in_format: CodecSampleFormat,
    /// Input channel layout.
    pub in_layout: CodecChannelLayout,
    /// Input sample rate in Hz.
    pub in_rate: u32,
    /// Output sample format.
    pub out_format: SampleFormat,
    /// Output channel layout.
    pub out_layout: ChannelLayout,
    /// Output sample rate in Hz.
    pub out_rate: u32,
}

/// Factory for configured resample handles.
///
/// `reconfigure` consumes and releases the old handle before building the
/// replacement, mirroring an engine that reuses one underlying context.
pub trait ResampleEngine: Send {
    /// Builds a handle for the given conversion.
    fn configure(&mut self, spec: &ResampleSpec) -> Result<Box<dyn ResampleHandle>, ResampleError>;

    /// Replaces a previously configured handle with one for a new conversion.
    ///
    /// The default implementation releases the old handle and configures a
    /// fresh one.
    fn reconfigure(
        &mut self,
        old: Box<dyn ResampleHandle>,
        spec: &ResampleSpec,
    ) -> Result<Box<dyn ResampleHandle>, ResampleError> {
        drop(old);
        self.configure(spec)
    }
}

/// A configured conversion context.
pub trait ResampleHandle: Send {
    /// The conversion this handle was configured for.
    fn spec(&self) -> &ResampleSpec;

    /// Requests a sample-count compensation of `delta` samples spread over
    /// the next `over` output samples.
    ///
    /// Rejection fails the conversion attempt for the frame being processed;
    /// the stream itself continues.
    fn set_compensation(&mut self, delta: i64, over: i64) -> Result<(), ResampleError>;

    /// Converts a frame, producing `wanted` output samples per channel in
    /// the handle's output format and layout.
    fn convert(&mut self, frame: &DecodedFrame, wanted: usize) -> Result<Vec<u8>, ResampleError>;
}
