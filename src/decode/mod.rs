//! Decoder abstraction the pipeline pulls frames from.
//!
//! The decoder itself is external to this crate: an implementation wraps
//! whatever codec library actually turns encoded packets into PCM. The
//! pipeline only relies on the submit/pull contract below and on the
//! declared [`SignalParams`] for capability negotiation.

mod mock;

pub use mock::MockDecoder;

use crate::caps::{CodecChannelLayout, CodecSampleFormat};
use crate::error::DecodeError;
use crate::frame::{DecodedFrame, EncodedPacket};

/// Signal parameters a decoder declares for its output.
///
/// Used for the capability query: the negotiated stream caps are derived
/// from these parameters, independent of any specific frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalParams {
    /// Native sample format.
    pub format: CodecSampleFormat,
    /// Native channel layout.
    pub layout: CodecChannelLayout,
    /// Native sample rate in Hz.
    pub rate: u32,
}

/// An audio decoder that turns encoded packets into decoded frames.
///
/// Calls are synchronous on the processing path. One `submit` is followed by
/// repeated `pull` calls until the decoder reports `Ok(None)` (drained for
/// this packet) or an error; the drain loop is finite per submission and is
/// re-run for each new packet.
pub trait AudioDecoder: Send {
    /// Declared native output parameters.
    fn signal_params(&self) -> SignalParams;

    /// Submits an encoded packet for decoding.
    ///
    /// A rejected packet is dropped by the caller without further effect on
    /// the stream.
    fn submit(&mut self, packet: &EncodedPacket) -> Result<(), DecodeError>;

    /// Pulls the next decoded frame for the current submission.
    ///
    /// `Ok(None)` means the submission is drained. An error ends the drain
    /// loop for this packet; the stream continues with the next one.
    fn pull(&mut self) -> Result<Option<DecodedFrame>, DecodeError>;
}

/// Drains all frames the decoder has for its current submission.
///
/// Pulls until the decoder reports `Ok(None)` or an error. Errors end the
/// drain early; frames pulled before the error are still returned.
pub fn drain(decoder: &mut dyn AudioDecoder) -> Vec<DecodedFrame> {
    let mut frames = Vec::new();

    loop {
        match decoder.pull() {
            Ok(Some(frame)) => frames.push(frame),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "decoder pull failed, ending drain");
                break;
            }
        }
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_collects_until_empty() {
        let mut decoder = MockDecoder::new(SignalParams {
            format: CodecSampleFormat::S16,
            layout: CodecChannelLayout::Mono,
            rate: 48000,
        });
        decoder.queue_packet_frames(vec![
            decoder.silence_frame(Some(0), 1024),
            decoder.silence_frame(Some(1024), 1024),
        ]);

        decoder.submit(&EncodedPacket::new(vec![1, 2, 3])).unwrap();
        let frames = drain(&mut decoder);

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].pts, Some(0));
        assert_eq!(frames[1].pts, Some(1024));

        // Drained: a second drain for the same submission yields nothing
        assert!(drain(&mut decoder).is_empty());
    }

    #[test]
    fn test_drain_stops_on_error_keeping_earlier_frames() {
        let mut decoder = MockDecoder::new(SignalParams {
            format: CodecSampleFormat::S16,
            layout: CodecChannelLayout::Mono,
            rate: 48000,
        });
        decoder.queue_packet_frames(vec![decoder.silence_frame(Some(0), 512)]);
        decoder.fail_pull_after(1);

        decoder.submit(&EncodedPacket::new(vec![0])).unwrap();
        let frames = drain(&mut decoder);

        assert_eq!(frames.len(), 1);
    }
}
