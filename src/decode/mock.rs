//! Mock decoder for testing without a codec library.

use std::collections::VecDeque;
use std::f64::consts::PI;

use crate::caps::CodecSampleFormat;
use crate::decode::{AudioDecoder, SignalParams};
use crate::error::DecodeError;
use crate::frame::{DecodedFrame, EncodedPacket};

/// A scripted decoder that yields pre-queued frames.
///
/// Each call to [`queue_packet_frames`](Self::queue_packet_frames) adds one
/// batch of frames; each submitted packet consumes the next batch, which is
/// then drained frame by frame via `pull`. This allows testing the full
/// pipeline without any real codec, making it suitable for CI environments.
///
/// # Example
///
/// ```
/// use av_audio::{
///     CodecChannelLayout, CodecSampleFormat, EncodedPacket, MockDecoder, SignalParams,
/// };
/// use av_audio::decode::AudioDecoder;
///
/// let mut decoder = MockDecoder::new(SignalParams {
///     format: CodecSampleFormat::S16,
///     layout: CodecChannelLayout::Mono,
///     rate: 48000,
/// });
///
/// decoder.queue_packet_frames(vec![decoder.silence_frame(Some(0), 1024)]);
/// decoder.submit(&EncodedPacket::new(vec![0u8; 64])).unwrap();
///
/// let frame = decoder.pull().unwrap().unwrap();
/// assert_eq!(frame.sample_count, 1024);
/// assert!(decoder.pull().unwrap().is_none());
/// ```
pub struct MockDecoder {
    params: SignalParams,
    queued: VecDeque<Vec<DecodedFrame>>,
    ready: VecDeque<DecodedFrame>,
    reject_submits: bool,
    pulls_remaining: Option<u32>,
    packets_submitted: u64,
}

impl MockDecoder {
    /// Creates a mock decoder declaring the given signal parameters.
    pub fn new(params: SignalParams) -> Self {
        Self {
            params,
            queued: VecDeque::new(),
            ready: VecDeque::new(),
            reject_submits: false,
            pulls_remaining: None,
            packets_submitted: 0,
        }
    }

    /// Queues one batch of frames to be released by the next packet
    /// submission.
    pub fn queue_packet_frames(&mut self, frames: Vec<DecodedFrame>) {
        self.queued.push_back(frames);
    }

    /// Makes every subsequent `submit` fail.
    pub fn reject_submits(&mut self) {
        self.reject_submits = true;
    }

    /// Makes `pull` fail after the given number of successful pulls.
    pub fn fail_pull_after(&mut self, pulls: u32) {
        self.pulls_remaining = Some(pulls);
    }

    /// Number of packets submitted so far.
    pub fn packets_submitted(&self) -> u64 {
        self.packets_submitted
    }

    /// Builds a silent frame matching the declared signal parameters.
    pub fn silence_frame(&self, pts: Option<i64>, sample_count: usize) -> DecodedFrame {
        let mut frame = DecodedFrame {
            pts,
            sample_count,
            sample_rate: self.params.rate,
            format: self.params.format,
            layout: self.params.layout,
            data: Vec::new(),
        };

        // Unsigned 8-bit centers on 128; everything else on zero bytes
        let fill = match self.params.format.packed() {
            CodecSampleFormat::U8 => 128,
            _ => 0,
        };
        frame.data = vec![fill; frame.expected_data_len()];
        frame
    }

    /// Builds a frame carrying a sine wave at the given frequency.
    ///
    /// Only supported for 16-bit and float formats; other formats fall back
    /// to silence.
    pub fn sine_frame(&self, pts: Option<i64>, sample_count: usize, frequency: f64) -> DecodedFrame {
        let mut frame = self.silence_frame(pts, sample_count);
        let channels = self.params.layout.channels() as usize;
        let rate = f64::from(self.params.rate);

        match self.params.format {
            CodecSampleFormat::S16 => {
                for i in 0..sample_count {
                    let value = (2.0 * PI * frequency * i as f64 / rate).sin();
                    let sample = ((value * 32767.0) as i16).to_ne_bytes();
                    for channel in 0..channels {
                        let offset = (i * channels + channel) * 2;
                        frame.data[offset..offset + 2].copy_from_slice(&sample);
                    }
                }
            }
            CodecSampleFormat::F32 => {
                for i in 0..sample_count {
                    let value = (2.0 * PI * frequency * i as f64 / rate).sin() as f32;
                    let sample = value.to_ne_bytes();
                    for channel in 0..channels {
                        let offset = (i * channels + channel) * 4;
                        frame.data[offset..offset + 4].copy_from_slice(&sample);
                    }
                }
            }
            _ => {}
        }

        frame
    }
}

impl AudioDecoder for MockDecoder {
    fn signal_params(&self) -> SignalParams {
        self.params
    }

    fn submit(&mut self, _packet: &EncodedPacket) -> Result<(), DecodeError> {
        if self.reject_submits {
            return Err(DecodeError::rejected("mock decoder rejects submissions"));
        }

        self.packets_submitted += 1;
        if let Some(batch) = self.queued.pop_front() {
            self.ready.extend(batch);
        }
        Ok(())
    }

    fn pull(&mut self) -> Result<Option<DecodedFrame>, DecodeError> {
        if let Some(remaining) = self.pulls_remaining {
            if remaining == 0 {
                return Err(DecodeError::failed("mock decoder pull failure"));
            }
            self.pulls_remaining = Some(remaining - 1);
        }

        Ok(self.ready.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::CodecChannelLayout;

    fn mono_s16() -> SignalParams {
        SignalParams {
            format: CodecSampleFormat::S16,
            layout: CodecChannelLayout::Mono,
            rate: 48000,
        }
    }

    #[test]
    fn test_submit_releases_one_batch() {
        let mut decoder = MockDecoder::new(mono_s16());
        decoder.queue_packet_frames(vec![decoder.silence_frame(Some(0), 256)]);
        decoder.queue_packet_frames(vec![decoder.silence_frame(Some(256), 256)]);

        decoder.submit(&EncodedPacket::new(vec![0])).unwrap();
        assert_eq!(decoder.pull().unwrap().unwrap().pts, Some(0));
        assert!(decoder.pull().unwrap().is_none());

        decoder.submit(&EncodedPacket::new(vec![1])).unwrap();
        assert_eq!(decoder.pull().unwrap().unwrap().pts, Some(256));
        assert_eq!(decoder.packets_submitted(), 2);
    }

    #[test]
    fn test_reject_submits() {
        let mut decoder = MockDecoder::new(mono_s16());
        decoder.reject_submits();

        let err = decoder.submit(&EncodedPacket::new(vec![0])).unwrap_err();
        assert!(matches!(err, DecodeError::PacketRejected { .. }));
    }

    #[test]
    fn test_silence_frame_sized_for_format() {
        let decoder = MockDecoder::new(mono_s16());
        let frame = decoder.silence_frame(None, 1024);
        assert_eq!(frame.data.len(), 2048);
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_silence_frame_u8_centered() {
        let decoder = MockDecoder::new(SignalParams {
            format: CodecSampleFormat::U8,
            layout: CodecChannelLayout::Mono,
            rate: 8000,
        });
        let frame = decoder.silence_frame(None, 16);
        assert!(frame.data.iter().all(|&b| b == 128));
    }

    #[test]
    fn test_sine_frame_has_signal() {
        let decoder = MockDecoder::new(mono_s16());
        let frame = decoder.sine_frame(Some(0), 480, 440.0);

        let samples: Vec<i16> = frame
            .data
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect();
        assert!(samples.iter().any(|&s| s > 0));
        assert!(samples.iter().any(|&s| s < 0));
    }
}
