//! Frame and packet types flowing through the pipeline.

use std::sync::Arc;
use std::time::Duration;

use crate::caps::{CodecChannelLayout, CodecSampleFormat, StreamCaps};

/// Rational time base of a stream, in seconds per tick.
///
/// Presentation timestamps on [`DecodedFrame`] and [`OutputPacket`] count
/// ticks of this base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBase {
    /// Numerator.
    pub num: i32,
    /// Denominator.
    pub den: i32,
}

impl TimeBase {
    /// Creates a new time base of `num / den` seconds per tick.
    pub fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// The value of one tick in seconds.
    pub fn value(&self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

/// An encoded packet handed to the decoder.
///
/// The payload is opaque to this crate; only the decoder interprets it.
#[derive(Debug, Clone)]
pub struct EncodedPacket {
    /// Compressed bitstream payload.
    pub data: Vec<u8>,
    /// Presentation timestamp in stream time-base ticks, if the container
    /// provided one.
    pub pts: Option<i64>,
}

impl EncodedPacket {
    /// Creates a packet from raw payload bytes with no timestamp.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, pts: None }
    }

    /// Creates a packet with a presentation timestamp.
    pub fn with_pts(data: Vec<u8>, pts: i64) -> Self {
        Self {
            data,
            pts: Some(pts),
        }
    }
}

/// A decoded audio frame as produced by the decoder.
///
/// Read-only to the pipeline. `pts` may be absent when the upstream
/// container lacked timestamp metadata; the stream processor repairs it from
/// its running sample position.
///
/// Sample data layout depends on `format`: packed formats interleave
/// channels sample by sample, planar formats store whole channel planes
/// back to back.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Presentation timestamp in stream time-base ticks, if known.
    pub pts: Option<i64>,
    /// Number of samples per channel.
    pub sample_count: usize,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Native sample format.
    pub format: CodecSampleFormat,
    /// Native channel layout.
    pub layout: CodecChannelLayout,
    /// Raw sample bytes, laid out per `format`.
    pub data: Vec<u8>,
}

impl DecodedFrame {
    /// Returns the duration covered by this frame.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.sample_count as f64 / f64::from(self.sample_rate))
    }

    /// Returns the byte length `data` must have for this frame's
    /// format, layout, and sample count.
    pub fn expected_data_len(&self) -> usize {
        self.sample_count * self.layout.channels() as usize * self.format.bytes_per_sample()
    }
}

/// A finished, timestamp-synchronized audio packet.
///
/// Created once per successfully converted frame and handed to sinks.
/// Sample data is `Arc`-wrapped so fan-out to multiple sinks shares one
/// buffer.
#[derive(Debug, Clone)]
pub struct OutputPacket {
    /// Negotiated output caps the data conforms to.
    pub caps: StreamCaps,
    /// Converted sample bytes, packed/interleaved.
    pub data: Arc<Vec<u8>>,
    /// Presentation timestamp in stream time-base ticks (repaired when the
    /// source frame had none).
    pub pts: i64,
    /// Time base the timestamp counts in.
    pub time_base: TimeBase,
    /// Index of the stream within its container.
    pub stream_index: usize,
    /// Container-assigned stream identifier.
    pub stream_id: i64,
}

impl OutputPacket {
    /// Presentation time in seconds.
    pub fn pts_seconds(&self) -> f64 {
        self.pts as f64 * self.time_base.value()
    }

    /// Number of samples per channel in this packet.
    pub fn sample_count(&self) -> usize {
        let stride = self.caps.channels as usize * self.caps.format.bytes_per_sample();
        if stride == 0 {
            return 0;
        }
        self.data.len() / stride
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::{ChannelLayout, SampleFormat};

    #[test]
    fn test_time_base_value() {
        assert_eq!(TimeBase::new(1, 48000).value(), 1.0 / 48000.0);
        assert_eq!(TimeBase::new(1, 90000).value(), 1.0 / 90000.0);
    }

    #[test]
    fn test_frame_duration() {
        let frame = DecodedFrame {
            pts: Some(0),
            sample_count: 4800,
            sample_rate: 48000,
            format: CodecSampleFormat::S16,
            layout: CodecChannelLayout::Mono,
            data: vec![0; 9600],
        };
        assert_eq!(frame.duration(), Duration::from_millis(100));
    }

    #[test]
    fn test_frame_duration_zero_rate() {
        let frame = DecodedFrame {
            pts: None,
            sample_count: 1024,
            sample_rate: 0,
            format: CodecSampleFormat::S16,
            layout: CodecChannelLayout::Mono,
            data: vec![],
        };
        assert_eq!(frame.duration(), Duration::ZERO);
    }

    #[test]
    fn test_frame_expected_data_len() {
        let frame = DecodedFrame {
            pts: None,
            sample_count: 1024,
            sample_rate: 48000,
            format: CodecSampleFormat::F32,
            layout: CodecChannelLayout::Stereo,
            data: vec![],
        };
        // 1024 samples * 2 channels * 4 bytes
        assert_eq!(frame.expected_data_len(), 8192);
    }

    #[test]
    fn test_packet_pts_seconds() {
        let packet = OutputPacket {
            caps: StreamCaps {
                format: SampleFormat::S16,
                bits_per_sample: 16,
                channels: 1,
                rate: 48000,
                layout: ChannelLayout::Mono,
                align: false,
            },
            data: Arc::new(vec![0; 2048]),
            pts: 48000,
            time_base: TimeBase::new(1, 48000),
            stream_index: 0,
            stream_id: 1,
        };
        assert_eq!(packet.pts_seconds(), 1.0);
        assert_eq!(packet.sample_count(), 1024);
    }
}
