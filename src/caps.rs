//! Sample formats, channel layouts, and negotiated stream capabilities.
//!
//! The decoder declares its native format and layout using the codec-level
//! enums ([`CodecSampleFormat`], [`CodecChannelLayout`]). The output side of
//! the pipeline only speaks a small packed subset ([`SampleFormat`],
//! [`ChannelLayout`]); [`negotiate`] maps the former onto the latter using
//! fixed lookup tables, falling back to 32-bit float / stereo for anything
//! outside the supported sets.

use crate::decode::SignalParams;

/// Sample formats a decoder may produce, including planar variants.
///
/// Planar formats store each channel in its own plane; packed (interleaved)
/// formats alternate channels sample by sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecSampleFormat {
    /// Unsigned 8-bit, packed.
    U8,
    /// Signed 16-bit, packed.
    S16,
    /// Signed 32-bit, packed.
    S32,
    /// Signed 64-bit, packed.
    S64,
    /// 32-bit float, packed.
    F32,
    /// 64-bit float, packed.
    F64,
    /// Unsigned 8-bit, planar.
    U8P,
    /// Signed 16-bit, planar.
    S16P,
    /// Signed 32-bit, planar.
    S32P,
    /// Signed 64-bit, planar.
    S64P,
    /// 32-bit float, planar.
    F32P,
    /// 64-bit float, planar.
    F64P,
}

impl CodecSampleFormat {
    /// Returns the packed (interleaved) equivalent of this format.
    ///
    /// Packed formats return themselves.
    pub fn packed(self) -> Self {
        match self {
            Self::U8P => Self::U8,
            Self::S16P => Self::S16,
            Self::S32P => Self::S32,
            Self::S64P => Self::S64,
            Self::F32P => Self::F32,
            Self::F64P => Self::F64,
            other => other,
        }
    }

    /// Returns `true` if samples are stored one plane per channel.
    pub fn is_planar(self) -> bool {
        matches!(
            self,
            Self::U8P | Self::S16P | Self::S32P | Self::S64P | Self::F32P | Self::F64P
        )
    }

    /// Bytes occupied by a single sample of this format.
    pub fn bytes_per_sample(self) -> usize {
        match self.packed() {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::S64 | Self::F64 => 8,
            // packed() never returns a planar variant
            _ => unreachable!(),
        }
    }
}

/// Sample formats supported on the output side of the pipeline.
///
/// Always packed/interleaved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Unsigned 8-bit.
    U8,
    /// Signed 16-bit.
    S16,
    /// Signed 32-bit.
    S32,
    /// 32-bit float.
    F32,
}

impl SampleFormat {
    /// Bytes occupied by a single sample of this format.
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
        }
    }

    /// Bits occupied by a single sample of this format.
    pub fn bits_per_sample(self) -> u32 {
        8 * self.bytes_per_sample() as u32
    }
}

/// Channel layouts a decoder may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecChannelLayout {
    /// Single channel.
    Mono,
    /// Two channels, left/right.
    Stereo,
    /// Four channels.
    Quad,
    /// Six channels (5.1).
    Surround51,
    /// Eight channels (7.1).
    Surround71,
}

impl CodecChannelLayout {
    /// Number of channels in this layout.
    pub fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
            Self::Quad => 4,
            Self::Surround51 => 6,
            Self::Surround71 => 8,
        }
    }
}

/// Channel layouts supported on the output side of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelLayout {
    /// Single channel.
    Mono,
    /// Two channels, left/right.
    Stereo,
}

impl ChannelLayout {
    /// Number of channels in this layout.
    pub fn channels(self) -> u16 {
        match self {
            Self::Mono => 1,
            Self::Stereo => 2,
        }
    }
}

/// Codec formats with a direct output equivalent.
///
/// Built once at compile time; formats absent from this table fall back to
/// 32-bit float.
const SAMPLE_FORMAT_TABLE: &[(CodecSampleFormat, SampleFormat)] = &[
    (CodecSampleFormat::U8, SampleFormat::U8),
    (CodecSampleFormat::S16, SampleFormat::S16),
    (CodecSampleFormat::S32, SampleFormat::S32),
    (CodecSampleFormat::F32, SampleFormat::F32),
];

/// Codec layouts with a direct output equivalent.
///
/// Layouts absent from this table fall back to stereo.
const CHANNEL_LAYOUT_TABLE: &[(CodecChannelLayout, ChannelLayout)] = &[
    (CodecChannelLayout::Mono, ChannelLayout::Mono),
    (CodecChannelLayout::Stereo, ChannelLayout::Stereo),
];

/// Resolves the output sample format for a decoder-native format.
///
/// Takes the packed equivalent of the input; if that is not in the supported
/// set, falls back to 32-bit float.
pub fn output_format(input: CodecSampleFormat) -> SampleFormat {
    let packed = input.packed();
    SAMPLE_FORMAT_TABLE
        .iter()
        .find(|(codec, _)| *codec == packed)
        .map(|(_, out)| *out)
        .unwrap_or(SampleFormat::F32)
}

/// Resolves the output channel layout for a decoder-native layout.
///
/// Mono and stereo pass through; anything else falls back to stereo.
pub fn output_layout(input: CodecChannelLayout) -> ChannelLayout {
    CHANNEL_LAYOUT_TABLE
        .iter()
        .find(|(codec, _)| *codec == input)
        .map(|(_, out)| *out)
        .unwrap_or(ChannelLayout::Stereo)
}

/// Negotiated output capabilities of an audio stream.
///
/// Computed from the decoder's declared signal parameters via [`negotiate`];
/// immutable once derived. The same resolution is applied per-frame when
/// configuring the resampler, so the advertised caps match what packets
/// actually carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamCaps {
    /// Output sample format.
    pub format: SampleFormat,
    /// Bits per sample of the output format.
    pub bits_per_sample: u32,
    /// Number of output channels.
    pub channels: u16,
    /// Output sample rate in Hz (unchanged from the input).
    pub rate: u32,
    /// Output channel layout.
    pub layout: ChannelLayout,
    /// Whether samples are aligned to a larger boundary. Always `false`:
    /// output buffers are tightly packed.
    pub align: bool,
}

/// Derives the negotiated output caps from declared signal parameters.
pub fn negotiate(params: &SignalParams) -> StreamCaps {
    let format = output_format(params.format);
    let layout = output_layout(params.layout);

    StreamCaps {
        format,
        bits_per_sample: format.bits_per_sample(),
        channels: layout.channels(),
        rate: params.rate,
        layout,
        align: false,
    }
}
