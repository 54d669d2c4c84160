//! Sample decoding, encoding, and channel remixing.

use crate::caps::{CodecSampleFormat, SampleFormat};
use crate::error::ResampleError;
use crate::frame::DecodedFrame;

/// Decodes one packed sample starting at `bytes` into a normalized `f64`.
///
/// `format` must be a packed variant; the caller resolves planar layouts
/// before indexing.
fn read_sample(format: CodecSampleFormat, bytes: &[u8]) -> f64 {
    match format {
        CodecSampleFormat::U8 => (f64::from(bytes[0]) - 128.0) / 128.0,
        CodecSampleFormat::S16 => f64::from(i16::from_ne_bytes([bytes[0], bytes[1]])) / 32768.0,
        CodecSampleFormat::S32 => {
            f64::from(i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                / 2_147_483_648.0
        }
        CodecSampleFormat::S64 => {
            i64::from_ne_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]) as f64
                / 9_223_372_036_854_775_808.0
        }
        CodecSampleFormat::F32 => {
            f64::from(f32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        }
        CodecSampleFormat::F64 => f64::from_ne_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]),
        // planar variants are mapped to their packed equivalent by the caller
        _ => read_sample(format.packed(), bytes),
    }
}

/// Encodes one normalized sample into output bytes.
///
/// Uses symmetric scaling (× max positive value) so -1.0 maps one LSB short
/// of the negative extreme. Values outside [-1.0, 1.0] are clamped.
fn write_sample(format: SampleFormat, sample: f64, out: &mut Vec<u8>) {
    match format {
        SampleFormat::U8 => {
            let value = ((sample * 127.0).clamp(-128.0, 127.0) + 128.0) as u8;
            out.push(value);
        }
        SampleFormat::S16 => {
            let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
            out.extend_from_slice(&value.to_ne_bytes());
        }
        SampleFormat::S32 => {
            let value = (sample * 2_147_483_647.0).clamp(-2_147_483_648.0, 2_147_483_647.0) as i32;
            out.extend_from_slice(&value.to_ne_bytes());
        }
        SampleFormat::F32 => {
            out.extend_from_slice(&(sample as f32).to_ne_bytes());
        }
    }
}

/// Decodes a frame's raw bytes into per-channel `f64` planes.
///
/// Handles both packed and planar source layouts. Fails if the frame's data
/// length does not match its declared format/layout/sample count.
pub(crate) fn decode_planes(frame: &DecodedFrame) -> Result<Vec<Vec<f64>>, ResampleError> {
    let channels = frame.layout.channels() as usize;
    let bps = frame.format.bytes_per_sample();
    let expected = frame.expected_data_len();

    if frame.data.len() != expected {
        return Err(ResampleError::ConversionFailed {
            reason: format!(
                "frame data is {} bytes, expected {} for {:?}/{:?} x{}",
                frame.data.len(),
                expected,
                frame.format,
                frame.layout,
                frame.sample_count
            ),
        });
    }

    let packed_format = frame.format.packed();
    let mut planes = vec![Vec::with_capacity(frame.sample_count); channels];

    if frame.format.is_planar() {
        let plane_bytes = frame.sample_count * bps;
        for (channel, plane) in planes.iter_mut().enumerate() {
            let base = channel * plane_bytes;
            for i in 0..frame.sample_count {
                let offset = base + i * bps;
                plane.push(read_sample(packed_format, &frame.data[offset..]));
            }
        }
    } else {
        for i in 0..frame.sample_count {
            for (channel, plane) in planes.iter_mut().enumerate() {
                let offset = (i * channels + channel) * bps;
                plane.push(read_sample(packed_format, &frame.data[offset..]));
            }
        }
    }

    Ok(planes)
}

/// Remixes channel planes to the requested output channel count.
///
/// - Same count: passthrough
/// - Down to mono: average of all input channels
/// - Mono up to stereo: duplicate the single channel
/// - Wider than stereo down to stereo: keep the front left/right pair
pub(crate) fn remix(planes: Vec<Vec<f64>>, out_channels: u16) -> Vec<Vec<f64>> {
    let out_channels = out_channels as usize;
    if planes.len() == out_channels {
        return planes;
    }

    match out_channels {
        1 => {
            let count = planes.first().map_or(0, Vec::len);
            let scale = 1.0 / planes.len() as f64;
            let mono = (0..count)
                .map(|i| planes.iter().map(|p| p[i]).sum::<f64>() * scale)
                .collect();
            vec![mono]
        }
        _ => {
            if planes.len() == 1 {
                let plane = &planes[0];
                vec![plane.clone(), plane.clone()]
            } else {
                planes.into_iter().take(2).collect()
            }
        }
    }
}

/// Interleaves channel planes into packed output bytes.
pub(crate) fn encode_interleaved(planes: &[Vec<f64>], format: SampleFormat) -> Vec<u8> {
    let count = planes.first().map_or(0, Vec::len);
    let mut out = Vec::with_capacity(format.bytes_per_sample() * planes.len() * count);

    for i in 0..count {
        for plane in planes {
            write_sample(format, plane[i], &mut out);
        }
    }

    out
}
