//! Linear-interpolation resample engine.
//!
//! Fast but basic; may introduce artifacts for large rate changes. Suitable
//! for speech and for exercising the pipeline without an external DSP
//! dependency.

use crate::error::ResampleError;
use crate::format::{buffer_size, decode_planes, encode_interleaved, remix};
use crate::frame::DecodedFrame;
use crate::resample::{ResampleEngine, ResampleHandle, ResampleSpec};

/// Engine producing [`LinearHandle`]s.
#[derive(Debug, Default)]
pub struct LinearEngine;

impl LinearEngine {
    /// Creates a new engine.
    pub fn new() -> Self {
        Self
    }
}

impl ResampleEngine for LinearEngine {
    fn configure(&mut self, spec: &ResampleSpec) -> Result<Box<dyn ResampleHandle>, ResampleError> {
        Ok(Box::new(LinearHandle {
            spec: *spec,
            compensation: None,
        }))
    }
}

/// A configured linear-interpolation conversion.
struct LinearHandle {
    spec: ResampleSpec,
    /// Pending `(delta, over)` compensation, consumed by the next convert.
    compensation: Option<(i64, i64)>,
}

/// Interpolates one channel plane to `wanted` samples.
fn interpolate(plane: &[f64], wanted: usize) -> Vec<f64> {
    if plane.len() == wanted {
        return plane.to_vec();
    }
    if plane.is_empty() || wanted == 0 {
        return vec![0.0; wanted];
    }

    let ratio = plane.len() as f64 / wanted as f64;
    let mut out = Vec::with_capacity(wanted);

    for i in 0..wanted {
        let src_pos = i as f64 * ratio;
        let src_idx = src_pos.floor() as usize;
        let frac = src_pos - src_idx as f64;

        let sample = if src_idx + 1 < plane.len() {
            let s1 = plane[src_idx];
            let s2 = plane[src_idx + 1];
            s1 + (s2 - s1) * frac
        } else {
            // Beyond the last pair, hold the final sample
            plane[plane.len() - 1]
        };

        out.push(sample);
    }

    out
}

impl ResampleHandle for LinearHandle {
    fn spec(&self) -> &ResampleSpec {
        &self.spec
    }

    fn set_compensation(&mut self, delta: i64, over: i64) -> Result<(), ResampleError> {
        if over <= 0 || delta.unsigned_abs() > over.unsigned_abs() {
            return Err(ResampleError::InvalidCompensation { delta, over });
        }
        self.compensation = Some((delta, over));
        Ok(())
    }

    fn convert(&mut self, frame: &DecodedFrame, wanted: usize) -> Result<Vec<u8>, ResampleError> {
        if frame.format != self.spec.in_format
            || frame.layout != self.spec.in_layout
            || frame.sample_rate != self.spec.in_rate
        {
            return Err(ResampleError::UnsupportedConversion {
                details: format!(
                    "frame is {:?}/{:?}@{} but handle is configured for {:?}/{:?}@{}",
                    frame.format,
                    frame.layout,
                    frame.sample_rate,
                    self.spec.in_format,
                    self.spec.in_layout,
                    self.spec.in_rate
                ),
            });
        }

        // The compensation is already embodied in the caller's target sample
        // count; consuming the request keeps one request per conversion.
        self.compensation.take();

        let planes = decode_planes(frame)?;
        let remixed = remix(planes, self.spec.out_layout.channels());
        let resampled: Vec<Vec<f64>> = remixed
            .iter()
            .map(|plane| interpolate(plane, wanted))
            .collect();

        let out = encode_interleaved(&resampled, self.spec.out_format);
        debug_assert_eq!(
            out.len(),
            buffer_size(self.spec.out_format, self.spec.out_layout.channels(), wanted)
        );

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::{ChannelLayout, CodecChannelLayout, CodecSampleFormat, SampleFormat};

    fn spec_s16_mono_48k() -> ResampleSpec {
        ResampleSpec {
            in_format: CodecSampleFormat::S16,
            in_layout: CodecChannelLayout::Mono,
            in_rate: 48000,
            out_format: SampleFormat::S16,
            out_layout: ChannelLayout::Mono,
            out_rate: 48000,
        }
    }

    fn s16_mono_frame(samples: &[i16]) -> DecodedFrame {
        DecodedFrame {
            pts: Some(0),
            sample_count: samples.len(),
            sample_rate: 48000,
            format: CodecSampleFormat::S16,
            layout: CodecChannelLayout::Mono,
            data: samples.iter().flat_map(|s| s.to_ne_bytes()).collect(),
        }
    }

    fn as_s16(bytes: &[u8]) -> Vec<i16> {
        bytes
            .chunks_exact(2)
            .map(|b| i16::from_ne_bytes([b[0], b[1]]))
            .collect()
    }

    #[test]
    fn test_same_count_passthrough() {
        let mut engine = LinearEngine::new();
        let mut handle = engine.configure(&spec_s16_mono_48k()).unwrap();

        let frame = s16_mono_frame(&[100, 200, 300]);
        let out = handle.convert(&frame, 3).unwrap();

        // Symmetric re-scaling may shift values by one LSB
        let samples = as_s16(&out);
        for (a, b) in samples.iter().zip([100i16, 200, 300]) {
            assert!((i32::from(*a) - i32::from(b)).abs() <= 1);
        }
    }

    #[test]
    fn test_stretch_produces_wanted_samples() {
        let mut engine = LinearEngine::new();
        let mut handle = engine.configure(&spec_s16_mono_48k()).unwrap();

        let frame = s16_mono_frame(&[0; 1024]);
        let out = handle.convert(&frame, 1127).unwrap();
        assert_eq!(out.len(), 1127 * 2);

        let out = handle.convert(&frame, 922).unwrap();
        assert_eq!(out.len(), 922 * 2);
    }

    #[test]
    fn test_interpolates_between_samples() {
        let mut engine = LinearEngine::new();
        let mut handle = engine.configure(&spec_s16_mono_48k()).unwrap();

        let frame = s16_mono_frame(&[0, 1000]);
        let out = handle.convert(&frame, 4).unwrap();
        let samples = as_s16(&out);

        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0);
        assert!(samples[1] > 0 && samples[1] < 1000);
    }

    #[test]
    fn test_format_and_layout_conversion() {
        let mut engine = LinearEngine::new();
        let spec = ResampleSpec {
            in_format: CodecSampleFormat::S16,
            in_layout: CodecChannelLayout::Mono,
            in_rate: 48000,
            out_format: SampleFormat::F32,
            out_layout: ChannelLayout::Stereo,
            out_rate: 48000,
        };
        let mut handle = engine.configure(&spec).unwrap();

        let frame = s16_mono_frame(&[16384]);
        let out = handle.convert(&frame, 1).unwrap();

        // One sample, two channels, four bytes each
        assert_eq!(out.len(), 8);
        let left = f32::from_ne_bytes([out[0], out[1], out[2], out[3]]);
        let right = f32::from_ne_bytes([out[4], out[5], out[6], out[7]]);
        assert!((left - 0.5).abs() < 1e-3);
        assert_eq!(left, right);
    }

    #[test]
    fn test_rate_conversion_target_count() {
        let mut engine = LinearEngine::new();
        let spec = ResampleSpec {
            out_rate: 16000,
            ..spec_s16_mono_48k()
        };
        let mut handle = engine.configure(&spec).unwrap();

        // 480 samples at a 48k→16k conversion: the caller asks for the
        // rate-scaled count and gets exactly that
        let frame = s16_mono_frame(&[0; 480]);
        let out = handle.convert(&frame, 160).unwrap();
        assert_eq!(as_s16(&out).len(), 160);
    }

    #[test]
    fn test_rejects_mismatched_frame() {
        let mut engine = LinearEngine::new();
        let mut handle = engine.configure(&spec_s16_mono_48k()).unwrap();

        let mut frame = s16_mono_frame(&[0; 16]);
        frame.sample_rate = 44100;

        let err = handle.convert(&frame, 16).unwrap_err();
        assert!(matches!(err, ResampleError::UnsupportedConversion { .. }));
    }

    #[test]
    fn test_compensation_validation() {
        let mut engine = LinearEngine::new();
        let mut handle = engine.configure(&spec_s16_mono_48k()).unwrap();

        assert!(handle.set_compensation(103, 1127).is_ok());
        assert!(handle.set_compensation(-102, 922).is_ok());

        assert!(matches!(
            handle.set_compensation(10, 0),
            Err(ResampleError::InvalidCompensation { .. })
        ));
        assert!(matches!(
            handle.set_compensation(2000, 1000),
            Err(ResampleError::InvalidCompensation { .. })
        ));
    }

    #[test]
    fn test_reconfigure_replaces_handle() {
        let mut engine = LinearEngine::new();
        let handle = engine.configure(&spec_s16_mono_48k()).unwrap();

        let new_spec = ResampleSpec {
            in_rate: 44100,
            ..spec_s16_mono_48k()
        };
        let handle = engine.reconfigure(handle, &new_spec).unwrap();
        assert_eq!(handle.spec(), &new_spec);
    }
}
