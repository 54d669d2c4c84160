//! Audio/video drift estimation and sample-rate compensation planning.
//!
//! Each frame's presentation time is compared against the shared clock. The
//! difference feeds an exponentially-weighted running average; once enough
//! measurements have accumulated, a sustained average drift beyond roughly
//! two frame-durations triggers a bounded sample-count adjustment that the
//! resampler turns into a slight playback speed change.

use crate::clock::GlobalClock;

/// No correction is attempted beyond this audio/video desync, in seconds.
/// Instead the clock is hard-set to the frame's presentation time.
const NOSYNC_THRESHOLD: f64 = 10.0;

/// Maximum playback speed change, in percent, used to regain sync.
const MAX_CORRECTION_PERCENT: u32 = 10;

/// Number of measurements required before the running average is trusted.
const DIFF_AVG_COUNT: u32 = 20;

/// Per-frame sample plan decided by the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplePlan {
    /// Convert the frame with its native sample count.
    Keep,
    /// Ask the resampler to stretch or shrink the frame to `wanted` samples.
    Adjust {
        /// Target sample count, within ±10% of the native count.
        wanted: usize,
    },
}

/// Outcome of evaluating one frame against the shared clock.
#[derive(Debug, Clone, Copy)]
pub struct SyncEvaluation {
    /// Raw clock skew for this frame (`pts - clock`), in seconds. May be NaN
    /// when either input was. Exposed for diagnostics regardless of the
    /// branch taken.
    pub diff: f64,
    /// Sample-count plan for the conversion of this frame.
    pub plan: SamplePlan,
    /// `true` when the desync was large enough that the clock was hard-set
    /// to the frame's presentation time.
    pub resynced: bool,
}

/// Running audio/video drift estimator.
///
/// Owned by exactly one stream processor; never shared across streams. The
/// internal state survives for the lifetime of the stream and is reset (not
/// destroyed) on NaN or out-of-range measurements.
#[derive(Debug)]
pub struct SyncEstimator {
    /// Exponentially decayed sum of per-frame skews.
    cumulative_diff: f64,
    /// Measurements accumulated since the last reset, saturating at
    /// `DIFF_AVG_COUNT`.
    measurement_count: u32,
    /// Weight applied to prior history per measurement. Chosen so a single
    /// outlier decays to 1% influence after `DIFF_AVG_COUNT` frames.
    decay_coef: f64,
}

impl SyncEstimator {
    /// Creates an estimator with empty history.
    pub fn new() -> Self {
        Self {
            cumulative_diff: 0.0,
            measurement_count: 0,
            decay_coef: (0.01f64.ln() / f64::from(DIFF_AVG_COUNT)).exp(),
        }
    }

    /// Measurements accumulated since the last reset.
    pub fn measurement_count(&self) -> u32 {
        self.measurement_count
    }

    /// Current exponentially weighted average skew, in seconds.
    pub fn average_diff(&self) -> f64 {
        self.cumulative_diff * (1.0 - self.decay_coef)
    }

    /// Evaluates one frame against the shared clock.
    ///
    /// Updates the running drift estimate and decides whether this frame's
    /// sample count should be adjusted. A desync of `NOSYNC_THRESHOLD` or
    /// more resets the history and hard-sets the clock to `pts_seconds`.
    /// A NaN skew also resets the history but leaves the clock untouched -
    /// NaN compares false against both thresholds.
    pub fn evaluate(
        &mut self,
        pts_seconds: f64,
        sample_count: usize,
        sample_rate: u32,
        clock: &GlobalClock,
    ) -> SyncEvaluation {
        let diff = pts_seconds - clock.read();
        let mut plan = SamplePlan::Keep;

        if !diff.is_nan() && diff.abs() < NOSYNC_THRESHOLD {
            self.cumulative_diff = diff + self.decay_coef * self.cumulative_diff;

            if self.measurement_count < DIFF_AVG_COUNT {
                // not enough measurements for a trustworthy average
                self.measurement_count += 1;
            } else {
                let avg_diff = self.cumulative_diff * (1.0 - self.decay_coef);

                // Correct only drift larger than about two frame-durations;
                // anything finer is below what playback can track reliably.
                let diff_threshold = 2.0 * sample_count as f64 / f64::from(sample_rate);

                if avg_diff.abs() >= diff_threshold {
                    let wanted =
                        sample_count as i64 + (diff * f64::from(sample_rate)).round() as i64;
                    let min_samples =
                        (sample_count as f64 * f64::from(100 - MAX_CORRECTION_PERCENT) / 100.0)
                            .ceil() as i64;
                    let max_samples =
                        (sample_count as f64 * f64::from(100 + MAX_CORRECTION_PERCENT) / 100.0)
                            .ceil() as i64;
                    let wanted = wanted.clamp(min_samples, max_samples);

                    if wanted != sample_count as i64 {
                        plan = SamplePlan::Adjust {
                            wanted: wanted as usize,
                        };
                    }
                }
            }
        } else {
            // Too big a difference: may be initial PTS errors, discard the
            // accumulated history
            self.measurement_count = 0;
            self.cumulative_diff = 0.0;
        }

        let resynced = diff.abs() >= NOSYNC_THRESHOLD;
        if resynced {
            clock.write(pts_seconds);
        }

        SyncEvaluation {
            diff,
            plan,
            resynced,
        }
    }
}

impl Default for SyncEstimator {
    fn default() -> Self {
        Self::new()
    }
}
