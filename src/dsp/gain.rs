//! Gain Ramp
//!
//! Click-free output gain shared by every effect unit.
//! A change of target gain is spread linearly over a fixed number of
//! samples instead of being applied as a step.

use serde::Serialize;

// ============================================================================
// Constants
// ============================================================================

/// Number of samples a gain change is ramped over
pub const RAMP_SAMPLES: u32 = 256;

/// Minimum gain in dB; anything at or below is silence
pub const GAIN_MIN_DB: f32 = -80.0;

/// Maximum gain in dB
pub const GAIN_MAX_DB: f32 = 10.0;

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert decibels to linear amplitude
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear amplitude. Values at or below [`GAIN_MIN_DB`] map to exactly 0.
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    if db <= GAIN_MIN_DB {
        0.0
    } else {
        10.0_f32.powf(db / 20.0)
    }
}

/// Convert linear amplitude to decibels
///
/// # Arguments
/// * `linear` - Linear amplitude value
///
/// # Returns
/// Value in decibels. Zero or negative input floors at [`GAIN_MIN_DB`].
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        GAIN_MIN_DB
    } else {
        20.0 * linear.log10()
    }
}

// ============================================================================
// Gain Ramp
// ============================================================================

/// Linear gain smoother
///
/// `set_gain_db` only moves the target; the audible gain follows one step
/// per call to [`GainRamp::next_sample`] and lands on the target after
/// [`RAMP_SAMPLES`] steps.
///
/// # Example
/// ```
/// use blockfx::dsp::GainRamp;
///
/// let mut ramp = GainRamp::new(0.0);
/// ramp.set_gain_db(-80.0);
/// for _ in 0..256 {
///     ramp.next_sample();
/// }
/// assert_eq!(ramp.current_gain(), 0.0);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct GainRamp {
    target_gain: f32,
    #[serde(skip)]
    current_gain: f32,
    #[serde(skip)]
    ramp_samples_left: u32,
}

impl GainRamp {
    /// Create a ramp already settled at `gain_db`
    pub fn new(gain_db: f32) -> Self {
        let gain = db_to_linear(gain_db);
        Self {
            target_gain: gain,
            current_gain: gain,
            ramp_samples_left: 0,
        }
    }

    /// Set a new target gain and restart the ramp
    pub fn set_gain_db(&mut self, db: f32) {
        self.target_gain = db_to_linear(db);
        self.ramp_samples_left = RAMP_SAMPLES;
    }

    /// Target gain in decibels
    pub fn gain_db(&self) -> f32 {
        linear_to_db(self.target_gain)
    }

    /// Target gain as a linear multiplier
    pub fn target_gain(&self) -> f32 {
        self.target_gain
    }

    /// Gain currently applied
    pub fn current_gain(&self) -> f32 {
        self.current_gain
    }

    /// Samples left until the target is reached
    pub fn ramp_samples_left(&self) -> u32 {
        self.ramp_samples_left
    }

    /// Whether a ramp is in progress
    pub fn is_ramping(&self) -> bool {
        self.ramp_samples_left > 0
    }

    /// Snap to the target with no audible ramp
    pub fn reset(&mut self) {
        self.current_gain = self.target_gain;
        self.ramp_samples_left = 0;
    }

    /// Advance one sample and return the gain to apply to it
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if self.ramp_samples_left > 0 {
            let delta = (self.target_gain - self.current_gain) / self.ramp_samples_left as f32;
            self.ramp_samples_left -= 1;
            if self.ramp_samples_left == 0 {
                // a + (b - a) is not always b in f32
                self.current_gain = self.target_gain;
            } else {
                self.current_gain += delta;
            }
        }
        self.current_gain
    }
}

impl Default for GainRamp {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
