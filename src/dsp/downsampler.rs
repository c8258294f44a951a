//! Downsampler Effect
//!
//! Sample-and-hold rate reduction. Each channel lane holds its sample from
//! the first frame of a hold group for `sample_count` frames, optionally
//! perturbed by noise proportional to its amplitude, then blends with the
//! untouched input through the mix control.

use crate::dsp::effect::{block_span, bypass, mix, param_error, Effect, EffectParams};
use crate::dsp::gain::{GainRamp, GAIN_MAX_DB, GAIN_MIN_DB};
use crate::dsp::params::{EffectDescriptor, ParamDescriptor};
use crate::dsp::MAX_CHANNELS;
use crate::error::Result;
use crate::impl_effect_common;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

// ============================================================================
// Parameters
// ============================================================================

/// Parameter indices, in descriptor table order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownsamplerParam {
    SampleCount = 0,
    Noise = 1,
    InputAmplitude = 2,
    Mix = 3,
    Gain = 4,
}

impl DownsamplerParam {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::SampleCount),
            1 => Some(Self::Noise),
            2 => Some(Self::InputAmplitude),
            3 => Some(Self::Mix),
            4 => Some(Self::Gain),
            _ => None,
        }
    }
}

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::int(
        "sample_count",
        "Sample Count",
        "samples",
        "Frames each held sample is repeated for. 1 to 32. Default = 4",
        1,
        32,
        4,
    ),
    ParamDescriptor::float(
        "noise",
        "Noise",
        "",
        "Noise amplitude relative to the held sample. 0 to 1. Default = 0",
        0.0,
        1.0,
        0.0,
    ),
    ParamDescriptor::float(
        "input_amplitude",
        "Input Amplitude",
        "",
        "Input gate threshold. 0 to 1. Default = 1",
        0.0,
        1.0,
        1.0,
    ),
    ParamDescriptor::float(
        "mix",
        "Mix",
        "",
        "Processed/dry blend, 1 = fully processed. 0 to 1. Default = 1",
        0.0,
        1.0,
        1.0,
    ),
    ParamDescriptor::float(
        "gain_db",
        "Gain",
        "dB",
        "Gain in dB. -80 to 10. Default = 0",
        GAIN_MIN_DB,
        GAIN_MAX_DB,
        0.0,
    ),
];

/// Host-facing description of the downsampler
pub static DOWNSAMPLER_DESCRIPTOR: EffectDescriptor = EffectDescriptor {
    name: "Downsampler",
    version: 0x0001_0000,
    num_input_buffers: 1,
    num_output_buffers: 1,
    params: PARAMS,
};

// ============================================================================
// Downsampler Effect
// ============================================================================

/// Sample-and-hold downsampler
///
/// # Parameters
/// - `sample_count`: hold length in frames (1-32)
/// - `noise`: amplitude-proportional noise on the held value (0-1)
/// - `input_amplitude`: stored and reported, not used by processing
/// - `mix`: 1 = processed only, 0 = dry only
/// - `gain_db`: ramped output gain (-80 to +10 dB)
///
/// # Example
/// ```
/// use blockfx::dsp::{Downsampler, Effect};
///
/// let mut ds = Downsampler::new();
/// let input = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
/// let mut output = [0.0; 8];
/// ds.process(&input, &mut output, 8, 1, 1);
/// assert_eq!(output, [0.1, 0.1, 0.1, 0.1, 0.5, 0.5, 0.5, 0.5]);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct Downsampler {
    params: EffectParams,
    sample_count: i32,
    noise_amplitude: f32,
    input_amplitude: f32,
    mix: f32,
    gain: GainRamp,
    /// Processed value held by each lane for the current group
    #[serde(skip)]
    held: [f32; MAX_CHANNELS],
    #[serde(skip)]
    rng: ChaCha8Rng,
}

impl Downsampler {
    /// Create a downsampler with default parameters and a randomly seeded
    /// noise source
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_rng(&mut rand::rng()))
    }

    /// Create a downsampler whose noise sequence is reproducible
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Self {
            params: EffectParams::default(),
            sample_count: 4,
            noise_amplitude: 0.0,
            input_amplitude: 1.0,
            mix: 1.0,
            gain: GainRamp::new(0.0),
            held: [0.0; MAX_CHANNELS],
            rng,
        }
    }

    pub fn sample_count(&self) -> i32 {
        self.sample_count
    }

    pub fn set_sample_count(&mut self, count: i32) {
        self.sample_count = count;
    }

    pub fn noise(&self) -> f32 {
        self.noise_amplitude
    }

    pub fn set_noise(&mut self, amplitude: f32) {
        self.noise_amplitude = amplitude;
    }

    pub fn input_amplitude(&self) -> f32 {
        self.input_amplitude
    }

    /// Store the gate threshold
    ///
    /// Kept for parameter compatibility; processing never reads it.
    pub fn set_input_amplitude(&mut self, amplitude: f32) {
        self.input_amplitude = amplitude;
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix;
    }

    pub fn gain_db(&self) -> f32 {
        self.gain.gain_db()
    }

    pub fn set_gain_db(&mut self, db: f32) {
        self.gain.set_gain_db(db);
    }

    /// The output gain ramp
    pub fn gain(&self) -> &GainRamp {
        &self.gain
    }

    /// Held value with noise injected, clamped to the sample range
    #[inline]
    fn hold_value(&mut self, held: f32) -> f32 {
        let noise = if self.noise_amplitude != 0.0 {
            held * self.noise_amplitude * self.rng.random_range(-1.0f32..1.0)
        } else {
            0.0
        };
        (held + noise).clamp(-1.0, 1.0)
    }
}

impl Default for Downsampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Downsampler {
    impl_effect_common!(Downsampler, "downsampler", DOWNSAMPLER_DESCRIPTOR);

    fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        length: usize,
        in_channels: usize,
        _out_channels: usize,
    ) {
        if in_channels == 0 {
            return;
        }
        if !self.params.enabled {
            bypass(input, output, length, in_channels);
            return;
        }

        let span = block_span(input, output, length, in_channels);
        // Zero would never start a new group
        let hold = self.sample_count.max(1) as usize;
        let ratio = self.mix;

        for (frame, start) in (0..span).step_by(in_channels).enumerate() {
            let gain = self.gain.next_sample();
            let end = (start + in_channels).min(span);

            if frame % hold == 0 {
                for pos in start..end.min(start + MAX_CHANNELS) {
                    let value = self.hold_value(input[pos]);
                    self.held[pos - start] = value;
                }
            }

            for pos in start..end {
                let dry = input[pos];
                // Lanes past MAX_CHANNELS have no hold slot and stay dry
                let processed = self.held.get(pos - start).copied().unwrap_or(dry);
                output[pos] = mix(processed, dry, ratio) * gain;
            }
        }
    }

    fn reset(&mut self) {
        self.gain.reset();
        self.held = [0.0; MAX_CHANNELS];
    }

    fn param_float(&self, index: usize) -> Result<f32> {
        match DownsamplerParam::from_index(index) {
            Some(DownsamplerParam::Noise) => Ok(self.noise_amplitude),
            Some(DownsamplerParam::InputAmplitude) => Ok(self.input_amplitude),
            Some(DownsamplerParam::Mix) => Ok(self.mix),
            Some(DownsamplerParam::Gain) => Ok(self.gain.gain_db()),
            _ => Err(param_error(&DOWNSAMPLER_DESCRIPTOR, index, true)),
        }
    }

    fn set_param_float(&mut self, index: usize, value: f32) -> Result<()> {
        match DownsamplerParam::from_index(index) {
            Some(DownsamplerParam::Noise) => self.set_noise(value),
            Some(DownsamplerParam::InputAmplitude) => self.set_input_amplitude(value),
            Some(DownsamplerParam::Mix) => self.set_mix(value),
            Some(DownsamplerParam::Gain) => self.set_gain_db(value),
            _ => return Err(param_error(&DOWNSAMPLER_DESCRIPTOR, index, true)),
        }
        Ok(())
    }

    fn param_int(&self, index: usize) -> Result<i32> {
        match DownsamplerParam::from_index(index) {
            Some(DownsamplerParam::SampleCount) => Ok(self.sample_count),
            _ => Err(param_error(&DOWNSAMPLER_DESCRIPTOR, index, false)),
        }
    }

    fn set_param_int(&mut self, index: usize, value: i32) -> Result<()> {
        match DownsamplerParam::from_index(index) {
            Some(DownsamplerParam::SampleCount) => {
                self.set_sample_count(value);
                Ok(())
            }
            _ => Err(param_error(&DOWNSAMPLER_DESCRIPTOR, index, false)),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
