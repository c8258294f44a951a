//! Audio buffer type for block processing
//!
//! Interleaved storage matching what hosts hand to a unit, plus level
//! measurement and a few generated test signals.

use std::f64::consts::PI;

use crate::dsp::GAIN_MIN_DB;
use crate::error::{FxError, Result};

/// Interleaved audio buffer
///
/// Samples are stored in interleaved format: [L0, R0, L1, R1, ...]
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved sample data
    samples: Vec<f32>,
    /// Number of channels (1 = mono, 2 = stereo)
    num_channels: usize,
    /// Sample rate in Hz
    sample_rate: u32,
}

impl AudioBuffer {
    /// Create a silent buffer
    pub fn new(num_channels: usize, num_frames: usize, sample_rate: u32) -> Self {
        Self {
            samples: vec![0.0; num_channels * num_frames],
            num_channels,
            sample_rate,
        }
    }

    /// Create a buffer from existing interleaved samples
    pub fn from_interleaved(
        samples: Vec<f32>,
        num_channels: usize,
        sample_rate: u32,
    ) -> Result<Self> {
        if num_channels == 0 || samples.len() % num_channels != 0 {
            return Err(FxError::InvalidParameterValue {
                name: "num_channels".to_string(),
                reason: format!(
                    "sample count {} is not divisible by channel count {}",
                    samples.len(),
                    num_channels
                ),
            });
        }
        Ok(Self {
            samples,
            num_channels,
            sample_rate,
        })
    }

    /// Same sine on every channel
    pub fn sine(
        num_channels: usize,
        num_frames: usize,
        sample_rate: u32,
        frequency: f64,
        amplitude: f32,
    ) -> Self {
        let mut buffer = Self::new(num_channels, num_frames, sample_rate);
        for frame in 0..num_frames {
            let t = frame as f64 / sample_rate as f64;
            let value = (2.0 * PI * frequency * t).sin() as f32 * amplitude;
            for channel in 0..num_channels {
                buffer.set(frame, channel, value);
            }
        }
        buffer
    }

    /// Unit impulse on the first frame of every channel
    pub fn impulse(num_channels: usize, num_frames: usize, sample_rate: u32) -> Self {
        let mut buffer = Self::new(num_channels, num_frames, sample_rate);
        for channel in 0..num_channels {
            buffer.set(0, channel, 1.0);
        }
        buffer
    }

    /// Rising ramp from -1 to just below 1, repeating every `period` frames
    pub fn ramp(num_channels: usize, num_frames: usize, sample_rate: u32, period: usize) -> Self {
        let period = period.max(1);
        let mut buffer = Self::new(num_channels, num_frames, sample_rate);
        for frame in 0..num_frames {
            let value = 2.0 * (frame % period) as f32 / period as f32 - 1.0;
            for channel in 0..num_channels {
                buffer.set(frame, channel, value);
            }
        }
        buffer
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of frames (samples per channel)
    pub fn num_frames(&self) -> usize {
        if self.num_channels == 0 {
            0
        } else {
            self.samples.len() / self.num_channels
        }
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get a reference to all interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Get a mutable reference to all interleaved samples
    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    /// Get a sample at the given frame and channel
    pub fn get(&self, frame: usize, channel: usize) -> Option<f32> {
        if frame < self.num_frames() && channel < self.num_channels {
            Some(self.samples[frame * self.num_channels + channel])
        } else {
            None
        }
    }

    /// Set a sample at the given frame and channel
    pub fn set(&mut self, frame: usize, channel: usize, value: f32) {
        if frame < self.num_frames() && channel < self.num_channels {
            self.samples[frame * self.num_channels + channel] = value;
        }
    }

    /// Check if buffer contains valid audio (no NaN/Inf)
    pub fn is_valid(&self) -> bool {
        self.samples.iter().all(|&s| s.is_finite() && s.abs() <= 16.0)
    }

    /// RMS level in dB for a channel, floored at -80 dB
    pub fn rms_db(&self, channel: usize) -> f32 {
        if channel >= self.num_channels || self.num_frames() == 0 {
            return GAIN_MIN_DB;
        }

        let sum_sq: f64 = self
            .samples
            .iter()
            .skip(channel)
            .step_by(self.num_channels)
            .map(|&s| (s as f64).powi(2))
            .sum();

        let rms = (sum_sq / self.num_frames() as f64).sqrt();
        to_db(rms)
    }

    /// Peak level in dB for a channel, floored at -80 dB
    pub fn peak_db(&self, channel: usize) -> f32 {
        if channel >= self.num_channels {
            return GAIN_MIN_DB;
        }

        let peak: f32 = self
            .samples
            .iter()
            .skip(channel)
            .step_by(self.num_channels)
            .map(|&s| s.abs())
            .fold(0.0f32, f32::max);

        to_db(peak as f64)
    }
}

fn to_db(linear: f64) -> f32 {
    if linear > 0.0 {
        ((20.0 * linear.log10()) as f32).max(GAIN_MIN_DB)
    } else {
        GAIN_MIN_DB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_from_interleaved_checks_layout() {
        assert!(AudioBuffer::from_interleaved(vec![0.0; 6], 2, 48000).is_ok());
        assert!(AudioBuffer::from_interleaved(vec![0.0; 5], 2, 48000).is_err());
        assert!(AudioBuffer::from_interleaved(vec![0.0; 4], 0, 48000).is_err());
    }

    #[test]
    fn test_get_set_interleaving() {
        let mut buffer = AudioBuffer::new(2, 4, 48000);
        buffer.set(1, 1, 0.5);
        assert_eq!(buffer.samples()[3], 0.5);
        assert_eq!(buffer.get(1, 1), Some(0.5));
        assert_eq!(buffer.get(4, 0), None);
    }

    #[test]
    fn test_sine_levels() {
        let buffer = AudioBuffer::sine(1, 48000, 48000, 1000.0, 1.0);
        // Full-scale sine: peak 0 dB, RMS -3 dB
        assert_abs_diff_eq!(buffer.peak_db(0), 0.0, epsilon = 0.01);
        assert_abs_diff_eq!(buffer.rms_db(0), -3.01, epsilon = 0.05);
    }

    #[test]
    fn test_silence_floors() {
        let buffer = AudioBuffer::new(2, 16, 48000);
        assert_eq!(buffer.rms_db(0), GAIN_MIN_DB);
        assert_eq!(buffer.peak_db(1), GAIN_MIN_DB);
        assert_eq!(buffer.peak_db(5), GAIN_MIN_DB);
    }

    #[test]
    fn test_impulse_and_ramp() {
        let impulse = AudioBuffer::impulse(2, 8, 1000);
        assert_eq!(&impulse.samples()[..4], &[1.0, 1.0, 0.0, 0.0]);

        let ramp = AudioBuffer::ramp(1, 6, 1000, 4);
        assert_eq!(ramp.samples(), &[-1.0, -0.5, 0.0, 0.5, -1.0, -0.5]);
        assert!(ramp.is_valid());
    }
}
