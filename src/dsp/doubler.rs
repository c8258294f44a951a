//! Doubler Effect
//!
//! Short per-channel delay blended with the dry signal. Each channel owns
//! a one-second ring buffer; the delay is the distance between that
//! buffer's write and read cursors.

use crate::config::SpeakerMode;
use crate::dsp::delay_line::DelayLine;
use crate::dsp::effect::{block_span, bypass, mix, param_error, Effect, EffectParams};
use crate::dsp::gain::{GainRamp, GAIN_MAX_DB, GAIN_MIN_DB};
use crate::dsp::params::{EffectDescriptor, ParamDescriptor};
use crate::error::{FxError, Result};
use crate::impl_effect_common;
use serde::Serialize;

// ============================================================================
// Constants
// ============================================================================

/// Default delay of even (left) channels in milliseconds
const DEFAULT_LEFT_TIME_MS: f32 = 20.0;

/// Default delay of odd (right) channels in milliseconds
const DEFAULT_RIGHT_TIME_MS: f32 = 30.0;

/// Longest delay exposed to the host; the buffers hold one second
const MAX_TIME_MS: f32 = 500.0;

// ============================================================================
// Parameters
// ============================================================================

/// Parameter indices, in descriptor table order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoublerParam {
    LeftTime = 0,
    RightTime = 1,
    Mix = 2,
    Gain = 3,
}

impl DoublerParam {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::LeftTime),
            1 => Some(Self::RightTime),
            2 => Some(Self::Mix),
            3 => Some(Self::Gain),
            _ => None,
        }
    }
}

const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor::float(
        "left_time_ms",
        "Left Time",
        "ms",
        "Delay of the left channels in ms. 0 to 500. Default = 20",
        0.0,
        MAX_TIME_MS,
        DEFAULT_LEFT_TIME_MS,
    ),
    ParamDescriptor::float(
        "right_time_ms",
        "Right Time",
        "ms",
        "Delay of the right channels in ms. 0 to 500. Default = 30",
        0.0,
        MAX_TIME_MS,
        DEFAULT_RIGHT_TIME_MS,
    ),
    ParamDescriptor::float(
        "mix",
        "Mix",
        "",
        "Delayed/dry blend, 1 = delayed only. 0 to 1. Default = 0.5",
        0.0,
        1.0,
        0.5,
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

/// Host-facing description of the doubler
pub static DOUBLER_DESCRIPTOR: EffectDescriptor = EffectDescriptor {
    name: "Doubler",
    version: 0x0001_0000,
    num_input_buffers: 1,
    num_output_buffers: 1,
    params: PARAMS,
};

/// Number of delay lines for a speaker layout
///
/// Mono gets one, quad four; everything else is treated as stereo.
pub fn channels_for(speaker_mode: SpeakerMode) -> usize {
    match speaker_mode {
        SpeakerMode::Mono => 1,
        SpeakerMode::Stereo => 2,
        SpeakerMode::Quad => 4,
        _ => 2,
    }
}

// ============================================================================
// Doubler Effect
// ============================================================================

/// Per-channel delay doubler
///
/// Even channels follow the left time, odd channels the right time.
/// Changing the mix clears every delay line.
#[derive(Debug, Clone, Serialize)]
pub struct Doubler {
    params: EffectParams,
    speaker_mode: SpeakerMode,
    /// Left/right delay in milliseconds as last set by the host
    time_ms: [f32; 2],
    mix: f32,
    gain: GainRamp,
    /// Delay of each line in seconds
    #[serde(skip)]
    time_seconds: Vec<f32>,
    #[serde(skip)]
    lines: Vec<DelayLine>,
    #[serde(skip)]
    sample_rate: u32,
}

impl Doubler {
    /// Allocate one second of delay per channel and park every write
    /// cursor at its configured offset
    ///
    /// # Arguments
    /// * `sample_rate` - Host sample rate in Hz; also the buffer length
    /// * `speaker_mode` - Host layout, decides the channel count
    ///
    /// # Errors
    /// `FxError::OutOfMemory` if a buffer cannot be allocated.
    pub fn new(sample_rate: u32, speaker_mode: SpeakerMode) -> Result<Self> {
        let channel_count = channels_for(speaker_mode);

        let mut lines = Vec::new();
        lines
            .try_reserve_exact(channel_count)
            .map_err(|e| FxError::OutOfMemory {
                details: format!("{} delay lines: {}", channel_count, e),
            })?;
        for _ in 0..channel_count {
            lines.push(DelayLine::with_capacity(sample_rate as usize)?);
        }

        let time_seconds = (0..channel_count)
            .map(|c| {
                if c % 2 == 0 {
                    DEFAULT_LEFT_TIME_MS / 1000.0
                } else {
                    DEFAULT_RIGHT_TIME_MS / 1000.0
                }
            })
            .collect();

        let mut doubler = Self {
            params: EffectParams::default(),
            speaker_mode,
            time_ms: [DEFAULT_LEFT_TIME_MS, DEFAULT_RIGHT_TIME_MS],
            mix: 0.5,
            gain: GainRamp::new(0.0),
            time_seconds,
            lines,
            sample_rate,
        };
        doubler.clear();
        Ok(doubler)
    }

    pub fn channel_count(&self) -> usize {
        self.lines.len()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn speaker_mode(&self) -> SpeakerMode {
        self.speaker_mode
    }

    /// Length of each delay line in samples
    pub fn buffer_size(&self) -> usize {
        self.lines.first().map(DelayLine::capacity).unwrap_or(0)
    }

    /// Delay of one channel in milliseconds
    pub fn time_ms(&self, channel: usize) -> Option<f32> {
        self.time_seconds.get(channel).map(|s| s * 1000.0)
    }

    /// Current write-to-read distance of one channel in samples
    pub fn delay_samples(&self, channel: usize) -> Option<usize> {
        self.lines.get(channel).map(DelayLine::offset)
    }

    /// Change one channel's delay
    ///
    /// The write cursor moves by the difference in samples; the buffer
    /// content is kept. Channels without a delay line are ignored.
    pub fn set_time(&mut self, channel: usize, milliseconds: f32) {
        let Some(line) = self.lines.get_mut(channel) else {
            return;
        };
        let seconds = milliseconds / 1000.0;
        // Offsets are reduced first so extreme times cannot overflow
        let capacity = line.capacity() as isize;
        let new_offset = offset_samples(seconds, self.sample_rate).rem_euclid(capacity);
        let old_offset =
            offset_samples(self.time_seconds[channel], self.sample_rate).rem_euclid(capacity);
        line.shift_write(new_offset - old_offset);
        self.time_seconds[channel] = seconds;
    }

    /// Left time as reported to the host
    pub fn left_time_ms(&self) -> f32 {
        self.time_ms[0]
    }

    /// Set the delay of every even channel
    pub fn set_left_time_ms(&mut self, milliseconds: f32) {
        self.time_ms[0] = milliseconds;
        for channel in (0..self.channel_count()).step_by(2) {
            self.set_time(channel, milliseconds);
        }
    }

    /// Right time as reported to the host
    pub fn right_time_ms(&self) -> f32 {
        self.time_ms[1]
    }

    /// Set the delay of every odd channel
    pub fn set_right_time_ms(&mut self, milliseconds: f32) {
        self.time_ms[1] = milliseconds;
        for channel in (1..self.channel_count()).step_by(2) {
            self.set_time(channel, milliseconds);
        }
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    /// Set the blend and drop all delay history
    pub fn set_mix(&mut self, mix: f32) {
        self.mix = mix;
        self.clear();
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

    /// Zero every delay line and return the cursors to their configured
    /// offsets
    pub fn clear(&mut self) {
        for (line, &seconds) in self.lines.iter_mut().zip(&self.time_seconds) {
            line.clear(offset_samples(seconds, self.sample_rate));
        }
    }

    /// Whether all delay lines hold only silence
    pub fn is_silent(&self) -> bool {
        self.lines.iter().all(DelayLine::is_silent)
    }
}

/// Delay in whole samples for a time in seconds
#[inline]
fn offset_samples(seconds: f32, sample_rate: u32) -> isize {
    (seconds * sample_rate as f32).round() as isize
}

impl Effect for Doubler {
    impl_effect_common!(Doubler, "doubler", DOUBLER_DESCRIPTOR);

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
        let ratio = self.mix;

        for start in (0..span).step_by(in_channels) {
            let gain = self.gain.next_sample();
            let end = (start + in_channels).min(span);

            for pos in start..end {
                let dry = input[pos];
                // Lanes beyond the allocated lines pass through
                let delayed = match self.lines.get_mut(pos - start) {
                    Some(line) => {
                        line.push(dry);
                        line.pop()
                    }
                    None => dry,
                };
                output[pos] = mix(delayed, dry, ratio) * gain;
            }
        }
    }

    fn reset(&mut self) {
        self.gain.reset();
        self.clear();
    }

    fn on_idle(&mut self) {
        self.clear();
    }

    fn param_float(&self, index: usize) -> Result<f32> {
        match DoublerParam::from_index(index) {
            Some(DoublerParam::LeftTime) => Ok(self.left_time_ms()),
            Some(DoublerParam::RightTime) => Ok(self.right_time_ms()),
            Some(DoublerParam::Mix) => Ok(self.mix),
            Some(DoublerParam::Gain) => Ok(self.gain.gain_db()),
            None => Err(param_error(&DOUBLER_DESCRIPTOR, index, true)),
        }
    }

    fn set_param_float(&mut self, index: usize, value: f32) -> Result<()> {
        match DoublerParam::from_index(index) {
            Some(DoublerParam::LeftTime) => self.set_left_time_ms(value),
            Some(DoublerParam::RightTime) => self.set_right_time_ms(value),
            Some(DoublerParam::Mix) => self.set_mix(value),
            Some(DoublerParam::Gain) => self.set_gain_db(value),
            None => return Err(param_error(&DOUBLER_DESCRIPTOR, index, true)),
        }
        Ok(())
    }

    fn param_int(&self, index: usize) -> Result<i32> {
        Err(param_error(&DOUBLER_DESCRIPTOR, index, false))
    }

    fn set_param_int(&mut self, index: usize, _value: i32) -> Result<()> {
        Err(param_error(&DOUBLER_DESCRIPTOR, index, false))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::gain::RAMP_SAMPLES;
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    /// 1 kHz keeps buffers small so wraparound is cheap to reach
    const RATE: u32 = 1000;

    fn run(doubler: &mut Doubler, input: &[f32], channels: usize) -> Vec<f32> {
        let mut output = vec![0.0; input.len()];
        doubler.process(input, &mut output, input.len() / channels, channels, channels);
        output
    }

    fn ramp_signal(len: usize) -> Vec<f32> {
        (0..len).map(|i| ((i % 200) as f32 / 200.0) - 0.5).collect()
    }

    #[test]
    fn test_channel_count_from_speaker_mode() {
        assert_eq!(channels_for(SpeakerMode::Mono), 1);
        assert_eq!(channels_for(SpeakerMode::Stereo), 2);
        assert_eq!(channels_for(SpeakerMode::Quad), 4);
        assert_eq!(channels_for(SpeakerMode::FivePointOne), 2);
        assert_eq!(channels_for(SpeakerMode::Default), 2);
    }

    #[test]
    fn test_new_allocates_one_second_per_channel() {
        let doubler = Doubler::new(RATE, SpeakerMode::Quad).unwrap();
        assert_eq!(doubler.channel_count(), 4);
        assert_eq!(doubler.buffer_size(), RATE as usize);
        assert!(doubler.is_silent());
    }

    #[test]
    fn test_initial_offsets() {
        let doubler = Doubler::new(RATE, SpeakerMode::Quad).unwrap();
        // 20 ms and 30 ms at 1 kHz
        assert_eq!(doubler.delay_samples(0), Some(20));
        assert_eq!(doubler.delay_samples(1), Some(30));
        assert_eq!(doubler.delay_samples(2), Some(20));
        assert_eq!(doubler.delay_samples(3), Some(30));
        assert_eq!(doubler.delay_samples(4), None);
    }

    #[test]
    fn test_delayed_output_across_wraparound() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Mono).unwrap();
        doubler.set_left_time_ms(7.0);
        doubler.set_mix(0.75);

        let input = ramp_signal(3500);
        let mut output = Vec::new();
        // Uneven blocks so block boundaries and wraps do not line up
        for block in input.chunks(333) {
            output.extend(run(&mut doubler, block, 1));
        }

        let delay = 7;
        for n in 0..input.len() {
            let delayed = if n >= delay { input[n - delay] } else { 0.0 };
            assert_abs_diff_eq!(output[n], mix(delayed, input[n], 0.75), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_stereo_lanes_use_their_own_delay() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Stereo).unwrap();
        doubler.set_mix(1.0);

        let frames = 100;
        let mut input = vec![0.0; frames * 2];
        input[0] = 1.0;
        input[1] = -1.0;
        let output = run(&mut doubler, &input, 2);

        assert_eq!(output[20 * 2], 1.0);
        assert_eq!(output[30 * 2 + 1], -1.0);
        let nonzero = output.iter().filter(|&&v| v != 0.0).count();
        assert_eq!(nonzero, 2);
    }

    #[test]
    fn test_set_time_is_relative() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Stereo).unwrap();
        run(&mut doubler, &ramp_signal(2 * 137), 2);

        doubler.set_time(0, 45.0);
        assert_eq!(doubler.delay_samples(0), Some(45));
        assert_eq!(doubler.delay_samples(1), Some(30));
        assert_abs_diff_eq!(doubler.time_ms(0).unwrap(), 45.0, epsilon = 1e-4);

        doubler.set_time(0, 5.0);
        assert_eq!(doubler.delay_samples(0), Some(5));
    }

    #[test]
    fn test_set_time_extreme_values_stay_consistent() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Mono).unwrap();
        doubler.set_time(0, -1e30);
        assert!(doubler.delay_samples(0).unwrap() < doubler.buffer_size());
        doubler.set_time(0, f32::MAX);
        doubler.set_time(0, f32::INFINITY);
        doubler.set_time(0, 45.0);
        assert_eq!(doubler.delay_samples(0), Some(45));
    }

    #[test]
    fn test_set_time_out_of_range_channel_is_ignored() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Mono).unwrap();
        doubler.set_time(3, 100.0);
        doubler.set_right_time_ms(100.0);
        assert_eq!(doubler.delay_samples(0), Some(20));
        assert_eq!(doubler.right_time_ms(), 100.0);
    }

    #[test]
    fn test_zero_delay_is_identity() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Mono).unwrap();
        doubler.set_left_time_ms(0.0);
        doubler.set_mix(1.0);
        let input = ramp_signal(50);
        assert_eq!(run(&mut doubler, &input, 1), input);
    }

    #[test]
    fn test_set_mix_clears_history() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Stereo).unwrap();
        run(&mut doubler, &vec![0.8; 2 * 200], 2);
        assert!(!doubler.is_silent());

        doubler.set_mix(1.0);
        assert!(doubler.is_silent());

        let output = run(&mut doubler, &[0.5, 0.5], 2);
        assert_eq!(output, vec![0.0, 0.0]);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Stereo).unwrap();
        doubler.set_gain_db(-6.0);
        run(&mut doubler, &ramp_signal(2 * 64), 2);

        doubler.reset();
        let gain = doubler.gain().current_gain();
        let offsets = (doubler.delay_samples(0), doubler.delay_samples(1));
        doubler.reset();

        assert!(doubler.is_silent());
        assert_eq!(doubler.gain().current_gain(), gain);
        assert_eq!(doubler.gain().current_gain(), doubler.gain().target_gain());
        assert_eq!(doubler.gain().ramp_samples_left(), 0);
        assert_eq!((doubler.delay_samples(0), doubler.delay_samples(1)), offsets);
    }

    #[test]
    fn test_gain_once_per_frame() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Stereo).unwrap();
        doubler.set_left_time_ms(0.0);
        doubler.set_right_time_ms(0.0);
        doubler.set_gain_db(-80.0);

        let frames = RAMP_SAMPLES as usize + 10;
        let output = run(&mut doubler, &vec![0.5; frames * 2], 2);
        for frame in output.chunks(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(output[0] > 0.49);
        assert_eq!(output[(RAMP_SAMPLES as usize - 1) * 2], 0.0);
    }

    #[test]
    fn test_extra_input_channels_pass_through() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Mono).unwrap();
        doubler.set_mix(1.0);
        let input = [0.3, 0.6, 0.3, 0.6];
        let output = run(&mut doubler, &input, 2);
        // Lane 0 is delayed by 20 samples, lane 1 has no delay line
        assert_eq!(output, vec![0.0, 0.6, 0.0, 0.6]);
    }

    #[test]
    fn test_on_idle_clears() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Mono).unwrap();
        run(&mut doubler, &[0.9; 64], 1);
        doubler.on_idle();
        assert!(doubler.is_silent());
    }

    #[test]
    fn test_disabled_is_bypass() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Mono).unwrap();
        doubler.set_enabled(false);
        let input = ramp_signal(40);
        assert_eq!(run(&mut doubler, &input, 1), input);
        assert!(doubler.is_silent());
    }

    #[test]
    fn test_params_by_index() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Stereo).unwrap();
        doubler.set_param_float(DoublerParam::LeftTime as usize, 12.0).unwrap();
        doubler.set_param_float(DoublerParam::RightTime as usize, 18.0).unwrap();
        doubler.set_param_float(DoublerParam::Gain as usize, -3.0).unwrap();

        assert_eq!(doubler.param_float(0).unwrap(), 12.0);
        assert_eq!(doubler.param_float(1).unwrap(), 18.0);
        assert_eq!(doubler.delay_samples(0), Some(12));
        assert_eq!(doubler.delay_samples(1), Some(18));
        assert_abs_diff_eq!(doubler.param_float(3).unwrap(), -3.0, epsilon = 1e-4);

        assert_eq!(
            doubler.param_int(0).unwrap_err().error_code(),
            "PARAMETER_TYPE_MISMATCH"
        );
        assert_eq!(
            doubler.set_param_float(7, 0.0).unwrap_err().error_code(),
            "INVALID_PARAMETER_INDEX"
        );
    }

    #[test]
    fn test_json_surface() {
        let mut doubler = Doubler::new(RATE, SpeakerMode::Stereo).unwrap();
        doubler.set_param("mix", &json!(0.2)).unwrap();
        doubler.set_param("right_time_ms", &json!(40.0)).unwrap();

        let params = doubler.get_params();
        assert_abs_diff_eq!(params["mix"].as_f64().unwrap(), 0.2, epsilon = 1e-6);
        assert_eq!(params["right_time_ms"].as_f64().unwrap(), 40.0);

        let json = doubler.to_json().unwrap();
        assert_eq!(json["speaker_mode"], json!("stereo"));
        assert!(json.get("lines").is_none());
    }

    #[test]
    fn test_effect_type() {
        let doubler = Doubler::new(RATE, SpeakerMode::Stereo).unwrap();
        assert_eq!(doubler.effect_type(), "doubler");
        assert_eq!(doubler.display_name(), "Doubler");
    }
}
