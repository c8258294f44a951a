//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::info;
use serde::Serialize;
use serde_json::{json, Value};

use super::Signal;
use crate::buffer::AudioBuffer;
use crate::config::{HostConfig, Preset};
use crate::dsp::MAX_CHANNELS;
use crate::error::{FxError, Result};
use crate::host::{BufferLayout, DspUnit, EffectKind, ProcessStatus};

/// Level statistics of one channel before and after processing
#[derive(Debug, Clone, Serialize)]
pub struct ChannelReport {
    pub channel: usize,
    pub input_rms_db: f32,
    pub input_peak_db: f32,
    pub output_rms_db: f32,
    pub output_peak_db: f32,
}

/// Summary printed by `render`
#[derive(Debug, Clone, Serialize)]
pub struct RenderReport {
    pub effect: EffectKind,
    pub sample_rate: u32,
    pub frames: usize,
    pub blocks: usize,
    pub params: Value,
    pub channels: Vec<ChannelReport>,
}

/// Descriptor tables as JSON
pub fn describe_json(effect: Option<EffectKind>) -> Result<Value> {
    let kinds: Vec<EffectKind> = match effect {
        Some(kind) => vec![kind],
        None => EffectKind::ALL.to_vec(),
    };
    let tables = kinds
        .into_iter()
        .map(|kind| {
            Ok(json!({
                "effect": kind,
                "descriptor": serde_json::to_value(kind.descriptor())?,
            }))
        })
        .collect::<Result<Vec<Value>>>()?;
    Ok(Value::Array(tables))
}

/// Print descriptor tables.
pub fn describe(effect: Option<EffectKind>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&describe_json(effect)?)?);
    Ok(())
}

/// Run `input` through a freshly created unit block by block
pub fn render_buffer(
    effect: EffectKind,
    preset: Option<&Preset>,
    config: &HostConfig,
    input: &AudioBuffer,
) -> Result<(AudioBuffer, RenderReport)> {
    let channels = input.num_channels();
    if channels == 0 {
        return Err(FxError::UnsupportedChannels {
            channels,
            max: MAX_CHANNELS,
        });
    }
    let mut unit = DspUnit::create_with(effect, config)?;
    if let Some(preset) = preset {
        preset.apply(&mut unit)?;
    }
    unit.reset()?;

    let negotiation = unit.query(BufferLayout::from_channels(channels), false)?;
    let mut output = AudioBuffer::new(
        negotiation.output.channels,
        input.num_frames(),
        input.sample_rate(),
    );

    let block = config.block_size.max(1) * channels;
    let mut blocks = 0;
    for (in_block, out_block) in input
        .samples()
        .chunks(block)
        .zip(output.samples_mut().chunks_mut(block))
    {
        let length = in_block.len() / channels;
        let status = unit.process(
            in_block,
            out_block,
            length,
            channels,
            negotiation.output.channels,
        )?;
        debug_assert_eq!(status, ProcessStatus::Ok);
        blocks += 1;
    }

    let params = unit.effect()?.get_params();
    unit.release();

    let report = RenderReport {
        effect,
        sample_rate: config.sample_rate,
        frames: input.num_frames(),
        blocks,
        params,
        channels: (0..channels)
            .map(|channel| ChannelReport {
                channel,
                input_rms_db: input.rms_db(channel),
                input_peak_db: input.peak_db(channel),
                output_rms_db: output.rms_db(channel),
                output_peak_db: output.peak_db(channel),
            })
            .collect(),
    };
    Ok((output, report))
}

/// Render a generated signal and print the level report.
pub fn render(
    effect: EffectKind,
    preset: Option<&Path>,
    config: Option<&Path>,
    frames: usize,
    signal: Signal,
    frequency: f64,
) -> Result<()> {
    let config = match config {
        Some(path) => HostConfig::load(path)?,
        None => HostConfig::default(),
    };
    let preset = preset.map(Preset::load).transpose()?;

    let channels = config.channels();
    info!(
        "Rendering {} frames of {:?} through {} ({} ch @ {} Hz)",
        frames, signal, effect, channels, config.sample_rate
    );

    let input = match signal {
        Signal::Sine => AudioBuffer::sine(channels, frames, config.sample_rate, frequency, 0.8),
        Signal::Impulse => AudioBuffer::impulse(channels, frames, config.sample_rate),
        Signal::Ramp => AudioBuffer::ramp(channels, frames, config.sample_rate, 100),
    };

    let (_, report) = render_buffer(effect, preset.as_ref(), &config, &input)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpeakerMode;

    #[test]
    fn test_describe_json_all() {
        let tables = describe_json(None).unwrap();
        let tables = tables.as_array().unwrap();
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0]["effect"], json!("downsampler"));
        assert_eq!(tables[1]["descriptor"]["name"], json!("Doubler"));
    }

    #[test]
    fn test_describe_json_single() {
        let tables = describe_json(Some(EffectKind::Doubler)).unwrap();
        let params = tables[0]["descriptor"]["params"].as_array().unwrap();
        assert_eq!(params.len(), 4);
        assert_eq!(params[0]["key"], json!("left_time_ms"));
    }

    #[test]
    fn test_render_buffer_applies_preset() {
        let config = HostConfig {
            sample_rate: 8000,
            speaker_mode: SpeakerMode::Stereo,
            block_size: 100,
        };
        let input = AudioBuffer::sine(2, 1050, 8000, 200.0, 0.5);
        let preset = Preset::new(EffectKind::Downsampler)
            .with_param("gain_db", json!(-80.0))
            .with_param("sample_count", json!(8));

        let (output, report) =
            render_buffer(EffectKind::Downsampler, Some(&preset), &config, &input).unwrap();

        assert_eq!(report.blocks, 11);
        assert_eq!(report.params["sample_count"], json!(8));
        assert_eq!(output.num_frames(), 1050);
        // Reset before rendering snaps the gain, so everything is silent
        assert!(output.samples().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_render_buffer_rejects_mismatched_preset() {
        let input = AudioBuffer::impulse(2, 16, 48000);
        let preset = Preset::new(EffectKind::Doubler);
        let err = render_buffer(
            EffectKind::Downsampler,
            Some(&preset),
            &HostConfig::default(),
            &input,
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER_VALUE");
    }
}
