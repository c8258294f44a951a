//! Host and preset configuration
//!
//! `HostConfig` carries what a host reports when a unit is created
//! (sample rate, speaker layout, block size). `Preset` holds named
//! parameter values for one effect kind. Both load from JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FxError, Result};
use crate::host::{DspUnit, EffectKind};

/// Default host sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Default host block size in frames
pub const DEFAULT_BLOCK_SIZE: usize = 512;

// ============================================================================
// Speaker Mode
// ============================================================================

/// Host speaker layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerMode {
    /// Host default layout
    Default,
    /// Channel count without a speaker assignment
    Raw,
    Mono,
    #[default]
    Stereo,
    Quad,
    Surround,
    #[serde(rename = "5.1")]
    FivePointOne,
    #[serde(rename = "7.1")]
    SevenPointOne,
    #[serde(rename = "7.1.4")]
    SevenPointOneFour,
}

impl SpeakerMode {
    /// Channel count of the layout, if it defines one
    pub fn channel_count(self) -> Option<usize> {
        match self {
            SpeakerMode::Default | SpeakerMode::Raw => None,
            SpeakerMode::Mono => Some(1),
            SpeakerMode::Stereo => Some(2),
            SpeakerMode::Quad => Some(4),
            SpeakerMode::Surround => Some(5),
            SpeakerMode::FivePointOne => Some(6),
            SpeakerMode::SevenPointOne => Some(8),
            SpeakerMode::SevenPointOneFour => Some(12),
        }
    }

    /// Layout matching a bare channel count
    pub fn from_channel_count(channels: usize) -> Self {
        match channels {
            1 => SpeakerMode::Mono,
            2 => SpeakerMode::Stereo,
            4 => SpeakerMode::Quad,
            5 => SpeakerMode::Surround,
            6 => SpeakerMode::FivePointOne,
            8 => SpeakerMode::SevenPointOne,
            12 => SpeakerMode::SevenPointOneFour,
            _ => SpeakerMode::Raw,
        }
    }
}

// ============================================================================
// Host Config
// ============================================================================

/// Settings a host reports at unit creation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Speaker layout of the unit's bus
    pub speaker_mode: SpeakerMode,
    /// Frames per process call
    pub block_size: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            speaker_mode: SpeakerMode::default(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl HostConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading host config: {}", path.display());
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Channel count of the configured layout, stereo if it has none
    pub fn channels(&self) -> usize {
        self.speaker_mode.channel_count().unwrap_or(2)
    }
}

// ============================================================================
// Preset
// ============================================================================

/// Named parameter values for one effect kind
///
/// ```json
/// { "effect": "downsampler", "params": { "sample_count": 8, "mix": 0.5 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub effect: EffectKind,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl Preset {
    pub fn new(effect: EffectKind) -> Self {
        Self {
            effect,
            params: BTreeMap::new(),
        }
    }

    /// Builder-style parameter insertion
    pub fn with_param(mut self, key: &str, value: Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading preset: {}", path.display());
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Apply every value to an initialized unit
    ///
    /// Values go through the unit's setters and are clamped to the
    /// descriptor range there.
    pub fn apply(&self, unit: &mut DspUnit) -> Result<()> {
        if self.effect != unit.kind() {
            return Err(FxError::InvalidParameterValue {
                name: "effect".to_string(),
                reason: format!("preset is for {}, not {}", self.effect, unit.kind()),
            });
        }
        for (key, value) in &self.params {
            unit.set_param(key, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_speaker_channel_counts() {
        assert_eq!(SpeakerMode::Mono.channel_count(), Some(1));
        assert_eq!(SpeakerMode::Quad.channel_count(), Some(4));
        assert_eq!(SpeakerMode::Raw.channel_count(), None);
        assert_eq!(SpeakerMode::from_channel_count(6), SpeakerMode::FivePointOne);
        assert_eq!(SpeakerMode::from_channel_count(3), SpeakerMode::Raw);
    }

    #[test]
    fn test_host_config_defaults() {
        let config = HostConfig::from_json_str("{}").unwrap();
        assert_eq!(config, HostConfig::default());
        assert_eq!(config.channels(), 2);
    }

    #[test]
    fn test_host_config_partial() {
        let config =
            HostConfig::from_json_str(r#"{ "sample_rate": 44100, "speaker_mode": "quad" }"#)
                .unwrap();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.speaker_mode, SpeakerMode::Quad);
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(config.channels(), 4);
    }

    #[test]
    fn test_speaker_mode_names() {
        let config = HostConfig::from_json_str(r#"{ "speaker_mode": "7.1" }"#).unwrap();
        assert_eq!(config.speaker_mode, SpeakerMode::SevenPointOne);
    }

    #[test]
    fn test_preset_load_and_save() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "effect": "doubler", "params": {{ "mix": 0.25, "left_time_ms": 12.0 }} }}"#
        )
        .unwrap();

        let preset = Preset::load(file.path()).unwrap();
        assert_eq!(preset.effect, EffectKind::Doubler);
        assert_eq!(preset.params["mix"], json!(0.25));

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("preset.json");
        preset.save(&out).unwrap();
        assert_eq!(Preset::load(&out).unwrap(), preset);
    }

    #[test]
    fn test_preset_values_are_clamped() {
        let host = HostConfig {
            sample_rate: 1000,
            ..HostConfig::default()
        };
        let mut unit = DspUnit::create_with(EffectKind::Doubler, &host).unwrap();
        Preset::new(EffectKind::Doubler)
            .with_param("mix", json!(3.0))
            .with_param("left_time_ms", json!(-1e30))
            .with_param("right_time_ms", json!(1e30))
            .apply(&mut unit)
            .unwrap();

        assert_eq!(unit.param_float(0).unwrap().0, 0.0);
        assert_eq!(unit.param_float(1).unwrap().0, 500.0);
        assert_eq!(unit.param_float(2).unwrap().0, 1.0);
    }

    #[test]
    fn test_preset_int_values_saturate() {
        let mut unit =
            DspUnit::create_with(EffectKind::Downsampler, &HostConfig::default()).unwrap();
        Preset::new(EffectKind::Downsampler)
            .with_param("sample_count", json!(4_294_967_300i64))
            .apply(&mut unit)
            .unwrap();
        assert_eq!(unit.param_int(0).unwrap().0, 32);

        Preset::new(EffectKind::Downsampler)
            .with_param("sample_count", json!(-4_294_967_300i64))
            .apply(&mut unit)
            .unwrap();
        assert_eq!(unit.param_int(0).unwrap().0, 1);
    }

    #[test]
    fn test_preset_for_other_effect_is_rejected() {
        let mut unit =
            DspUnit::create_with(EffectKind::Downsampler, &HostConfig::default()).unwrap();
        let err = Preset::new(EffectKind::Doubler).apply(&mut unit).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_PARAMETER_VALUE");
    }

    #[test]
    fn test_preset_missing_file() {
        let err = Preset::load(Path::new("/nonexistent/preset.json")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
