//! Host Adapter
//!
//! The surface a host audio engine drives: a registry of effect kinds with
//! their immutable descriptor tables, and `DspUnit`, a typed handle that
//! walks one effect instance through create/reset/process/release.

mod unit;

pub use unit::{BufferLayout, DspUnit, Negotiation, ProcessStatus, UnitState};

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::HostConfig;
use crate::dsp::{
    Doubler, Downsampler, Effect, EffectDescriptor, DOUBLER_DESCRIPTOR, DOWNSAMPLER_DESCRIPTOR,
};
use crate::error::{FxError, Result};

/// The effect units this crate provides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    Downsampler,
    Doubler,
}

impl EffectKind {
    pub const ALL: [EffectKind; 2] = [EffectKind::Downsampler, EffectKind::Doubler];

    /// Parameter table of this kind
    pub fn descriptor(self) -> &'static EffectDescriptor {
        match self {
            EffectKind::Downsampler => &DOWNSAMPLER_DESCRIPTOR,
            EffectKind::Doubler => &DOUBLER_DESCRIPTOR,
        }
    }

    /// Identifier used in presets and on the command line
    pub fn as_str(self) -> &'static str {
        match self {
            EffectKind::Downsampler => "downsampler",
            EffectKind::Doubler => "doubler",
        }
    }

    /// Look up a kind by identifier
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| FxError::UnknownEffect {
                name: name.to_string(),
            })
    }

    /// Build a new instance for the given host settings
    ///
    /// This is the only place effect state is allocated.
    pub fn instantiate(self, config: &HostConfig) -> Result<Box<dyn Effect>> {
        Ok(match self {
            EffectKind::Downsampler => Box::new(Downsampler::new()),
            EffectKind::Doubler => Box::new(Doubler::new(config.sample_rate, config.speaker_mode)?),
        })
    }
}

impl FromStr for EffectKind {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
