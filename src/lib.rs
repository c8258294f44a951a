//! blockfx - Block-Based Audio Effect Units
//!
//! Two effects a host audio engine drives once per callback:
//! - Downsampler: sample-and-hold rate reduction with optional noise
//! - Doubler: per-channel short delay mixed with the dry signal
//!
//! # Architecture
//!
//! - `dsp`: the effects, their shared gain ramp and parameter tables
//! - `host`: `DspUnit`, the lifecycle and query/process surface a host calls
//! - `config`: host settings and parameter presets as JSON
//! - `buffer`: interleaved buffers and level measurement for offline runs

pub mod buffer;
pub mod cli;
pub mod config;
pub mod dsp;
pub mod error;
pub mod host;

pub use buffer::AudioBuffer;
pub use config::{HostConfig, Preset, SpeakerMode};
pub use error::{FxError, Result};
pub use host::{DspUnit, EffectKind};
