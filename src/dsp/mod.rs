//! DSP Effects Library
//!
//! Block-based effect units driven once per host audio callback.
//! All effects implement the `Effect` trait for uniform processing.

mod delay_line;
mod doubler;
mod downsampler;
mod effect;
mod gain;
mod params;

pub use delay_line::DelayLine;
pub use doubler::{channels_for, Doubler, DoublerParam, DOUBLER_DESCRIPTOR};
pub use downsampler::{Downsampler, DownsamplerParam, DOWNSAMPLER_DESCRIPTOR};
pub use effect::{mix, Effect, EffectParams};
pub use gain::{db_to_linear, linear_to_db, GainRamp, GAIN_MAX_DB, GAIN_MIN_DB, RAMP_SAMPLES};
pub use params::{EffectDescriptor, ParamDescriptor, ParamKind};

/// Most interleaved channels a unit accepts
pub const MAX_CHANNELS: usize = 32;
