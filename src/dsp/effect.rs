//! Effect trait definition
//!
//! Base trait for the effect units. Processing works on interleaved
//! input/output slices supplied by the host once per block.

use crate::dsp::params::{EffectDescriptor, ParamKind};
use crate::error::{FxError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Parameters common to all effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectParams {
    /// Unique identifier for this effect instance
    pub id: String,
    /// Whether the effect is enabled
    pub enabled: bool,
}

impl Default for EffectParams {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            enabled: true,
        }
    }
}

/// Dry/wet blend: `t = 1` selects `a`, `t = 0` selects `b`
#[inline]
pub fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * t + b * (1.0 - t)
}

/// Number of interleaved positions a block call may touch
///
/// Bounded by both slices so a short buffer never overruns.
#[inline]
pub(crate) fn block_span(input: &[f32], output: &[f32], length: usize, channels: usize) -> usize {
    (length * channels).min(input.len()).min(output.len())
}

/// Copy input to output unchanged
pub(crate) fn bypass(input: &[f32], output: &mut [f32], length: usize, channels: usize) {
    let span = block_span(input, output, length, channels);
    output[..span].copy_from_slice(&input[..span]);
}

/// Base trait for all DSP effect units
///
/// `process` runs on the audio thread: implementations must not allocate,
/// lock, log or otherwise block inside it.
pub trait Effect: Send + Sync {
    /// Transform one block of interleaved samples
    ///
    /// # Arguments
    /// * `input` - Interleaved input samples
    /// * `output` - Interleaved output samples
    /// * `length` - Block length in frames
    /// * `in_channels` - Channels in `input`; also the interleave stride of `output`
    /// * `out_channels` - Channels negotiated for the output
    fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        length: usize,
        in_channels: usize,
        out_channels: usize,
    );

    /// Reset transient state
    ///
    /// Snaps gain ramps to their target and clears history buffers.
    fn reset(&mut self);

    /// Called when the host reports idle inputs during a query
    fn on_idle(&mut self) {}

    /// Get the effect type identifier
    fn effect_type(&self) -> &'static str;

    /// Get human-readable display name
    fn display_name(&self) -> &str;

    /// Parameter table for this effect
    fn descriptor(&self) -> &'static EffectDescriptor;

    /// Get the unique instance ID
    fn id(&self) -> &str;

    /// Set the unique instance ID
    fn set_id(&mut self, id: String);

    /// Check if effect is enabled
    fn is_enabled(&self) -> bool;

    /// Enable or disable the effect
    fn set_enabled(&mut self, enabled: bool);

    /// Read a float parameter by index
    fn param_float(&self, index: usize) -> Result<f32>;

    /// Write a float parameter by index; the value is taken as-is
    fn set_param_float(&mut self, index: usize, value: f32) -> Result<()>;

    /// Read an int parameter by index
    fn param_int(&self, index: usize) -> Result<i32>;

    /// Write an int parameter by index; the value is taken as-is
    fn set_param_int(&mut self, index: usize, value: i32) -> Result<()>;

    /// Serialize effect parameters to JSON
    fn to_json(&self) -> Result<Value>;

    /// Clone the effect into a boxed trait object
    fn box_clone(&self) -> Box<dyn Effect>;

    /// Get all parameters as JSON keyed by descriptor key
    fn get_params(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), json!(self.id()));
        map.insert("enabled".to_string(), json!(self.is_enabled()));
        for (index, param) in self.descriptor().params.iter().enumerate() {
            let value = match param.kind {
                ParamKind::Float { .. } => self.param_float(index).map(|v| json!(v)),
                ParamKind::Int { .. } => self.param_int(index).map(|v| json!(v)),
            };
            if let Ok(value) = value {
                map.insert(param.key.to_string(), value);
            }
        }
        Value::Object(map)
    }

    /// Set a single parameter by key
    fn set_param(&mut self, name: &str, value: &Value) -> Result<()> {
        if name == "enabled" {
            let enabled = value.as_bool().ok_or_else(|| FxError::InvalidParameterValue {
                name: name.to_string(),
                reason: format!("expected bool, got {:?}", value),
            })?;
            self.set_enabled(enabled);
            return Ok(());
        }

        let descriptor = self.descriptor();
        let index = descriptor
            .index_of(name)
            .ok_or_else(|| FxError::UnknownParameter {
                name: name.to_string(),
            })?;

        match descriptor.params[index].kind {
            ParamKind::Float { .. } => {
                let v = value.as_f64().ok_or_else(|| FxError::InvalidParameterValue {
                    name: name.to_string(),
                    reason: format!("expected number, got {:?}", value),
                })?;
                self.set_param_float(index, v as f32)
            }
            ParamKind::Int { .. } => {
                let v = value
                    .as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(|| FxError::InvalidParameterValue {
                        name: name.to_string(),
                        reason: format!("expected 32-bit integer, got {}", value),
                    })?;
                self.set_param_int(index, v)
            }
        }
    }
}

impl Clone for Box<dyn Effect> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Error for an index outside an effect's parameter table, or one whose
/// type does not match the accessor
pub(crate) fn param_error(descriptor: &EffectDescriptor, index: usize, float: bool) -> FxError {
    match descriptor.param(index) {
        Some(param) => FxError::ParameterTypeMismatch {
            name: param.name.to_string(),
            expected: if float { "float" } else { "int" },
        },
        None => FxError::InvalidParameterIndex {
            effect: descriptor.name.to_string(),
            index,
        },
    }
}

/// Helper macro to implement common Effect trait methods
#[macro_export]
macro_rules! impl_effect_common {
    ($type:ty, $effect_type:expr, $descriptor:expr) => {
        fn effect_type(&self) -> &'static str {
            $effect_type
        }

        fn display_name(&self) -> &str {
            $descriptor.name
        }

        fn descriptor(&self) -> &'static $crate::dsp::EffectDescriptor {
            &$descriptor
        }

        fn id(&self) -> &str {
            &self.params.id
        }

        fn set_id(&mut self, id: String) {
            self.params.id = id;
        }

        fn is_enabled(&self) -> bool {
            self.params.enabled
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.params.enabled = enabled;
        }

        fn to_json(&self) -> $crate::error::Result<serde_json::Value> {
            serde_json::to_value(self).map_err($crate::error::FxError::Serialization)
        }

        fn box_clone(&self) -> Box<dyn $crate::dsp::Effect> {
            Box::new(self.clone())
        }
    };
}
