//! DSP unit lifecycle
//!
//! A `DspUnit` owns one effect instance on behalf of the host.
//! States: Uninitialized -> Initialized -> Released. Released is terminal.
//!
//! Parameter values arriving from the host are clamped to the descriptor
//! range here; the effects themselves take whatever they are given.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use super::EffectKind;
use crate::config::{HostConfig, SpeakerMode};
use crate::dsp::{Effect, EffectDescriptor, ParamDescriptor, ParamKind, MAX_CHANNELS};
use crate::error::{FxError, Result};

/// Channel layout of one side of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferLayout {
    pub channels: usize,
    pub speaker_mode: SpeakerMode,
}

impl BufferLayout {
    pub fn new(channels: usize, speaker_mode: SpeakerMode) -> Self {
        Self {
            channels,
            speaker_mode,
        }
    }

    /// Layout with the speaker mode implied by the channel count
    pub fn from_channels(channels: usize) -> Self {
        Self::new(channels, SpeakerMode::from_channel_count(channels))
    }
}

/// Answer to a host process call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProcessStatus {
    /// The block was (or can be) processed
    Ok,
    /// Inputs are idle; the host may skip this unit for the block
    DontProcess,
}

/// Result of a query-mode call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Negotiation {
    pub output: BufferLayout,
    pub status: ProcessStatus,
}

/// Lifecycle state of a unit
pub enum UnitState {
    Uninitialized,
    Initialized(Box<dyn Effect>),
    Released,
}

impl UnitState {
    pub fn name(&self) -> &'static str {
        match self {
            UnitState::Uninitialized => "uninitialized",
            UnitState::Initialized(_) => "initialized",
            UnitState::Released => "released",
        }
    }
}

/// Typed handle for one effect instance
pub struct DspUnit {
    kind: EffectKind,
    state: UnitState,
}

impl DspUnit {
    /// A handle with no effect allocated yet
    pub fn new(kind: EffectKind) -> Self {
        Self {
            kind,
            state: UnitState::Uninitialized,
        }
    }

    /// Create and initialize in one step
    pub fn create_with(kind: EffectKind, config: &HostConfig) -> Result<Self> {
        let mut unit = Self::new(kind);
        unit.create(config)?;
        Ok(unit)
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn descriptor(&self) -> &'static EffectDescriptor {
        self.kind.descriptor()
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, UnitState::Initialized(_))
    }

    /// Allocate the effect for the host's sample rate and speaker mode
    ///
    /// On failure the unit stays uninitialized. Creating an already
    /// initialized unit is a no-op.
    pub fn create(&mut self, config: &HostConfig) -> Result<()> {
        match self.state {
            UnitState::Uninitialized => {}
            UnitState::Initialized(_) => {
                warn!("{} unit already created", self.kind);
                return Ok(());
            }
            UnitState::Released => return Err(FxError::Released),
        }

        let effect = self.kind.instantiate(config)?;
        info!(
            "Created {} unit {} ({} Hz, {:?})",
            self.kind,
            effect.id(),
            config.sample_rate,
            config.speaker_mode
        );
        self.state = UnitState::Initialized(effect);
        Ok(())
    }

    /// Free the effect; every later call except `release` fails
    pub fn release(&mut self) {
        if let UnitState::Initialized(effect) = &self.state {
            info!("Released {} unit {}", self.kind, effect.id());
        }
        self.state = UnitState::Released;
    }

    /// Snap gain to target and clear history
    pub fn reset(&mut self) -> Result<()> {
        let effect = self.effect_mut()?;
        effect.reset();
        debug!("Reset {} unit {}", effect.effect_type(), effect.id());
        Ok(())
    }

    /// Query mode: negotiate the output layout without producing audio
    ///
    /// The output mirrors the input layout. Idle inputs answer
    /// `DontProcess`, and give the effect a chance to drop stale history.
    pub fn query(&mut self, input: BufferLayout, inputs_idle: bool) -> Result<Negotiation> {
        let kind = self.kind;
        let effect = self.effect_mut()?;

        if input.channels > MAX_CHANNELS {
            warn!("{} unit rejected {} input channels", kind, input.channels);
            return Err(FxError::UnsupportedChannels {
                channels: input.channels,
                max: MAX_CHANNELS,
            });
        }

        let status = if inputs_idle {
            effect.on_idle();
            ProcessStatus::DontProcess
        } else {
            ProcessStatus::Ok
        };

        Ok(Negotiation {
            output: input,
            status,
        })
    }

    /// Process one block of interleaved samples
    ///
    /// Runs on the audio thread; nothing here allocates or logs.
    pub fn process(
        &mut self,
        input: &[f32],
        output: &mut [f32],
        length: usize,
        in_channels: usize,
        out_channels: usize,
    ) -> Result<ProcessStatus> {
        let effect = self.effect_mut()?;
        effect.process(input, output, length, in_channels, out_channels);
        Ok(ProcessStatus::Ok)
    }

    /// Set a float parameter by index, clamped to its declared range
    pub fn set_param_float(&mut self, index: usize, value: f32) -> Result<()> {
        let param = self.float_param(index)?;
        let clamped = param.clamp_float(value);
        if clamped != value {
            debug!("{}: {} clamped to {}", param.name, value, clamped);
        }
        self.effect_mut()?.set_param_float(index, clamped)?;
        debug!("{}: {} = {}", self.kind, param.name, param.format(clamped));
        Ok(())
    }

    /// Read a float parameter with its display string
    pub fn param_float(&self, index: usize) -> Result<(f32, String)> {
        let param = self.float_param(index)?;
        let value = self.effect()?.param_float(index)?;
        Ok((value, param.format(value)))
    }

    /// Set an int parameter by index, clamped to its declared range
    pub fn set_param_int(&mut self, index: usize, value: i32) -> Result<()> {
        let param = self.int_param(index)?;
        let clamped = param.clamp_int(value);
        self.effect_mut()?.set_param_int(index, clamped)?;
        debug!("{}: {} = {}", self.kind, param.name, param.format(clamped as f32));
        Ok(())
    }

    /// Read an int parameter with its display string
    pub fn param_int(&self, index: usize) -> Result<(i32, String)> {
        let param = self.int_param(index)?;
        let value = self.effect()?.param_int(index)?;
        Ok((value, param.format(value as f32)))
    }

    /// Set a parameter by descriptor key from a JSON value
    ///
    /// Goes through the same clamped setters as index dispatch. `enabled`
    /// is passed to the effect unchanged.
    pub fn set_param(&mut self, key: &str, value: &Value) -> Result<()> {
        if key == "enabled" {
            return self.effect_mut()?.set_param(key, value);
        }

        let descriptor = self.descriptor();
        let index = descriptor
            .index_of(key)
            .ok_or_else(|| FxError::UnknownParameter {
                name: key.to_string(),
            })?;

        match descriptor.params[index].kind {
            ParamKind::Float { .. } => {
                let v = value.as_f64().ok_or_else(|| FxError::InvalidParameterValue {
                    name: key.to_string(),
                    reason: format!("expected number, got {}", value),
                })?;
                self.set_param_float(index, v as f32)
            }
            ParamKind::Int { .. } => {
                let v = value.as_i64().ok_or_else(|| FxError::InvalidParameterValue {
                    name: key.to_string(),
                    reason: format!("expected integer, got {}", value),
                })?;
                // Saturate into i32 so the range clamp sees the right side
                let v = v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
                self.set_param_int(index, v)
            }
        }
    }

    /// Borrow the effect of an initialized unit
    pub fn effect(&self) -> Result<&dyn Effect> {
        match &self.state {
            UnitState::Initialized(effect) => Ok(effect.as_ref()),
            UnitState::Uninitialized => Err(FxError::NotInitialized),
            UnitState::Released => Err(FxError::Released),
        }
    }

    /// Mutably borrow the effect of an initialized unit
    pub fn effect_mut(&mut self) -> Result<&mut (dyn Effect + 'static)> {
        match &mut self.state {
            UnitState::Initialized(effect) => Ok(effect.as_mut()),
            UnitState::Uninitialized => Err(FxError::NotInitialized),
            UnitState::Released => Err(FxError::Released),
        }
    }

    fn lookup(&self, index: usize, float: bool) -> Result<&'static ParamDescriptor> {
        let descriptor = self.descriptor();
        let param = descriptor
            .param(index)
            .ok_or_else(|| FxError::InvalidParameterIndex {
                effect: descriptor.name.to_string(),
                index,
            })?;
        if param.is_float() != float {
            return Err(FxError::ParameterTypeMismatch {
                name: param.name.to_string(),
                expected: if float { "float" } else { "int" },
            });
        }
        Ok(param)
    }

    fn float_param(&self, index: usize) -> Result<&'static ParamDescriptor> {
        self.lookup(index, true)
    }

    fn int_param(&self, index: usize) -> Result<&'static ParamDescriptor> {
        self.lookup(index, false)
    }
}

impl Drop for DspUnit {
    fn drop(&mut self) {
        if self.is_initialized() {
            self.release();
        }
    }
}
