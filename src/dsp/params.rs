//! Parameter descriptors
//!
//! Immutable tables describing each effect's parameters: display name,
//! unit label, help text and range. A parameter's position in its table
//! is the numeric index the host uses for get/set calls.

use serde::Serialize;

/// Value type and range of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    Float { min: f32, max: f32, default: f32 },
    Int { min: i32, max: i32, default: i32 },
}

/// One entry of an effect's parameter table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParamDescriptor {
    /// Stable snake_case key used by presets and the JSON surface
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    /// Unit label shown next to the value
    pub label: &'static str,
    /// Help text
    pub description: &'static str,
    pub kind: ParamKind,
}

impl ParamDescriptor {
    pub const fn float(
        key: &'static str,
        name: &'static str,
        label: &'static str,
        description: &'static str,
        min: f32,
        max: f32,
        default: f32,
    ) -> Self {
        Self {
            key,
            name,
            label,
            description,
            kind: ParamKind::Float { min, max, default },
        }
    }

    pub const fn int(
        key: &'static str,
        name: &'static str,
        label: &'static str,
        description: &'static str,
        min: i32,
        max: i32,
        default: i32,
    ) -> Self {
        Self {
            key,
            name,
            label,
            description,
            kind: ParamKind::Int { min, max, default },
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind, ParamKind::Float { .. })
    }

    /// Clamp a float value into the declared range
    ///
    /// Int parameters pass the value through unchanged.
    pub fn clamp_float(&self, value: f32) -> f32 {
        match self.kind {
            ParamKind::Float { min, max, .. } => value.clamp(min, max),
            ParamKind::Int { .. } => value,
        }
    }

    /// Clamp an int value into the declared range
    ///
    /// Float parameters pass the value through unchanged.
    pub fn clamp_int(&self, value: i32) -> i32 {
        match self.kind {
            ParamKind::Int { min, max, .. } => value.clamp(min, max),
            ParamKind::Float { .. } => value,
        }
    }

    /// Render a value the way the host displays it, e.g. `"-6.0 dB"`
    pub fn format(&self, value: f32) -> String {
        match (self.kind, self.label.is_empty()) {
            (ParamKind::Int { .. }, true) => format!("{}", value as i32),
            (ParamKind::Int { .. }, false) => format!("{} {}", value as i32, self.label),
            (ParamKind::Float { .. }, true) => format!("{:.2}", value),
            (ParamKind::Float { .. }, false) => format!("{:.1} {}", value, self.label),
        }
    }
}

/// Static description of an effect unit handed to the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectDescriptor {
    pub name: &'static str,
    /// Plug-in version, 0xMMMMmmmm
    pub version: u32,
    pub num_input_buffers: u32,
    pub num_output_buffers: u32,
    pub params: &'static [ParamDescriptor],
}

impl EffectDescriptor {
    pub fn param(&self, index: usize) -> Option<&'static ParamDescriptor> {
        self.params.get(index)
    }

    /// Look up a parameter index by its key
    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.params.iter().position(|p| p.key == key)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }
}
