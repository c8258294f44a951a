//! CLI Module
//!
//! Command-line interface for inspecting and exercising effect units.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::host::EffectKind;

/// blockfx - block-based DSP effect units
#[derive(Parser, Debug)]
#[command(name = "blockfx")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Generated input for `render`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Signal {
    Sine,
    Impulse,
    Ramp,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print parameter descriptor tables as JSON
    #[command(name = "describe")]
    Describe {
        /// Only this effect (downsampler, doubler)
        #[arg(short, long, value_name = "EFFECT")]
        effect: Option<EffectKind>,
    },

    /// Run a generated signal through an effect and report levels
    #[command(name = "render")]
    Render {
        /// Effect to run (downsampler, doubler)
        #[arg(short, long, value_name = "EFFECT")]
        effect: EffectKind,

        /// Preset JSON with parameter values
        #[arg(short, long)]
        preset: Option<PathBuf>,

        /// Host config JSON (sample rate, speaker mode, block size)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of frames to render
        #[arg(short, long, default_value_t = 48000)]
        frames: usize,

        /// Input signal
        #[arg(short, long, value_enum, default_value_t = Signal::Sine)]
        signal: Signal,

        /// Sine frequency in Hz
        #[arg(long, default_value_t = 440.0)]
        frequency: f64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from(["blockfx", "render", "--effect", "doubler", "-s", "impulse"])
            .unwrap();
        match cli.command {
            Some(Commands::Render { effect, signal, frames, .. }) => {
                assert_eq!(effect, EffectKind::Doubler);
                assert_eq!(signal, Signal::Impulse);
                assert_eq!(frames, 48000);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_effect_is_rejected() {
        let err = Cli::try_parse_from(["blockfx", "describe", "--effect", "chorus"]).unwrap_err();
        assert!(err.to_string().contains("Unknown effect: chorus"));
    }
}
