//! Generator configuration
//!
//! Hardware bounds and power-on defaults. Everything here has a `Default`
//! matching the stock generator, so a config file only needs to name the
//! fields it overrides.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::burst::TriggerSource;
use crate::channel::Waveform;
use crate::error::GenResult;

/// Number of samples in the hardware waveform buffer
pub const BUFFER_LENGTH: usize = 16 * 1024;

/// Microseconds per second, used by the burst period conversion
pub const MICRO: f64 = 1e6;

/// Bounds enforced by the parameter setters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Upper bound for |amplitude| + |offset|
    pub level_max: f32,
    /// Lowest accepted arbitrary sample
    pub arbitrary_min: f32,
    /// Highest accepted arbitrary sample
    pub arbitrary_max: f32,
    pub duty_cycle_min: f32,
    pub duty_cycle_max: f32,
    /// Highest finite burst count
    pub burst_count_max: u32,
    /// Highest finite burst repetition count
    pub burst_repetitions_max: u32,
    /// Burst period bounds in microseconds
    pub burst_period_min: u32,
    pub burst_period_max: u32,
    /// Exclusive lower frequency bound in Hz
    pub frequency_min: f32,
    /// Inclusive upper frequency bound in Hz
    pub frequency_max: f32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            level_max: 1.0,
            arbitrary_min: -1.0,
            arbitrary_max: 1.0,
            duty_cycle_min: 0.0,
            duty_cycle_max: 1.0,
            burst_count_max: 50_000,
            burst_repetitions_max: 50_000,
            burst_period_min: 1,
            burst_period_max: 500_000_000,
            frequency_min: 0.0,
            frequency_max: 62.5e6,
        }
    }
}

/// Per-channel state applied by `Generator::reset_to_defaults`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelDefaults {
    pub waveform: Waveform,
    /// Hz
    pub frequency: f32,
    /// Degrees
    pub phase: f32,
    pub amplitude: f32,
    pub offset: f32,
    pub duty_cycle: f32,
    pub trigger_source: TriggerSource,
}

impl Default for ChannelDefaults {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            frequency: 1000.0,
            phase: 0.0,
            amplitude: 1.0,
            offset: 0.0,
            duty_cycle: 0.5,
            trigger_source: TriggerSource::Internal,
        }
    }
}

/// Top-level generator configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub limits: Limits,
    pub defaults: ChannelDefaults,
}

impl GeneratorConfig {
    /// Parse a configuration from a JSON document
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> GenResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> GenResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
