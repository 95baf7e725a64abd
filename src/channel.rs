//! Channel parameter store
//!
//! Holds the user-facing parameters of both generator outputs. The store
//! itself never talks to the device; `Generator` validates input, commits
//! it here and then pushes the resulting table downstream.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::burst::BurstLimit;
use crate::config::{ChannelDefaults, Limits, BUFFER_LENGTH};
use crate::error::{GenError, GenResult};

/// One of the two generator outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Ch1,
    Ch2,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Ch1, Channel::Ch2];

    /// Zero-based index into per-channel arrays
    pub fn index(self) -> usize {
        match self {
            Channel::Ch1 => 0,
            Channel::Ch2 => 1,
        }
    }
}

impl TryFrom<u32> for Channel {
    type Error = GenError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Channel::Ch1),
            1 => Ok(Channel::Ch2),
            _ => Err(GenError::InvalidChannel(raw)),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Ch1 => f.pad("CH1"),
            Channel::Ch2 => f.pad("CH2"),
        }
    }
}

/// Waveform shapes the synthesizer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Triangle,
    Square,
    RampUp,
    RampDown,
    Dc,
    Pwm,
    Arbitrary,
}

impl Waveform {
    pub const ALL: [Waveform; 8] = [
        Waveform::Sine,
        Waveform::Triangle,
        Waveform::Square,
        Waveform::RampUp,
        Waveform::RampDown,
        Waveform::Dc,
        Waveform::Pwm,
        Waveform::Arbitrary,
    ];
}

impl TryFrom<u32> for Waveform {
    type Error = GenError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        Waveform::ALL
            .get(raw as usize)
            .copied()
            .ok_or_else(|| GenError::InvalidParameter(format!("waveform code {}", raw)))
    }
}

impl std::str::FromStr for Waveform {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sine" => Ok(Waveform::Sine),
            "triangle" => Ok(Waveform::Triangle),
            "square" => Ok(Waveform::Square),
            "ramp_up" | "rampup" => Ok(Waveform::RampUp),
            "ramp_down" | "rampdown" => Ok(Waveform::RampDown),
            "dc" => Ok(Waveform::Dc),
            "pwm" => Ok(Waveform::Pwm),
            "arbitrary" | "arb" => Ok(Waveform::Arbitrary),
            _ => Err(GenError::InvalidParameter(format!("waveform '{}'", s))),
        }
    }
}

/// User-facing parameters of a single channel
#[derive(Debug, Clone)]
pub struct ChannelState {
    pub waveform: Waveform,
    pub frequency: f32,
    pub phase: f32,
    pub duty_cycle: f32,
    pub burst_count: BurstLimit,
    pub burst_repetitions: BurstLimit,
    /// Microseconds
    pub burst_period: u32,
    /// Active table length
    pub table_size: usize,
    arbitrary: Vec<f32>,
    arbitrary_len: usize,
}

impl ChannelState {
    pub fn new(defaults: &ChannelDefaults, limits: &Limits) -> Self {
        Self {
            waveform: defaults.waveform,
            frequency: defaults.frequency,
            phase: defaults.phase,
            duty_cycle: defaults.duty_cycle,
            burst_count: BurstLimit::Finite(1),
            burst_repetitions: BurstLimit::Finite(1),
            burst_period: limits.burst_period_min,
            table_size: BUFFER_LENGTH,
            arbitrary: vec![0.0; BUFFER_LENGTH],
            arbitrary_len: BUFFER_LENGTH,
        }
    }

    /// Full arbitrary buffer, zero past the stored length
    pub fn arbitrary_buffer(&self) -> &[f32] {
        &self.arbitrary
    }

    /// Samples of the last accepted arbitrary waveform
    pub fn arbitrary(&self) -> &[f32] {
        &self.arbitrary[..self.arbitrary_len]
    }

    pub fn arbitrary_len(&self) -> usize {
        self.arbitrary_len
    }

    /// Phase converted to a sample offset into the table
    pub fn phase_offset(&self) -> usize {
        (self.phase as f64 * BUFFER_LENGTH as f64 / 360.0) as usize
    }

    /// Switch waveform and update the active table size
    pub fn select_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        self.table_size = match waveform {
            Waveform::Arbitrary => self.arbitrary_len,
            _ => BUFFER_LENGTH,
        };
    }

    /// Store a new arbitrary waveform
    ///
    /// Every sample is checked before anything is written, so a rejected
    /// buffer leaves the previous one intact.
    pub fn store_arbitrary(&mut self, samples: &[f32], limits: &Limits) -> GenResult<()> {
        if samples.len() > BUFFER_LENGTH {
            return Err(GenError::range(
                "arbitrary length",
                samples.len() as f64,
                0.0,
                BUFFER_LENGTH as f64,
            ));
        }
        if let Some(&bad) = samples
            .iter()
            .find(|s| !(limits.arbitrary_min..=limits.arbitrary_max).contains(*s))
        {
            return Err(GenError::range(
                "arbitrary sample",
                bad,
                limits.arbitrary_min,
                limits.arbitrary_max,
            ));
        }

        self.arbitrary[..samples.len()].copy_from_slice(samples);
        self.arbitrary[samples.len()..].fill(0.0);
        self.arbitrary_len = samples.len();
        if self.waveform == Waveform::Arbitrary {
            self.table_size = self.arbitrary_len;
        }
        Ok(())
    }
}

/// Parameters of both channels, indexed by `Channel`
#[derive(Debug, Clone)]
pub struct ChannelStore {
    channels: [ChannelState; 2],
}

impl ChannelStore {
    pub fn new(defaults: &ChannelDefaults, limits: &Limits) -> Self {
        Self {
            channels: [
                ChannelState::new(defaults, limits),
                ChannelState::new(defaults, limits),
            ],
        }
    }

    pub fn get(&self, channel: Channel) -> &ChannelState {
        &self.channels[channel.index()]
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut ChannelState {
        &mut self.channels[channel.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ChannelState {
        ChannelState::new(&ChannelDefaults::default(), &Limits::default())
    }

    #[test]
    fn test_channel_from_raw() {
        assert_eq!(Channel::try_from(0).unwrap(), Channel::Ch1);
        assert_eq!(Channel::try_from(1).unwrap(), Channel::Ch2);
        assert!(matches!(
            Channel::try_from(2),
            Err(GenError::InvalidChannel(2))
        ));
    }

    #[test]
    fn test_waveform_codes() {
        assert_eq!(Waveform::try_from(0).unwrap(), Waveform::Sine);
        assert_eq!(Waveform::try_from(7).unwrap(), Waveform::Arbitrary);
        assert!(matches!(
            Waveform::try_from(8),
            Err(GenError::InvalidParameter(_))
        ));
        assert_eq!("ramp_up".parse::<Waveform>().unwrap(), Waveform::RampUp);
        assert!("saw".parse::<Waveform>().is_err());
    }

    #[test]
    fn test_store_arbitrary_zero_fills() {
        let mut s = state();
        s.store_arbitrary(&[0.5; 16], &Limits::default()).unwrap();
        s.store_arbitrary(&[0.25; 4], &Limits::default()).unwrap();

        assert_eq!(s.arbitrary_len(), 4);
        assert_eq!(s.arbitrary(), &[0.25; 4]);
        assert_eq!(s.arbitrary_buffer()[4], 0.0);
        assert_eq!(s.arbitrary_buffer()[15], 0.0);
        assert_eq!(s.arbitrary_buffer().len(), BUFFER_LENGTH);
    }

    #[test]
    fn test_store_arbitrary_rejects_whole_buffer() {
        let mut s = state();
        s.store_arbitrary(&[0.5; 8], &Limits::default()).unwrap();

        let err = s
            .store_arbitrary(&[0.1, 0.2, 1.5, 0.3], &Limits::default())
            .unwrap_err();
        assert!(matches!(err, GenError::Range { .. }));
        assert_eq!(s.arbitrary(), &[0.5; 8]);

        assert!(s.store_arbitrary(&[f32::NAN], &Limits::default()).is_err());
        assert!(s
            .store_arbitrary(&vec![0.0; BUFFER_LENGTH + 1], &Limits::default())
            .is_err());
        assert_eq!(s.arbitrary_len(), 8);
    }

    #[test]
    fn test_table_size_follows_waveform() {
        let mut s = state();
        s.store_arbitrary(&[0.0; 100], &Limits::default()).unwrap();
        assert_eq!(s.table_size, BUFFER_LENGTH);

        s.select_waveform(Waveform::Arbitrary);
        assert_eq!(s.table_size, 100);

        s.store_arbitrary(&[0.0; 50], &Limits::default()).unwrap();
        assert_eq!(s.table_size, 50);

        s.select_waveform(Waveform::Pwm);
        assert_eq!(s.table_size, BUFFER_LENGTH);
    }

    #[test]
    fn test_phase_offset() {
        let mut s = state();
        assert_eq!(s.phase_offset(), 0);
        s.phase = 90.0;
        assert_eq!(s.phase_offset(), BUFFER_LENGTH / 4);
        s.phase = 180.0;
        assert_eq!(s.phase_offset(), BUFFER_LENGTH / 2);
    }
}
