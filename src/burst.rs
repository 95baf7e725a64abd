//! Burst and trigger coordination
//!
//! Burst parameters live in two forms. The channel store keeps what the
//! user asked for (count, repetitions, period); the device holds the
//! hardware form (0 for infinite, 0-based repetitions, idle delay instead
//! of period). Everything in this module converts between the two.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::config::MICRO;
use crate::device::SignalDevice;
use crate::error::{GenError, GenResult};
use crate::handler::Generator;

/// Hardware trigger source codes
pub mod trigger_code {
    /// Software trigger; rewriting it fires the channel
    pub const INTERNAL: u32 = 1;
    pub const EXT_POSITIVE_EDGE: u32 = 2;
    pub const EXT_NEGATIVE_EDGE: u32 = 3;
}

/// Burst delay value the hardware treats as "no gap"
pub const CONTINUOUS_DELAY: u32 = 1;

/// Generation mode of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenMode {
    /// Free-running output
    Continuous,
    /// Bounded number of periods separated by an idle delay
    Burst,
    /// Streaming from host memory, not implemented
    Stream,
}

impl TryFrom<u32> for GenMode {
    type Error = GenError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(GenMode::Continuous),
            1 => Ok(GenMode::Burst),
            2 => Ok(GenMode::Stream),
            _ => Err(GenError::InvalidParameter(format!("generation mode code {}", raw))),
        }
    }
}

/// What starts a burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    Internal,
    ExternalPositiveEdge,
    ExternalNegativeEdge,
    /// External level enables generation
    GatedBurst,
}

impl TriggerSource {
    /// Hardware code written to the trigger source register
    pub fn code(self) -> u32 {
        match self {
            TriggerSource::Internal => trigger_code::INTERNAL,
            TriggerSource::ExternalPositiveEdge => trigger_code::EXT_POSITIVE_EDGE,
            TriggerSource::ExternalNegativeEdge => trigger_code::EXT_NEGATIVE_EDGE,
            TriggerSource::GatedBurst => trigger_code::EXT_POSITIVE_EDGE,
        }
    }

    pub fn is_gated(self) -> bool {
        self == TriggerSource::GatedBurst
    }

    /// Generation mode forced by selecting this source
    pub fn mode(self) -> GenMode {
        match self {
            TriggerSource::Internal => GenMode::Continuous,
            _ => GenMode::Burst,
        }
    }

    /// Decode the device registers; the gated flag wins over the code
    pub fn from_hardware(code: u32, gated: bool) -> GenResult<Self> {
        if gated {
            return Ok(TriggerSource::GatedBurst);
        }
        match code {
            trigger_code::INTERNAL => Ok(TriggerSource::Internal),
            trigger_code::EXT_POSITIVE_EDGE => Ok(TriggerSource::ExternalPositiveEdge),
            trigger_code::EXT_NEGATIVE_EDGE => Ok(TriggerSource::ExternalNegativeEdge),
            _ => Err(GenError::InvalidParameter(format!("trigger source code {}", code))),
        }
    }
}

impl TryFrom<u32> for TriggerSource {
    type Error = GenError;

    /// API numbering: 1 internal, 2/3 external edges, 4 gated burst
    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(TriggerSource::Internal),
            2 => Ok(TriggerSource::ExternalPositiveEdge),
            3 => Ok(TriggerSource::ExternalNegativeEdge),
            4 => Ok(TriggerSource::GatedBurst),
            _ => Err(GenError::InvalidParameter(format!("trigger source {}", raw))),
        }
    }
}

/// A burst count or repetition count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BurstLimit {
    Finite(u32),
    Infinite,
}

impl BurstLimit {
    /// Signed form, -1 for infinite
    pub fn to_raw(self) -> i64 {
        match self {
            BurstLimit::Finite(n) => n as i64,
            BurstLimit::Infinite => -1,
        }
    }

    /// Register encoding, where 0 means infinite
    pub fn to_hardware(self) -> u32 {
        match self {
            BurstLimit::Finite(n) => n,
            BurstLimit::Infinite => 0,
        }
    }

    pub fn from_hardware(value: u32) -> Self {
        match value {
            0 => BurstLimit::Infinite,
            n => BurstLimit::Finite(n),
        }
    }

    fn check(self, name: &'static str, max: u32) -> GenResult<()> {
        match self {
            BurstLimit::Finite(n) if n < 1 || n > max => Err(GenError::range(name, n, 1, max)),
            _ => Ok(()),
        }
    }
}

impl TryFrom<i32> for BurstLimit {
    type Error = GenError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            -1 => Ok(BurstLimit::Infinite),
            n if n >= 0 => Ok(BurstLimit::Finite(n as u32)),
            n => Err(GenError::InvalidParameter(format!("burst limit {}", n))),
        }
    }
}

/// Target of a manual trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerTarget {
    Channel(Channel),
    Both,
}

impl TryFrom<u32> for TriggerTarget {
    type Error = GenError;

    /// 0 and 1 select CH1, 2 selects CH2, 3 selects both
    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 | 1 => Ok(TriggerTarget::Channel(Channel::Ch1)),
            2 => Ok(TriggerTarget::Channel(Channel::Ch2)),
            3 => Ok(TriggerTarget::Both),
            _ => Err(GenError::InvalidChannel(raw)),
        }
    }
}

/// Duration of one waveform period in microseconds
fn signal_time_us(frequency: f32) -> f64 {
    MICRO / frequency as f64
}

/// Idle delay that makes `count` periods plus the gap last `period` us
///
/// A result of zero or less is clamped to `CONTINUOUS_DELAY`.
pub fn period_to_delay(period: u32, frequency: f32, count: BurstLimit) -> u32 {
    let delay = (period as f64 - signal_time_us(frequency) * count.to_raw() as f64).round();
    if delay <= 0.0 {
        CONTINUOUS_DELAY
    } else {
        delay.min(u32::MAX as f64) as u32
    }
}

/// Inverse of `period_to_delay` using the hardware count encoding
///
/// `period_to_delay` rounds half-way values up, so the period it started
/// from is the unique integer in `[delay + t - 0.5, delay + t + 0.5)`.
pub fn delay_to_period(delay: u32, frequency: f32, hw_count: u32) -> u32 {
    let delay = if delay == CONTINUOUS_DELAY { 0 } else { delay };
    let period = (delay as f64 + signal_time_us(frequency) * hw_count as f64 - 0.5).ceil();
    period.clamp(0.0, u32::MAX as f64) as u32
}

impl<D: SignalDevice> Generator<D> {
    /// Switch the generation mode
    ///
    /// Continuous clears all burst registers. Burst re-applies the cached
    /// burst count, repetitions and period. Stream is rejected.
    pub fn set_gen_mode(&mut self, channel: Channel, mode: GenMode) -> GenResult<()> {
        match mode {
            GenMode::Continuous => {
                self.device.set_gated_burst(channel, false)?;
                self.device.set_burst_delay(channel, 0)?;
                self.device.set_burst_repetitions(channel, 0)?;
                self.device.set_burst_count(channel, 0)?;
                tracing::debug!(%channel, "continuous mode");
                self.trigger_if_internal(channel)
            }
            GenMode::Burst => {
                let state = self.store.get(channel);
                let (count, repetitions, period) =
                    (state.burst_count, state.burst_repetitions, state.burst_period);
                self.set_burst_count(channel, count)?;
                self.set_burst_repetitions(channel, repetitions)?;
                self.set_burst_period(channel, period)?;
                tracing::debug!(%channel, "burst mode");
                Ok(())
            }
            GenMode::Stream => Err(GenError::UnsupportedFeature(
                "stream generation mode".to_string(),
            )),
        }
    }

    /// Burst when the hardware burst count is non-zero
    pub fn gen_mode(&self, channel: Channel) -> GenResult<GenMode> {
        let count = self.device.burst_count(channel)?;
        Ok(if count != 0 {
            GenMode::Burst
        } else {
            GenMode::Continuous
        })
    }

    /// Set the number of waveform periods per burst
    pub fn set_burst_count(&mut self, channel: Channel, count: BurstLimit) -> GenResult<()> {
        count.check("burst count", self.config.limits.burst_count_max)?;

        self.store.get_mut(channel).burst_count = count;
        self.device.set_burst_count(channel, count.to_hardware())?;
        tracing::debug!(%channel, ?count, "burst count");

        self.trigger_if_internal(channel)
    }

    /// Burst count as programmed; a zero register reads back as infinite
    pub fn burst_count(&self, channel: Channel) -> GenResult<BurstLimit> {
        Ok(BurstLimit::from_hardware(self.device.burst_count(channel)?))
    }

    /// Set the number of bursts
    ///
    /// The register is 0-based. Infinite is mapped to 0 before the
    /// subtraction, so it is stored as `u32::MAX`.
    pub fn set_burst_repetitions(
        &mut self,
        channel: Channel,
        repetitions: BurstLimit,
    ) -> GenResult<()> {
        repetitions.check("burst repetitions", self.config.limits.burst_repetitions_max)?;

        self.store.get_mut(channel).burst_repetitions = repetitions;
        let hw = repetitions.to_hardware().wrapping_sub(1);
        self.device.set_burst_repetitions(channel, hw)?;
        tracing::debug!(%channel, ?repetitions, hw, "burst repetitions");

        self.trigger_if_internal(channel)
    }

    /// Register value plus one
    ///
    /// Infinite was stored as `u32::MAX` and therefore reads back as
    /// `Finite(0)`, not `Infinite`.
    pub fn burst_repetitions(&self, channel: Channel) -> GenResult<BurstLimit> {
        let hw = self.device.burst_repetitions(channel)?;
        Ok(BurstLimit::Finite(hw.wrapping_add(1)))
    }

    /// Set the burst period in microseconds
    pub fn set_burst_period(&mut self, channel: Channel, period: u32) -> GenResult<()> {
        let limits = &self.config.limits;
        if period < limits.burst_period_min || period > limits.burst_period_max {
            return Err(GenError::range(
                "burst period",
                period,
                limits.burst_period_min,
                limits.burst_period_max,
            ));
        }

        let state = self.store.get(channel);
        let delay = period_to_delay(period, state.frequency, state.burst_count);
        if delay == CONTINUOUS_DELAY {
            tracing::debug!(%channel, period, "burst period shorter than burst, no idle gap");
        }

        self.device.set_burst_delay(channel, delay)?;
        self.store.get_mut(channel).burst_period = period;
        tracing::debug!(%channel, period, delay, "burst period");

        self.trigger_if_internal(channel)
    }

    /// Reconstruct the burst period from the device registers
    ///
    /// Exact whenever the stored delay is above the no-gap value and the
    /// burst count is finite. Lossy in two cases: a delay clamped to the
    /// no-gap value, and an infinite count, which the setter counts as -1
    /// periods but reads back from the register as 0. At 1 kHz an infinite
    /// burst with period 5000 reads back as 6000.
    pub fn burst_period(&self, channel: Channel) -> GenResult<u32> {
        let delay = self.device.burst_delay(channel)?;
        let count = self.device.burst_count(channel)?;
        let frequency = self.device.frequency(channel)?;
        Ok(delay_to_period(delay, frequency, count))
    }

    /// Select the trigger source, which also selects the generation mode
    pub fn set_trigger_source(&mut self, channel: Channel, source: TriggerSource) -> GenResult<()> {
        self.device.set_gated_burst(channel, source.is_gated())?;
        self.set_gen_mode(channel, source.mode())?;
        self.device.set_trigger_source(channel, source.code())?;
        tracing::debug!(%channel, ?source, "trigger source");
        Ok(())
    }

    pub fn trigger_source(&self, channel: Channel) -> GenResult<TriggerSource> {
        let gated = self.device.gated_burst(channel)?;
        let code = self.device.trigger_source(channel)?;
        TriggerSource::from_hardware(code, gated)
    }

    /// Re-fire the channel if it is on the internal trigger
    ///
    /// This is how burst parameter changes take effect immediately.
    pub fn trigger_if_internal(&mut self, channel: Channel) -> GenResult<()> {
        if self.device.trigger_source(channel)? == trigger_code::INTERNAL {
            self.device.set_trigger_source(channel, trigger_code::INTERNAL)?;
            tracing::trace!(%channel, "internal trigger");
        }
        Ok(())
    }

    /// Force burst mode on the target and fire it
    pub fn trigger(&mut self, target: TriggerTarget) -> GenResult<()> {
        match target {
            TriggerTarget::Channel(channel) => {
                self.set_gen_mode(channel, GenMode::Burst)?;
                self.device.set_trigger_source(channel, trigger_code::INTERNAL)?;
            }
            TriggerTarget::Both => {
                for channel in Channel::ALL {
                    self.set_gen_mode(channel, GenMode::Burst)?;
                }
                self.device.trigger_simultaneous()?;
            }
        }
        tracing::debug!(?target, "trigger");
        Ok(())
    }

    /// Realign both channels
    pub fn synchronise(&mut self) -> GenResult<()> {
        self.device.synchronise()?;
        Ok(())
    }
}
