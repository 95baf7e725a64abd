//! Generator handler
//!
//! `Generator` owns the channel store and a device adapter. Setters follow
//! one pattern: validate, commit to the store, re-synthesize if the table
//! shape changed, and push the result to the device before returning.
//! Burst and trigger operations are implemented in `crate::burst`.

use crate::burst::{BurstLimit, GenMode};
use crate::channel::{Channel, ChannelStore, Waveform};
use crate::config::{GeneratorConfig, Limits};
use crate::device::SignalDevice;
use crate::error::{GenError, GenResult};
use crate::generator::{synthesize, ShapeParams, WaveformTable};

/// Two-channel arbitrary waveform generator
pub struct Generator<D: SignalDevice> {
    pub(crate) device: D,
    pub(crate) store: ChannelStore,
    pub(crate) config: GeneratorConfig,
}

impl<D: SignalDevice> Generator<D> {
    /// Create a generator with stock limits and apply the power-on defaults
    ///
    /// # Example
    /// ```
    /// use arbgen::{Channel, Generator, GenMode, SimulatedDevice, Waveform};
    ///
    /// let gen = Generator::new(SimulatedDevice::new()).unwrap();
    /// assert_eq!(gen.waveform(Channel::Ch1), Waveform::Sine);
    /// assert_eq!(gen.gen_mode(Channel::Ch2).unwrap(), GenMode::Continuous);
    /// ```
    pub fn new(device: D) -> GenResult<Self> {
        Self::with_config(device, GeneratorConfig::default())
    }

    /// Create a generator with custom limits and defaults
    pub fn with_config(device: D, config: GeneratorConfig) -> GenResult<Self> {
        let store = ChannelStore::new(&config.defaults, &config.limits);
        let mut gen = Self {
            device,
            store,
            config,
        };
        gen.reset_to_defaults()?;
        Ok(gen)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn into_device(self) -> D {
        self.device
    }

    pub fn limits(&self) -> &Limits {
        &self.config.limits
    }

    /// Program both channels with the configured defaults
    ///
    /// Outputs end up disabled, in continuous mode on the internal trigger.
    pub fn reset_to_defaults(&mut self) -> GenResult<()> {
        let defaults = self.config.defaults.clone();
        let period_min = self.config.limits.burst_period_min;
        let period_max = self.config.limits.burst_period_max;

        for channel in Channel::ALL {
            self.disable(channel)?;
        }
        for channel in Channel::ALL {
            self.set_frequency(channel, defaults.frequency)?;
            self.set_burst_repetitions(channel, BurstLimit::Finite(1))?;
            let one_period = (1.0 / defaults.frequency as f64 * 1e6) as u32;
            self.set_burst_period(channel, one_period.clamp(period_min, period_max))?;
            self.set_waveform(channel, defaults.waveform)?;
            self.set_offset(channel, 0.0)?;
            self.set_amplitude(channel, defaults.amplitude)?;
            self.set_offset(channel, defaults.offset)?;
            self.set_duty_cycle(channel, defaults.duty_cycle)?;
            self.set_gen_mode(channel, GenMode::Continuous)?;
            self.set_burst_count(channel, BurstLimit::Finite(1))?;
            self.set_burst_period(channel, period_min)?;
            self.set_trigger_source(channel, defaults.trigger_source)?;
            self.set_phase(channel, defaults.phase)?;
        }

        tracing::info!(
            waveform = ?defaults.waveform,
            frequency = defaults.frequency,
            "generator defaults applied"
        );
        Ok(())
    }

    // =========================================================================
    // Output stage
    // =========================================================================

    pub fn enable(&mut self, channel: Channel) -> GenResult<()> {
        self.device.set_output_enabled(channel, true)?;
        Ok(())
    }

    pub fn disable(&mut self, channel: Channel) -> GenResult<()> {
        self.device.set_output_enabled(channel, false)?;
        Ok(())
    }

    pub fn is_enabled(&self, channel: Channel) -> GenResult<bool> {
        Ok(self.device.output_enabled(channel)?)
    }

    /// Reject amplitude/offset pairs that would drive the output past full scale
    pub fn check_amplitude_and_offset(&self, amplitude: f32, offset: f32) -> GenResult<()> {
        let level = amplitude.abs() + offset.abs();
        let max = self.config.limits.level_max;
        if level > max {
            return Err(GenError::range("|amplitude| + |offset|", level, 0.0f32, max));
        }
        Ok(())
    }

    pub fn set_amplitude(&mut self, channel: Channel, amplitude: f32) -> GenResult<()> {
        let offset = self.device.offset(channel)?;
        self.check_amplitude_and_offset(amplitude, offset)?;
        self.device.set_amplitude(channel, amplitude)?;
        tracing::debug!(%channel, amplitude, "amplitude");
        Ok(())
    }

    pub fn amplitude(&self, channel: Channel) -> GenResult<f32> {
        Ok(self.device.amplitude(channel)?)
    }

    pub fn set_offset(&mut self, channel: Channel, offset: f32) -> GenResult<()> {
        let amplitude = self.device.amplitude(channel)?;
        self.check_amplitude_and_offset(amplitude, offset)?;
        self.device.set_offset(channel, offset)?;
        tracing::debug!(%channel, offset, "offset");
        Ok(())
    }

    pub fn offset(&self, channel: Channel) -> GenResult<f32> {
        Ok(self.device.offset(channel)?)
    }

    // =========================================================================
    // Shape parameters
    // =========================================================================

    /// Set the output frequency in Hz
    ///
    /// Re-synthesizes because the square wave edge width depends on it.
    pub fn set_frequency(&mut self, channel: Channel, frequency: f32) -> GenResult<()> {
        let limits = &self.config.limits;
        if !(frequency > limits.frequency_min && frequency <= limits.frequency_max) {
            return Err(GenError::range(
                "frequency",
                frequency,
                limits.frequency_min,
                limits.frequency_max,
            ));
        }

        self.device.set_frequency(channel, frequency)?;
        self.store.get_mut(channel).frequency = frequency;
        tracing::debug!(%channel, frequency, "frequency");
        self.resynthesize(channel)
    }

    pub fn frequency(&self, channel: Channel) -> f32 {
        self.store.get(channel).frequency
    }

    /// Set the start phase in degrees, `[0, 360)`
    pub fn set_phase(&mut self, channel: Channel, phase: f32) -> GenResult<()> {
        if !(0.0..360.0).contains(&phase) {
            return Err(GenError::range("phase", phase, 0.0f32, 360.0f32));
        }

        self.store.get_mut(channel).phase = phase;
        tracing::debug!(%channel, phase, "phase");
        self.resynthesize(channel)
    }

    pub fn phase(&self, channel: Channel) -> f32 {
        self.store.get(channel).phase
    }

    pub fn set_waveform(&mut self, channel: Channel, waveform: Waveform) -> GenResult<()> {
        self.store.get_mut(channel).select_waveform(waveform);
        tracing::debug!(%channel, ?waveform, "waveform");
        self.resynthesize(channel)
    }

    pub fn waveform(&self, channel: Channel) -> Waveform {
        self.store.get(channel).waveform
    }

    /// Store an arbitrary waveform
    ///
    /// Samples must lie within the arbitrary bounds; one bad sample rejects
    /// the whole buffer. The table is only re-programmed if the channel is
    /// currently playing its arbitrary waveform.
    pub fn set_arbitrary(&mut self, channel: Channel, samples: &[f32]) -> GenResult<()> {
        let limits = &self.config.limits;
        let state = self.store.get_mut(channel);
        state.store_arbitrary(samples, limits)?;
        tracing::debug!(%channel, len = samples.len(), "arbitrary waveform stored");

        if state.waveform == Waveform::Arbitrary {
            self.resynthesize(channel)
        } else {
            Ok(())
        }
    }

    /// Last accepted arbitrary waveform
    pub fn arbitrary(&self, channel: Channel) -> &[f32] {
        self.store.get(channel).arbitrary()
    }

    /// Set the PWM duty cycle
    ///
    /// Always re-programs the table, whatever the current waveform.
    pub fn set_duty_cycle(&mut self, channel: Channel, duty_cycle: f32) -> GenResult<()> {
        let limits = &self.config.limits;
        if !(limits.duty_cycle_min..=limits.duty_cycle_max).contains(&duty_cycle) {
            return Err(GenError::range(
                "duty cycle",
                duty_cycle,
                limits.duty_cycle_min,
                limits.duty_cycle_max,
            ));
        }

        self.store.get_mut(channel).duty_cycle = duty_cycle;
        tracing::debug!(%channel, duty_cycle, "duty cycle");
        self.resynthesize(channel)
    }

    pub fn duty_cycle(&self, channel: Channel) -> f32 {
        self.store.get(channel).duty_cycle
    }

    // =========================================================================
    // Synthesis
    // =========================================================================

    /// Table the channel's current parameters produce
    pub fn table(&self, channel: Channel) -> WaveformTable {
        let state = self.store.get(channel);
        let params = ShapeParams {
            duty_cycle: state.duty_cycle,
            frequency: state.frequency,
            arbitrary: state.arbitrary_buffer(),
            arbitrary_len: state.arbitrary_len(),
        };
        synthesize(state.waveform, &params)
    }

    /// Rebuild the channel's table and write it to the device
    fn resynthesize(&mut self, channel: Channel) -> GenResult<()> {
        let table = self.table(channel);
        let phase_offset = self.store.get(channel).phase_offset();

        if let Err(e) = self
            .device
            .write_samples(channel, &table.samples, phase_offset, table.size)
        {
            tracing::warn!(%channel, error = %e, "table write failed");
            return Err(e.into());
        }
        tracing::trace!(%channel, size = table.size, phase_offset, "table written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burst::TriggerSource;
    use crate::config::{ChannelDefaults, BUFFER_LENGTH};
    use crate::device::{DeviceError, DeviceWrite, SimulatedDevice};

    fn generator() -> Generator<SimulatedDevice> {
        let mut gen = Generator::new(SimulatedDevice::new()).unwrap();
        gen.device_mut().clear_log();
        gen
    }

    fn table_writes(gen: &Generator<SimulatedDevice>) -> usize {
        gen.device()
            .log()
            .iter()
            .filter(|w| matches!(w, DeviceWrite::Samples { .. }))
            .count()
    }

    #[test]
    fn test_defaults() {
        let gen = Generator::new(SimulatedDevice::new()).unwrap();
        for ch in Channel::ALL {
            assert!(!gen.is_enabled(ch).unwrap());
            assert_eq!(gen.waveform(ch), Waveform::Sine);
            assert_eq!(gen.frequency(ch), 1000.0);
            assert_eq!(gen.device().frequency(ch).unwrap(), 1000.0);
            assert_eq!(gen.phase(ch), 0.0);
            assert_eq!(gen.duty_cycle(ch), 0.5);
            assert_eq!(gen.amplitude(ch).unwrap(), 1.0);
            assert_eq!(gen.offset(ch).unwrap(), 0.0);
            assert_eq!(gen.trigger_source(ch).unwrap(), TriggerSource::Internal);
            assert_eq!(gen.gen_mode(ch).unwrap(), GenMode::Continuous);
            assert_eq!(gen.device().table_size(ch), BUFFER_LENGTH);
        }
        // A sine is programmed on both outputs
        let t = gen.device().table(Channel::Ch1);
        assert!((t[BUFFER_LENGTH / 4] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_custom_defaults() {
        let config = GeneratorConfig {
            defaults: ChannelDefaults {
                waveform: Waveform::Pwm,
                duty_cycle: 0.25,
                trigger_source: TriggerSource::ExternalPositiveEdge,
                ..ChannelDefaults::default()
            },
            ..GeneratorConfig::default()
        };
        let gen = Generator::with_config(SimulatedDevice::new(), config).unwrap();

        assert_eq!(gen.waveform(Channel::Ch2), Waveform::Pwm);
        assert_eq!(gen.duty_cycle(Channel::Ch2), 0.25);
        assert_eq!(gen.gen_mode(Channel::Ch2).unwrap(), GenMode::Burst);
    }

    #[test]
    fn test_slow_default_frequency() {
        // One period of 1 mHz is far beyond the longest burst period
        let config = GeneratorConfig {
            defaults: ChannelDefaults {
                frequency: 0.001,
                ..ChannelDefaults::default()
            },
            ..GeneratorConfig::default()
        };
        let gen = Generator::with_config(SimulatedDevice::new(), config).unwrap();

        assert_eq!(gen.frequency(Channel::Ch1), 0.001);
        assert_eq!(gen.gen_mode(Channel::Ch1).unwrap(), GenMode::Continuous);
    }

    #[test]
    fn test_enable_disable() {
        let mut gen = generator();
        gen.enable(Channel::Ch2).unwrap();
        assert!(gen.is_enabled(Channel::Ch2).unwrap());
        assert!(!gen.is_enabled(Channel::Ch1).unwrap());
        gen.disable(Channel::Ch2).unwrap();
        assert!(!gen.is_enabled(Channel::Ch2).unwrap());
    }

    #[test]
    fn test_amplitude_offset_bound() {
        let mut gen = generator();
        gen.set_amplitude(Channel::Ch1, 0.6).unwrap();
        gen.set_offset(Channel::Ch1, -0.4).unwrap();

        let err = gen.set_offset(Channel::Ch1, 0.5).unwrap_err();
        assert!(matches!(err, GenError::Range { .. }));
        assert_eq!(gen.offset(Channel::Ch1).unwrap(), -0.4);

        assert!(gen.set_amplitude(Channel::Ch1, -0.7).is_err());
        assert_eq!(gen.amplitude(Channel::Ch1).unwrap(), 0.6);
        assert!(gen.check_amplitude_and_offset(0.5, 0.5).is_ok());
    }

    #[test]
    fn test_set_waveform_writes_table() {
        let mut gen = generator();
        gen.set_waveform(Channel::Ch1, Waveform::Dc).unwrap();

        assert_eq!(gen.waveform(Channel::Ch1), Waveform::Dc);
        assert_eq!(table_writes(&gen), 1);
        assert!(gen.device().table(Channel::Ch1).iter().all(|&s| s == 1.0));
        // Other channel untouched
        assert_eq!(gen.waveform(Channel::Ch2), Waveform::Sine);
    }

    #[test]
    fn test_arbitrary_only_written_when_active() {
        let mut gen = generator();
        let samples = [0.0, 0.5, 1.0, 0.5, 0.0, -0.5, -1.0, -0.5];

        gen.set_arbitrary(Channel::Ch1, &samples).unwrap();
        assert_eq!(table_writes(&gen), 0);
        assert_eq!(gen.arbitrary(Channel::Ch1), &samples);

        gen.set_waveform(Channel::Ch1, Waveform::Arbitrary).unwrap();
        assert_eq!(gen.device().table_size(Channel::Ch1), 8);
        assert_eq!(&gen.device().table(Channel::Ch1)[..8], &samples);

        gen.set_arbitrary(Channel::Ch1, &samples[..4]).unwrap();
        assert_eq!(table_writes(&gen), 2);
        assert_eq!(gen.device().table_size(Channel::Ch1), 4);
        assert_eq!(gen.device().table(Channel::Ch1)[4], 0.0);
    }

    #[test]
    fn test_arbitrary_rejected_atomically() {
        let mut gen = generator();
        gen.set_waveform(Channel::Ch2, Waveform::Arbitrary).unwrap();
        gen.set_arbitrary(Channel::Ch2, &[0.25; 32]).unwrap();
        gen.device_mut().clear_log();

        let err = gen
            .set_arbitrary(Channel::Ch2, &[0.0, 0.5, -1.01])
            .unwrap_err();
        assert!(matches!(err, GenError::Range { .. }));
        assert_eq!(gen.arbitrary(Channel::Ch2), &[0.25; 32]);
        assert!(gen.device().log().is_empty());
    }

    #[test]
    fn test_duty_cycle() {
        let mut gen = generator();
        assert!(gen.set_duty_cycle(Channel::Ch1, 1.2).is_err());
        assert!(gen.set_duty_cycle(Channel::Ch1, -0.1).is_err());
        assert_eq!(table_writes(&gen), 0);

        // Re-programmed even though the channel plays a sine
        gen.set_duty_cycle(Channel::Ch1, 0.2).unwrap();
        assert_eq!(gen.duty_cycle(Channel::Ch1), 0.2);
        assert_eq!(table_writes(&gen), 1);

        gen.set_waveform(Channel::Ch1, Waveform::Pwm).unwrap();
        let t = gen.device().table(Channel::Ch1);
        let high = t.iter().filter(|&&s| s == 1.0).count();
        assert_eq!(high, 2 * ((BUFFER_LENGTH / 2) as f32 * 0.2) as usize);
    }

    #[test]
    fn test_phase_offset_passed_to_device() {
        let mut gen = generator();
        gen.set_phase(Channel::Ch2, 90.0).unwrap();
        assert_eq!(gen.device().phase_offset(Channel::Ch2), BUFFER_LENGTH / 4);

        assert!(gen.set_phase(Channel::Ch2, 360.0).is_err());
        assert!(gen.set_phase(Channel::Ch2, -1.0).is_err());
        assert_eq!(gen.phase(Channel::Ch2), 90.0);
    }

    #[test]
    fn test_frequency_shapes_square() {
        let mut gen = generator();
        gen.set_waveform(Channel::Ch1, Waveform::Square).unwrap();
        gen.set_frequency(Channel::Ch1, 1e6).unwrap();

        let t = gen.device().table(Channel::Ch1);
        let half = BUFFER_LENGTH / 2;
        assert_eq!(t[half - 301], 1.0);
        assert!(t[half - 150].abs() < 1e-5);

        assert!(gen.set_frequency(Channel::Ch1, 0.0).is_err());
        assert!(gen.set_frequency(Channel::Ch1, 70e6).is_err());
        assert_eq!(gen.frequency(Channel::Ch1), 1e6);
    }

    #[test]
    fn test_device_error_propagates() {
        let mut gen = generator();
        gen.device_mut().fail_table_writes(true);

        let err = gen.set_waveform(Channel::Ch1, Waveform::Triangle).unwrap_err();
        assert!(matches!(
            err,
            GenError::Device(DeviceError::WriteFailed { .. })
        ));
        assert!(gen.set_duty_cycle(Channel::Ch1, 0.3).is_err());
    }
}
