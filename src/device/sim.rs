//! Simulated device adapter for development and testing
//!
//! Keeps one register set per channel in memory and records every write in
//! order, so tests can check not only the final state but also which
//! registers a setter touched.

use super::{DeviceError, DeviceResult, SignalDevice};
use crate::channel::Channel;
use crate::config::BUFFER_LENGTH;

/// A single register write observed by the simulator
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceWrite {
    Samples {
        channel: Channel,
        size: usize,
        phase_offset: usize,
    },
    OutputEnabled(Channel, bool),
    Frequency(Channel, f32),
    Amplitude(Channel, f32),
    Offset(Channel, f32),
    BurstCount(Channel, u32),
    BurstRepetitions(Channel, u32),
    BurstDelay(Channel, u32),
    GatedBurst(Channel, bool),
    TriggerSource(Channel, u32),
    TriggerSimultaneous,
    Synchronise,
}

#[derive(Debug, Clone)]
struct SimRegisters {
    table: Vec<f32>,
    table_size: usize,
    phase_offset: usize,
    output_enabled: bool,
    frequency: f32,
    amplitude: f32,
    offset: f32,
    burst_count: u32,
    burst_repetitions: u32,
    burst_delay: u32,
    gated_burst: bool,
    trigger_source: u32,
}

impl Default for SimRegisters {
    fn default() -> Self {
        Self {
            table: vec![0.0; BUFFER_LENGTH],
            table_size: BUFFER_LENGTH,
            phase_offset: 0,
            output_enabled: false,
            frequency: 1000.0,
            amplitude: 0.0,
            offset: 0.0,
            burst_count: 0,
            burst_repetitions: 0,
            burst_delay: 0,
            gated_burst: false,
            trigger_source: 0,
        }
    }
}

/// In-memory generator hardware
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    registers: [SimRegisters; 2],
    log: Vec<DeviceWrite>,
    fail_table_writes: bool,
}

impl SimulatedDevice {
    /// Create a simulator with all registers cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `write_samples` call fail
    pub fn fail_table_writes(&mut self, fail: bool) {
        self.fail_table_writes = fail;
    }

    /// All writes since creation or the last `clear_log`
    pub fn log(&self) -> &[DeviceWrite] {
        &self.log
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    /// Last table written to `channel`
    pub fn table(&self, channel: Channel) -> &[f32] {
        &self.regs(channel).table
    }

    pub fn table_size(&self, channel: Channel) -> usize {
        self.regs(channel).table_size
    }

    pub fn phase_offset(&self, channel: Channel) -> usize {
        self.regs(channel).phase_offset
    }

    /// Number of trigger source writes with `code` on `channel`
    pub fn trigger_writes(&self, channel: Channel, code: u32) -> usize {
        self.log
            .iter()
            .filter(|w| **w == DeviceWrite::TriggerSource(channel, code))
            .count()
    }

    fn regs(&self, channel: Channel) -> &SimRegisters {
        &self.registers[channel.index()]
    }

    fn regs_mut(&mut self, channel: Channel) -> &mut SimRegisters {
        &mut self.registers[channel.index()]
    }

    fn record(&mut self, write: DeviceWrite) {
        tracing::trace!(?write, "register write");
        self.log.push(write);
    }
}

impl SignalDevice for SimulatedDevice {
    fn write_samples(
        &mut self,
        channel: Channel,
        table: &[f32],
        phase_offset: usize,
        size: usize,
    ) -> DeviceResult<()> {
        if self.fail_table_writes {
            return Err(DeviceError::WriteFailed {
                channel,
                reason: "simulated failure".to_string(),
            });
        }
        if size > BUFFER_LENGTH || size > table.len() {
            return Err(DeviceError::TableTooLarge {
                size,
                max: BUFFER_LENGTH.min(table.len()),
            });
        }
        if phase_offset >= BUFFER_LENGTH {
            return Err(DeviceError::PhaseOutOfRange {
                offset: phase_offset,
                max: BUFFER_LENGTH,
            });
        }

        let regs = self.regs_mut(channel);
        let n = table.len().min(BUFFER_LENGTH);
        regs.table[..n].copy_from_slice(&table[..n]);
        regs.table[n..].fill(0.0);
        regs.table_size = size;
        regs.phase_offset = phase_offset;
        self.record(DeviceWrite::Samples {
            channel,
            size,
            phase_offset,
        });
        Ok(())
    }

    fn set_output_enabled(&mut self, channel: Channel, enabled: bool) -> DeviceResult<()> {
        self.regs_mut(channel).output_enabled = enabled;
        self.record(DeviceWrite::OutputEnabled(channel, enabled));
        Ok(())
    }

    fn output_enabled(&self, channel: Channel) -> DeviceResult<bool> {
        Ok(self.regs(channel).output_enabled)
    }

    fn set_frequency(&mut self, channel: Channel, frequency: f32) -> DeviceResult<()> {
        self.regs_mut(channel).frequency = frequency;
        self.record(DeviceWrite::Frequency(channel, frequency));
        Ok(())
    }

    fn frequency(&self, channel: Channel) -> DeviceResult<f32> {
        Ok(self.regs(channel).frequency)
    }

    fn set_amplitude(&mut self, channel: Channel, amplitude: f32) -> DeviceResult<()> {
        self.regs_mut(channel).amplitude = amplitude;
        self.record(DeviceWrite::Amplitude(channel, amplitude));
        Ok(())
    }

    fn amplitude(&self, channel: Channel) -> DeviceResult<f32> {
        Ok(self.regs(channel).amplitude)
    }

    fn set_offset(&mut self, channel: Channel, offset: f32) -> DeviceResult<()> {
        self.regs_mut(channel).offset = offset;
        self.record(DeviceWrite::Offset(channel, offset));
        Ok(())
    }

    fn offset(&self, channel: Channel) -> DeviceResult<f32> {
        Ok(self.regs(channel).offset)
    }

    fn set_burst_count(&mut self, channel: Channel, count: u32) -> DeviceResult<()> {
        self.regs_mut(channel).burst_count = count;
        self.record(DeviceWrite::BurstCount(channel, count));
        Ok(())
    }

    fn burst_count(&self, channel: Channel) -> DeviceResult<u32> {
        Ok(self.regs(channel).burst_count)
    }

    fn set_burst_repetitions(&mut self, channel: Channel, repetitions: u32) -> DeviceResult<()> {
        self.regs_mut(channel).burst_repetitions = repetitions;
        self.record(DeviceWrite::BurstRepetitions(channel, repetitions));
        Ok(())
    }

    fn burst_repetitions(&self, channel: Channel) -> DeviceResult<u32> {
        Ok(self.regs(channel).burst_repetitions)
    }

    fn set_burst_delay(&mut self, channel: Channel, delay: u32) -> DeviceResult<()> {
        self.regs_mut(channel).burst_delay = delay;
        self.record(DeviceWrite::BurstDelay(channel, delay));
        Ok(())
    }

    fn burst_delay(&self, channel: Channel) -> DeviceResult<u32> {
        Ok(self.regs(channel).burst_delay)
    }

    fn set_gated_burst(&mut self, channel: Channel, gated: bool) -> DeviceResult<()> {
        self.regs_mut(channel).gated_burst = gated;
        self.record(DeviceWrite::GatedBurst(channel, gated));
        Ok(())
    }

    fn gated_burst(&self, channel: Channel) -> DeviceResult<bool> {
        Ok(self.regs(channel).gated_burst)
    }

    fn set_trigger_source(&mut self, channel: Channel, code: u32) -> DeviceResult<()> {
        self.regs_mut(channel).trigger_source = code;
        self.record(DeviceWrite::TriggerSource(channel, code));
        Ok(())
    }

    fn trigger_source(&self, channel: Channel) -> DeviceResult<u32> {
        Ok(self.regs(channel).trigger_source)
    }

    fn trigger_simultaneous(&mut self) -> DeviceResult<()> {
        self.record(DeviceWrite::TriggerSimultaneous);
        Ok(())
    }

    fn synchronise(&mut self) -> DeviceResult<()> {
        self.record(DeviceWrite::Synchronise);
        Ok(())
    }
}
