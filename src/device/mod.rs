//! Device adapter interface
//!
//! The generator handler never touches registers directly. Everything it
//! programs goes through `SignalDevice`, which stores values in hardware
//! form: 0-based repetitions, burst delay instead of burst period, and raw
//! trigger source codes.

pub mod sim;

pub use sim::{DeviceWrite, SimulatedDevice};

use thiserror::Error;

use crate::channel::Channel;

/// Result type for device adapter operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Errors reported by a device adapter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    /// Sample table could not be written
    #[error("sample table write failed on {channel}: {reason}")]
    WriteFailed { channel: Channel, reason: String },

    /// Requested table is larger than the hardware buffer
    #[error("table size {size} exceeds buffer length {max}")]
    TableTooLarge { size: usize, max: usize },

    /// Phase offset does not point inside the buffer
    #[error("phase offset {offset} outside buffer of {max} samples")]
    PhaseOutOfRange { offset: usize, max: usize },
}

/// Hardware-facing side of the generator
///
/// Getters return exactly what the matching setter stored, in hardware
/// encoding. Implementations may be a memory-mapped FPGA block or the
/// in-process `SimulatedDevice`.
pub trait SignalDevice {
    // =========================================================================
    // Sample table
    // =========================================================================

    /// Program one waveform period
    ///
    /// # Arguments
    /// * `table` - Full buffer of normalized samples
    /// * `phase_offset` - Sample index the output starts from
    /// * `size` - Number of samples played from the start of `table`
    fn write_samples(
        &mut self,
        channel: Channel,
        table: &[f32],
        phase_offset: usize,
        size: usize,
    ) -> DeviceResult<()>;

    // =========================================================================
    // Output stage
    // =========================================================================

    fn set_output_enabled(&mut self, channel: Channel, enabled: bool) -> DeviceResult<()>;
    fn output_enabled(&self, channel: Channel) -> DeviceResult<bool>;

    fn set_frequency(&mut self, channel: Channel, frequency: f32) -> DeviceResult<()>;
    fn frequency(&self, channel: Channel) -> DeviceResult<f32>;

    fn set_amplitude(&mut self, channel: Channel, amplitude: f32) -> DeviceResult<()>;
    fn amplitude(&self, channel: Channel) -> DeviceResult<f32>;

    fn set_offset(&mut self, channel: Channel, offset: f32) -> DeviceResult<()>;
    fn offset(&self, channel: Channel) -> DeviceResult<f32>;

    // =========================================================================
    // Burst registers
    // =========================================================================

    /// Waveform periods per burst; 0 means infinite
    fn set_burst_count(&mut self, channel: Channel, count: u32) -> DeviceResult<()>;
    fn burst_count(&self, channel: Channel) -> DeviceResult<u32>;

    /// Additional bursts after the first
    fn set_burst_repetitions(&mut self, channel: Channel, repetitions: u32) -> DeviceResult<()>;
    fn burst_repetitions(&self, channel: Channel) -> DeviceResult<u32>;

    /// Idle time between bursts in microseconds; 1 means no gap
    fn set_burst_delay(&mut self, channel: Channel, delay: u32) -> DeviceResult<()>;
    fn burst_delay(&self, channel: Channel) -> DeviceResult<u32>;

    fn set_gated_burst(&mut self, channel: Channel, gated: bool) -> DeviceResult<()>;
    fn gated_burst(&self, channel: Channel) -> DeviceResult<bool>;

    // =========================================================================
    // Triggering
    // =========================================================================

    /// Write the raw trigger source code
    ///
    /// Writing the internal code while it is already selected fires a
    /// software trigger.
    fn set_trigger_source(&mut self, channel: Channel, code: u32) -> DeviceResult<()>;
    fn trigger_source(&self, channel: Channel) -> DeviceResult<u32>;

    /// Trigger both channels on the same clock edge
    fn trigger_simultaneous(&mut self) -> DeviceResult<()>;

    /// Realign the phase accumulators of both channels
    fn synchronise(&mut self) -> DeviceResult<()>;
}
