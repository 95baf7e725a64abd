pub mod analytic;
pub mod edge;

pub use analytic::{Dc, RampDown, RampUp, Sine, Triangle};
pub use edge::{Pwm, Square};

use crate::channel::Waveform;
use crate::config::BUFFER_LENGTH;

/// Core trait for all table generators
///
/// A table generator fills one full hardware buffer with a single period of
/// its waveform. Generators are pure: the same parameters always produce
/// the same table.
pub trait TableGenerator {
    /// Fill `table` with one waveform period
    ///
    /// # Arguments
    /// * `table` - Buffer to fill. Always `BUFFER_LENGTH` samples long.
    ///
    /// # Returns
    /// Number of samples the hardware should play from the start of `table`.
    /// Only arbitrary waveforms report less than the full buffer.
    fn fill(&self, table: &mut [f32]) -> usize;
}

/// A synthesized waveform ready for the device
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformTable {
    /// Always `BUFFER_LENGTH` samples
    pub samples: Vec<f32>,
    /// Effective length played by the hardware
    pub size: usize,
}

impl WaveformTable {
    /// Samples the hardware actually plays
    pub fn active(&self) -> &[f32] {
        &self.samples[..self.size]
    }
}

/// Shape parameters read by the synthesizer
#[derive(Debug, Clone, Copy)]
pub struct ShapeParams<'a> {
    pub duty_cycle: f32,
    pub frequency: f32,
    /// Full arbitrary buffer (zero past `arbitrary_len`)
    pub arbitrary: &'a [f32],
    pub arbitrary_len: usize,
}

/// Replays a stored arbitrary buffer
pub struct Arbitrary<'a> {
    data: &'a [f32],
    len: usize,
}

impl<'a> Arbitrary<'a> {
    pub fn new(data: &'a [f32], len: usize) -> Self {
        Self {
            data,
            len: len.min(data.len()),
        }
    }
}

impl TableGenerator for Arbitrary<'_> {
    fn fill(&self, table: &mut [f32]) -> usize {
        let n = self.data.len().min(table.len());
        table[..n].copy_from_slice(&self.data[..n]);
        table[n..].fill(0.0);
        self.len
    }
}

/// Build the sample table for `waveform`
pub fn synthesize(waveform: Waveform, params: &ShapeParams<'_>) -> WaveformTable {
    let mut samples = vec![0.0f32; BUFFER_LENGTH];
    let size = match waveform {
        Waveform::Sine => Sine.fill(&mut samples),
        Waveform::Triangle => Triangle.fill(&mut samples),
        Waveform::Square => Square::new(params.frequency).fill(&mut samples),
        Waveform::RampUp => RampUp.fill(&mut samples),
        Waveform::RampDown => RampDown.fill(&mut samples),
        Waveform::Dc => Dc.fill(&mut samples),
        Waveform::Pwm => Pwm::new(params.duty_cycle).fill(&mut samples),
        Waveform::Arbitrary => {
            Arbitrary::new(params.arbitrary, params.arbitrary_len).fill(&mut samples)
        }
    };
    WaveformTable { samples, size }
}
