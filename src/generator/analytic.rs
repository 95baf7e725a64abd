//! Closed-form waveform tables
//!
//! Each generator evaluates its formula in f64 over the sample index and
//! stores the result as f32, the format the device accepts.

use std::f64::consts::PI;

use super::TableGenerator;

/// One sine period: `sin(2π·i/N)`
pub struct Sine;

/// Triangle built as `(2/π)·asin(sin(2π·i/N))`
pub struct Triangle;

/// Falling ramp from 1.0 toward 0.0
pub struct RampDown;

/// Rising ramp, the index-reversed `RampDown`
///
/// The last sample is pinned to 0.0 and the remaining samples are taken from
/// `RampDown` shifted by one, so the table starts one step above zero rather
/// than at it.
pub struct RampUp;

/// Constant full-scale output
pub struct Dc;

fn ramp_down_sample(i: usize, n: usize) -> f32 {
    (-1.0 * ((PI * i as f64 / n as f64).cos().acos() / PI - 1.0)) as f32
}

impl TableGenerator for Sine {
    fn fill(&self, table: &mut [f32]) -> usize {
        let n = table.len();
        for (i, sample) in table.iter_mut().enumerate() {
            *sample = (2.0 * PI * i as f64 / n as f64).sin() as f32;
        }
        n
    }
}

impl TableGenerator for Triangle {
    fn fill(&self, table: &mut [f32]) -> usize {
        let n = table.len();
        for (i, sample) in table.iter_mut().enumerate() {
            *sample = ((2.0 * PI * i as f64 / n as f64).sin().asin() / PI * 2.0) as f32;
        }
        n
    }
}

impl TableGenerator for RampDown {
    fn fill(&self, table: &mut [f32]) -> usize {
        let n = table.len();
        for (i, sample) in table.iter_mut().enumerate() {
            *sample = ramp_down_sample(i, n);
        }
        n
    }
}

impl TableGenerator for RampUp {
    fn fill(&self, table: &mut [f32]) -> usize {
        let n = table.len();
        if n == 0 {
            return 0;
        }
        table[n - 1] = 0.0;
        for i in 0..n - 1 {
            table[n - i - 2] = ramp_down_sample(i, n);
        }
        n
    }
}

impl TableGenerator for Dc {
    fn fill(&self, table: &mut [f32]) -> usize {
        table.fill(1.0);
        table.len()
    }
}
