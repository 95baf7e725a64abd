//! Two-level waveforms: PWM and band-limited square

use super::TableGenerator;

/// Ramp width in samples at 1 MHz
const SQUARE_TRANS_AT_1MHZ: f64 = 300.0;
/// Ramp width used when the scaled width is too small to matter
const SQUARE_TRANS_MIN: i64 = 30;

/// Pulse-width modulated rectangle
///
/// High for the first and last `floor(N/2 · duty)` samples, low in between,
/// so the pulse is centred on the table wrap point.
pub struct Pwm {
    duty_cycle: f32,
}

impl Pwm {
    pub fn new(duty_cycle: f32) -> Self {
        Self { duty_cycle }
    }

    /// Number of high samples on each side of the wrap point
    pub fn high_samples(&self, n: usize) -> usize {
        ((n / 2) as f32 * self.duty_cycle) as usize
    }
}

impl TableGenerator for Pwm {
    fn fill(&self, table: &mut [f32]) -> usize {
        let n = table.len();
        let h = self.high_samples(n);
        for (i, sample) in table.iter_mut().enumerate() {
            *sample = if i < h || i >= n - h.min(n) { 1.0 } else { -1.0 };
        }
        n
    }
}

/// Square wave with linear edges
///
/// The edge width scales with output frequency so the DAC reconstruction
/// filter sees a similar slew at any rate.
pub struct Square {
    frequency: f32,
}

impl Square {
    pub fn new(frequency: f32) -> Self {
        Self { frequency }
    }

    /// Edge ramp width in samples
    pub fn transition(&self) -> i64 {
        let trans = (self.frequency as f64 / 1e6 * SQUARE_TRANS_AT_1MHZ).round() as i64;
        if trans <= 10 {
            SQUARE_TRANS_MIN
        } else {
            trans
        }
    }
}

impl TableGenerator for Square {
    fn fill(&self, table: &mut [f32]) -> usize {
        let n = table.len() as i64;
        let half = n / 2;
        let trans = self.transition();
        let step = 2.0f32 / trans as f32;

        for (i, sample) in table.iter_mut().enumerate() {
            let i = i as i64;
            *sample = if i < half - trans {
                1.0
            } else if i < half {
                1.0 - step * (i - (half - trans)) as f32
            } else if i < n - trans {
                -1.0
            } else {
                -1.0 + step * (i - (n - trans)) as f32
            };
        }
        table.len()
    }
}
