//! FM discriminator + IIR low-pass + phase-locked bit sampler
//! (`spec.md` §4.2, §4.3), driven one ADC sample at a time.
//!
//! The filter profile is a compile-time type parameter rather than a
//! runtime branch, per the build-time-configuration design note in
//! `spec.md` §9.

use crate::delay::SampleDelayLine;
use crate::iir::{Filter, IirState};
use crate::{PHASE_BIT, PHASE_INC, PHASE_MAX, PHASE_THRES};

/// Demodulator state: delay line, IIR history, and the two bit-decision
/// shift registers (`spec.md` §3 "Demodulator state").
pub struct Demodulator<F> {
    delay: SampleDelayLine,
    filter: F,
    iir: IirState,
    sampled_bits: u8,
    curr_phase: i32,
    found_bits: u8,
}

impl<F: Filter + Default> Default for Demodulator<F> {
    fn default() -> Self {
        Self::with_filter(F::default())
    }
}

impl<F: Filter> Demodulator<F> {
    pub fn with_filter(filter: F) -> Self {
        Self {
            delay: SampleDelayLine::new(),
            filter,
            iir: IirState::default(),
            sampled_bits: 0,
            curr_phase: 0,
            found_bits: 0,
        }
    }

    /// Processes one signed 8-bit ADC sample. Returns a decoded NRZI data
    /// bit (`true` = 1, `false` = 0) once a bit period elapses, `None`
    /// otherwise.
    pub fn sample(&mut self, x: i8) -> Option<bool> {
        let d = self.delay.push_pop(x);
        let raw = ((d as i16) * (x as i16)) >> 2;
        let y = self.filter.step(&mut self.iir, raw);

        let bit = (y > 0) as u8;
        self.sampled_bits = (self.sampled_bits << 1) | bit;

        let edge = (self.sampled_bits ^ (self.sampled_bits >> 1)) & 1;
        if edge != 0 {
            if self.curr_phase < PHASE_THRES {
                self.curr_phase += PHASE_INC;
            } else {
                self.curr_phase -= PHASE_INC;
            }
        }
        self.curr_phase += PHASE_BIT;

        if self.curr_phase >= PHASE_MAX {
            self.curr_phase %= PHASE_MAX;

            self.found_bits <<= 1;
            let b = self.sampled_bits & 0x07;
            let decided = matches!(b, 0x07 | 0x06 | 0x05 | 0x03);
            if decided {
                self.found_bits |= 1;
            }

            let edge_found = (self.found_bits ^ (self.found_bits >> 1)) & 1;
            Some(edge_found == 0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iir::Butterworth;

    #[test]
    fn one_bit_decision_per_eight_samples() {
        let mut demod: Demodulator<Butterworth> = Demodulator::default();
        let mut decisions = 0;
        for i in 0..800 {
            let x = if (i / 4) % 2 == 0 { 100 } else { -100 };
            if demod.sample(x).is_some() {
                decisions += 1;
            }
        }
        // Exactly one decision every SAMPLES_PER_BIT=8 samples, steady state.
        assert_eq!(decisions, 100);
    }
}
