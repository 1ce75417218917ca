//! Derived, validated configuration for a `Modem` instance (`spec.md` §6
//! "Configuration parameters"), plus the ambient `ModemSettings` persistence
//! wrapper around it (`SPEC_FULL.md` §3).

use crate::error::ModemError;
use crate::{BIT_RATE, MARK_FREQ, SPACE_FREQ};

/// `CONFIG_RX_TIMEOUT_MS ∈ {0, −1, positive}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RxTimeout {
    /// 0: return immediately with whatever is available.
    NonBlocking,
    /// -1: block indefinitely until a byte is available.
    Blocking,
    /// Positive: block until a byte arrives or this many milliseconds
    /// elapse since the most recent `read` attempt.
    Millis(u32),
}

impl RxTimeout {
    pub fn from_config_ms(ms: i32) -> Self {
        match ms {
            0 => RxTimeout::NonBlocking,
            n if n < 0 => RxTimeout::Blocking,
            n => RxTimeout::Millis(n as u32),
        }
    }
}

/// `CONFIG_FILTER ∈ {BUTTERWORTH, CHEBYSHEV}`. The active profile is still
/// chosen at compile time (`Modem<F>`'s type parameter); this enum only
/// records which one a given firmware image was built with, for settings
/// round-tripping and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FilterProfile {
    Butterworth,
    Chebyshev,
}

/// Validated, derived configuration. Constructed once at startup;
/// `Modem::new` takes this by value.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub dac_sample_rate: u32,
    pub preamble_len_ms: u32,
    pub trailer_len_ms: u32,
    pub rx_timeout: RxTimeout,
    pub mark_inc: u16,
    pub space_inc: u16,
    pub dac_samples_per_bit: u16,
}

fn round_div_u32(numer: u64, denom: u64) -> u64 {
    (numer + denom / 2) / denom
}

fn ceil_div_u32(numer: u32, denom: u32) -> u32 {
    (numer + denom - 1) / denom
}

impl Config {
    /// Validates and derives `MARK_INC`/`SPACE_INC`/`DAC_SAMPLES_PER_BIT`
    /// from the raw `CONFIG_*` parameters (`spec.md` §3 invariants).
    pub fn new(
        dac_sample_rate: u32,
        preamble_len_ms: u32,
        trailer_len_ms: u32,
        rx_timeout: RxTimeout,
    ) -> Result<Self, ModemError> {
        if dac_sample_rate == 0 || dac_sample_rate % BIT_RATE != 0 {
            return Err(ModemError::InvalidSettings);
        }

        let mark_inc = round_div_u32(512 * MARK_FREQ as u64, dac_sample_rate as u64) as u16;
        let space_inc = round_div_u32(512 * SPACE_FREQ as u64, dac_sample_rate as u64) as u16;
        let dac_samples_per_bit = (dac_sample_rate / BIT_RATE) as u16;

        Ok(Self {
            dac_sample_rate,
            preamble_len_ms,
            trailer_len_ms,
            rx_timeout,
            mark_inc,
            space_inc,
            dac_samples_per_bit,
        })
    }

    /// Preamble length in bit periods: `ceil(CONFIG_PREAMBLE_LEN_MS * BIT_RATE / 8000)`.
    pub fn preamble_len_bits(&self) -> u32 {
        ceil_div_u32(self.preamble_len_ms * BIT_RATE, 8000)
    }

    /// Trailer length in bit periods: `ceil(CONFIG_TRAILER_LEN_MS * BIT_RATE / 8000)`.
    pub fn trailer_len_bits(&self) -> u32 {
        ceil_div_u32(self.trailer_len_ms * BIT_RATE, 8000)
    }
}
