//! Foreground error surface. The interrupt-context hot path is infallible by
//! construction (`spec.md` §7): the only runtime error kind it can produce
//! is `RXFIFO_OVERRUN`, reported through [`crate::status::StatusFlags`], not
//! through this type.

/// Errors from the foreground configuration/settings surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModemError {
    /// `Config::new` rejected a `ModemSettings` value, e.g. a
    /// `dac_sample_rate` that is not a multiple of `BIT_RATE`.
    InvalidSettings,
    /// The settings flash region could not be read, written, or decoded.
    StorageFailure,
}

impl core::fmt::Display for ModemError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ModemError::InvalidSettings => write!(f, "invalid modem settings"),
            ModemError::StorageFailure => write!(f, "settings storage failure"),
        }
    }
}
