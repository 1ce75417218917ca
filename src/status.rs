//! Status mask: writable from the receive ISR, readable/clearable
//! atomically from foreground (`spec.md` §3 "Status flags", §7).

use core::sync::atomic::{AtomicU8, Ordering};

bitflags::bitflags! {
    /// Bits of the modem status mask.
    pub struct StatusFlags: u8 {
        /// The receive byte queue could not accept a frame byte; the
        /// in-flight frame was abandoned.
        const RXFIFO_OVERRUN = 0b0000_0001;
    }
}

/// Atomic holder for [`StatusFlags`], shared between the ADC ISR and
/// foreground without any additional locking.
#[derive(Default)]
pub struct Status(AtomicU8);

impl Status {
    pub const fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Sets `flags` in addition to whatever is already set. Called only
    /// from the receive ISR.
    pub fn set(&self, flags: StatusFlags) {
        self.0.fetch_or(flags.bits(), Ordering::Relaxed);
    }

    /// Returns the current mask. Called from foreground.
    pub fn get(&self) -> StatusFlags {
        StatusFlags::from_bits_truncate(self.0.load(Ordering::Relaxed))
    }

    /// Atomically reads and clears the mask. Called from foreground.
    pub fn take(&self) -> StatusFlags {
        let bits = self.0.swap(0, Ordering::Relaxed);
        StatusFlags::from_bits_truncate(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_take_round_trips_and_clears() {
        let status = Status::new();
        assert_eq!(status.get(), StatusFlags::empty());
        status.set(StatusFlags::RXFIFO_OVERRUN);
        assert_eq!(status.get(), StatusFlags::RXFIFO_OVERRUN);
        let taken = status.take();
        assert_eq!(taken, StatusFlags::RXFIFO_OVERRUN);
        assert_eq!(status.get(), StatusFlags::empty());
    }
}
