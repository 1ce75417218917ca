//! Peripheral collaborator contracts (`spec.md` §6, §9 "Peripheral
//! abstraction"). These are the trio of capabilities the core needs from
//! whatever is driving it — a real DAC/timer pair on target, or a
//! file/array-backed fake in a host test.

/// The DAC output peripheral: arms/disarms sample delivery. ADC sampling has
/// no equivalent contract here because the ADC interrupt drives the core
/// directly (`Modem::adc_isr`) rather than being polled or toggled.
pub trait SampleSink {
    /// Arms DAC interrupt delivery (`dac_irq_start`).
    fn enable(&mut self);
    /// Disarms DAC interrupt delivery (`dac_irq_stop`).
    fn disable(&mut self);
}

/// A monotonic millisecond clock plus a busy-wait relax hint, used by the
/// byte-stream facade's blocking operations.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch; must never go backwards.
    fn now_ms(&self) -> u32;
    /// A CPU-relax hint between polls of a condition. Must not block.
    fn relax(&self);
}

#[cfg(test)]
pub mod fakes {
    //! Host-only fakes used by unit tests and doctests elsewhere in the
    //! crate; not part of the public API.
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    pub struct FakeSink {
        pub enabled: bool,
        pub enable_count: u32,
        pub disable_count: u32,
    }

    impl SampleSink for FakeSink {
        fn enable(&mut self) {
            self.enabled = true;
            self.enable_count += 1;
        }
        fn disable(&mut self) {
            self.enabled = false;
            self.disable_count += 1;
        }
    }

    /// A clock whose `now_ms` is advanced manually by the test.
    pub struct FakeClock(Cell<u32>);

    impl FakeClock {
        pub fn new() -> Self {
            Self(Cell::new(0))
        }

        pub fn advance(&self, ms: u32) {
            self.0.set(self.0.get() + ms);
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> u32 {
            self.0.get()
        }
        fn relax(&self) {}
    }
}
