//! Blocking byte-stream surface offered to the link layer above
//! (`spec.md` §4.6, §6 "Byte-stream surface"). Busy-waits with a clock-
//! supplied relax hint; never allocates, never touches the ISR-only state
//! directly.

use crate::config::RxTimeout;
use crate::hardware::{Clock, SampleSink};
use crate::status::{Status, StatusFlags};
use heapless::spsc::Queue;

/// Whatever drives transmission: `Modem` in practice. Kept as a trait so the
/// facade does not need to know about the transmit sequencer directly.
/// `start_transmission` is handed the same `SampleSink` the DAC interrupt
/// uses, so arming the sink and flipping `sending` happen together instead
/// of the sink being forgotten on the write path.
pub trait TransmitControl {
    /// Arms or extends transmission; mirrors `TransmitSequencer::tx_start`,
    /// enabling `sink` the first time this is called while idle.
    fn start_transmission<S: SampleSink>(&mut self, sink: &mut S);
    /// `true` while the DAC interrupt is actively clocking out samples.
    fn is_sending(&self) -> bool;
}

/// Borrows the receive/transmit queues and status mask for the duration of
/// one foreground operation. The queues are strictly single-producer/
/// single-consumer (`spec.md` §5): this type only ever takes the foreground
/// side, the ISR side is reached directly through `Modem::adc_isr`/`dac_isr`.
pub struct ByteStream<'a, const RN: usize, const TN: usize, C>
where
    C: Clock,
{
    rx: &'a mut Queue<u8, RN>,
    tx: &'a mut Queue<u8, TN>,
    status: &'a Status,
    clock: &'a C,
    rx_timeout: RxTimeout,
}

impl<'a, const RN: usize, const TN: usize, C> ByteStream<'a, RN, TN, C>
where
    C: Clock,
{
    pub fn new(
        rx: &'a mut Queue<u8, RN>,
        tx: &'a mut Queue<u8, TN>,
        status: &'a Status,
        clock: &'a C,
        rx_timeout: RxTimeout,
    ) -> Self {
        Self {
            rx,
            tx,
            status,
            clock,
            rx_timeout,
        }
    }

    /// Copies up to `buf.len()` bytes out of the receive queue, blocking per
    /// `CONFIG_RX_TIMEOUT_MS` as configured. Returns the number of bytes
    /// copied.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        let deadline_ms = match self.rx_timeout {
            RxTimeout::Millis(ms) => Some(self.clock.now_ms().wrapping_add(ms)),
            _ => None,
        };

        let mut n = 0;
        while n < buf.len() {
            match self.rx.dequeue() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => {
                    if n > 0 {
                        break;
                    }
                    match self.rx_timeout {
                        RxTimeout::NonBlocking => break,
                        RxTimeout::Blocking => self.clock.relax(),
                        RxTimeout::Millis(_) => {
                            if self.clock.now_ms() >= deadline_ms.unwrap() {
                                break;
                            }
                            self.clock.relax();
                        }
                    }
                }
            }
        }
        n
    }

    /// Copies all of `buf` into the transmit queue, busy-waiting while it is
    /// full, then (re)starts transmission after each byte, arming `sink` the
    /// first time the transmitter leaves idle. Returns `buf.len()`.
    pub fn write(
        &mut self,
        buf: &[u8],
        tx_control: &mut impl TransmitControl,
        sink: &mut impl SampleSink,
    ) -> usize {
        for &byte in buf {
            while self.tx.enqueue(byte).is_err() {
                self.clock.relax();
            }
            tx_control.start_transmission(sink);
        }
        buf.len()
    }

    /// Blocks until the transmitter has gone idle.
    pub fn flush(&self, tx_control: &impl TransmitControl) {
        while tx_control.is_sending() {
            self.clock.relax();
        }
    }

    /// Atomically reads the status mask without clearing it.
    pub fn error(&self) -> StatusFlags {
        self.status.get()
    }

    /// Atomically reads and clears the status mask.
    pub fn clear_error(&self) -> StatusFlags {
        self.status.take()
    }
}
