//! The modem instance: owns every subsystem and exposes the two interrupt
//! entry points plus the foreground byte-stream facade (`spec.md` §2, §3
//! "Modem instance", §6 "Peripheral collaborators").
//!
//! Field grouping follows the ownership rules of `spec.md` §5 directly:
//! `demod`/`framer` are touched only from [`Modem::adc_isr`], `txseq` only
//! from [`Modem::dac_isr`], and the two queues plus `status` are the sole
//! crossing points between ISR and foreground.

use crate::config::Config;
use crate::demod::Demodulator;
use crate::facade::{ByteStream, TransmitControl};
use crate::hardware::{Clock, SampleSink};
use crate::hdlc::HdlcFramer;
use crate::iir::Filter;
use crate::status::{Status, StatusFlags};
use crate::txseq::TransmitSequencer;
use heapless::spsc::Queue;

/// Top-level modem instance, generic over the compile-time filter profile
/// and the receive/transmit queue capacities.
pub struct Modem<F, const RN: usize, const TN: usize>
where
    F: Filter,
{
    cfg: Config,
    demod: Demodulator<F>,
    framer: HdlcFramer,
    txseq: TransmitSequencer,
    status: Status,
    rx_fifo: Queue<u8, RN>,
    tx_fifo: Queue<u8, TN>,
}

impl<F, const RN: usize, const TN: usize> Modem<F, RN, TN>
where
    F: Filter + Default,
{
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            demod: Demodulator::default(),
            framer: HdlcFramer::new(),
            txseq: TransmitSequencer::new(),
            status: Status::new(),
            rx_fifo: Queue::new(),
            tx_fifo: Queue::new(),
        }
    }

    /// Must be called at exactly `SAMPLE_RATE = 9600` Hz with one signed
    /// 8-bit ADC sample (`spec.md` §6). Touches only the demodulator, the
    /// framer, the receive queue, and the status mask.
    pub fn adc_isr(&mut self, sample: i8) {
        if let Some(bit) = self.demod.sample(sample) {
            let rx_fifo = &mut self.rx_fifo;
            let accepted = self
                .framer
                .accept_bit(bit, &mut |byte| rx_fifo.enqueue(byte).is_ok());
            if !accepted {
                self.status.set(StatusFlags::RXFIFO_OVERRUN);
            }
        }
    }

    /// Must be called at `CONFIG_DAC_SAMPLE_RATE` Hz while the sequencer is
    /// sending; returns the next 8-bit audio sample. Touches only the
    /// transmit sequencer, the transmit queue, and `sink`.
    pub fn dac_isr(&mut self, sink: &mut impl SampleSink) -> u8 {
        self.txseq.dac_isr(&mut self.tx_fifo, &self.cfg, sink)
    }

    /// Borrows a [`ByteStream`] over this instance's queues for one
    /// foreground operation.
    pub fn byte_stream<'a, C: Clock>(&'a mut self, clock: &'a C) -> ByteStream<'a, RN, TN, C> {
        ByteStream::new(
            &mut self.rx_fifo,
            &mut self.tx_fifo,
            &self.status,
            clock,
            self.cfg.rx_timeout,
        )
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }
}

impl<F, const RN: usize, const TN: usize> TransmitControl for Modem<F, RN, TN>
where
    F: Filter,
{
    fn start_transmission<S: SampleSink>(&mut self, sink: &mut S) {
        if self.txseq.tx_start(&self.cfg) {
            sink.enable();
        }
    }

    fn is_sending(&self) -> bool {
        self.txseq.is_sending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RxTimeout;
    use crate::hardware::fakes::{FakeClock, FakeSink};
    use crate::iir::Butterworth;

    type TestModem = Modem<Butterworth, 256, 64>;

    fn cfg() -> Config {
        Config::new(9600, 10, 10, RxTimeout::NonBlocking).unwrap()
    }

    #[test]
    fn adc_isr_never_panics_and_leaves_status_clear_without_a_flag() {
        let mut modem: TestModem = Modem::new(cfg());
        // A steady alternating-sign tone never assembles a 0x7E flag (it is
        // all "no tone change" under NRZI, i.e. a run of decoded 1 bits), so
        // no byte is ever pushed and the status mask stays clear.
        for i in 0..800 {
            let x: i8 = if (i / 4) % 2 == 0 { 100 } else { -100 };
            modem.adc_isr(x);
        }
        let clock = FakeClock::new();
        let stream = modem.byte_stream(&clock);
        assert_eq!(stream.error(), StatusFlags::empty());
    }

    #[test]
    fn write_then_flush_drains_the_transmitter() {
        let mut modem: TestModem = Modem::new(cfg());
        let mut sink = FakeSink::default();

        modem.tx_fifo.enqueue(0x41).unwrap();
        modem.start_transmission(&mut sink);
        assert!(modem.is_sending());
        assert_eq!(sink.enable_count, 1);

        // Drain the whole frame: preamble + one byte + trailer.
        let total_bits = modem.cfg.preamble_len_bits() + 8 + modem.cfg.trailer_len_bits() + 8;
        let samples_per_bit = modem.cfg.dac_samples_per_bit as u32;
        for _ in 0..(total_bits * samples_per_bit) {
            if !modem.is_sending() {
                break;
            }
            modem.dac_isr(&mut sink);
        }
        assert!(!modem.is_sending());
        assert_eq!(sink.disable_count, 1);
    }
}
