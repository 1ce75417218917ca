#![deny(warnings)]
#![no_std]
#![no_main]

use afsk1200::hardware::{Clock, SampleSink};
use afsk1200::iir::Butterworth;
use afsk1200::modem::Modem;
use afsk1200::settings::ModemSettings;
use afsk1200::status::StatusFlags;

use stm32h7xx_hal as hal;
use stm32h7xx_hal::prelude::*;

const RX_CAPACITY: usize = 256;
const TX_CAPACITY: usize = 64;
type TncModem = Modem<Butterworth, RX_CAPACITY, TX_CAPACITY>;

/// Millisecond clock backed by the RTIC systick monotonic, shared by the
/// facade's blocking operations.
struct RticClock<'a>(&'a core::cell::Cell<u32>);

impl<'a> Clock for RticClock<'a> {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
    fn relax(&self) {
        cortex_m::asm::nop();
    }
}

struct DacSink<'a> {
    dac: &'a mut hal::dac::C1,
}

impl<'a> SampleSink for DacSink<'a> {
    fn enable(&mut self) {
        self.dac.enable();
    }
    fn disable(&mut self) {
        self.dac.disable();
    }
}

#[rtic::app(device = stm32h7xx_hal::stm32, peripherals = true, monotonic = rtic::cyccnt::CYCCNT)]
const APP: () = {
    struct Resources {
        modem: TncModem,
        adc: hal::adc::Adc<hal::stm32::ADC1, hal::adc::Enabled>,
        dac: hal::dac::C1,
        millis: core::cell::Cell<u32>,
    }

    #[init]
    fn init(c: init::Context) -> init::LateResources {
        rtt_target::rtt_init_print!();
        log::set_max_level(log::LevelFilter::Info);

        let dp = c.device;
        let pwr = dp.PWR.constrain();
        let pwrcfg = pwr.freeze();
        let rcc = dp.RCC.constrain();
        let ccdr = rcc.sys_ck(400.mhz()).freeze(pwrcfg, &dp.SYSCFG);

        let gpioa = dp.GPIOA.split(ccdr.peripheral.GPIOA);
        let adc_pin = gpioa.pa3.into_analog();
        let dac_pin = gpioa.pa4.into_analog();

        let adc = hal::adc::Adc::adc1(dp.ADC1, 4.mhz(), &ccdr.clocks, ccdr.peripheral.ADC12)
            .enable();
        let dac = dp.DAC.dac1(dac_pin);

        let _ = adc_pin;

        let mut flash = dp.OCTOSPI1;
        let mut storage_buf = [0u8; 128];
        let settings = afsk1200::settings::load(&mut flash, 0x0000_0000..0x0001_0000, &mut storage_buf)
            .unwrap_or_default();
        let cfg = settings.to_config().expect("flashed settings must validate");

        let modem = TncModem::new(cfg);

        init::LateResources {
            modem,
            adc,
            dac,
            millis: core::cell::Cell::new(0),
        }
    }

    /// ADC sample-ready interrupt; runs the receive half of the core at
    /// `SAMPLE_RATE` Hz.
    #[task(binds = ADC, resources = [modem, adc], priority = 3)]
    fn adc_isr(c: adc_isr::Context) {
        let sample: i8 = (c.resources.adc.read_sample() >> 8) as i8;
        c.resources.modem.adc_isr(sample);
    }

    /// DAC sample-consumed interrupt; runs the transmit half of the core at
    /// `CONFIG_DAC_SAMPLE_RATE` Hz while armed.
    #[task(binds = DAC, resources = [modem, dac], priority = 3)]
    fn dac_isr(c: dac_isr::Context) {
        let mut sink = DacSink { dac: c.resources.dac };
        let sample = c.resources.modem.dac_isr(&mut sink);
        c.resources.dac.set_value(sample as u16);
    }

    #[idle(resources = [modem, millis])]
    fn idle(mut c: idle::Context) -> ! {
        loop {
            let clock = RticClock(c.resources.millis);
            let overrun = c
                .resources
                .modem
                .lock(|modem| modem.byte_stream(&clock).error());
            if overrun.contains(StatusFlags::RXFIFO_OVERRUN) {
                log::warn!("rx fifo overrun");
                c.resources
                    .modem
                    .lock(|modem| modem.byte_stream(&clock).clear_error());
            }
            cortex_m::asm::wfi();
        }
    }
};
