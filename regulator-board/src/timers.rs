use embassy_stm32::pac;
use embassy_stm32::pac::timer::vals::{Cms, Dir, Mms, Ocm, Sms, Ts};
use embassy_stm32::pac::timer::TimGp16;

use ateam_regulator::pwm::{OutputChannel, Polarity, PwmTimer, TriggerInput};

/// The general purpose counters wired to a power stage.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum GpTimerId {
    Tim2,
    Tim3,
    Tim4,
}

/// Register level `PwmTimer` on a 16 bit general purpose counter.
///
/// Owns the counter exclusively. The embassy timer drivers are never
/// instantiated for these peripherals.
pub struct GpTimer {
    id: GpTimerId,
    regs: TimGp16,
}

impl GpTimer {
    pub fn new(id: GpTimerId) -> Self {
        let regs = match id {
            GpTimerId::Tim2 => pac::TIM2,
            GpTimerId::Tim3 => pac::TIM3,
            GpTimerId::Tim4 => pac::TIM4,
        };

        GpTimer { id, regs }
    }

    pub fn id(&self) -> GpTimerId {
        self.id
    }

    fn set_clock(&mut self, enabled: bool) {
        pac::RCC.apb1enr().modify(|w| match self.id {
            GpTimerId::Tim2 => w.set_tim2en(enabled),
            GpTimerId::Tim3 => w.set_tim3en(enabled),
            GpTimerId::Tim4 => w.set_tim4en(enabled),
        });
    }
}

const fn index(channel: OutputChannel) -> usize {
    match channel {
        OutputChannel::Ch1 => 0,
        OutputChannel::Ch2 => 1,
        OutputChannel::Ch3 => 2,
        OutputChannel::Ch4 => 3,
    }
}

impl PwmTimer for GpTimer {
    fn enable_clock(&mut self) {
        self.set_clock(true);
    }

    fn disable_clock(&mut self) {
        self.set_clock(false);
    }

    fn reset(&mut self) {
        pac::RCC.apb1rstr().modify(|w| match self.id {
            GpTimerId::Tim2 => w.set_tim2rst(true),
            GpTimerId::Tim3 => w.set_tim3rst(true),
            GpTimerId::Tim4 => w.set_tim4rst(true),
        });
        pac::RCC.apb1rstr().modify(|w| match self.id {
            GpTimerId::Tim2 => w.set_tim2rst(false),
            GpTimerId::Tim3 => w.set_tim3rst(false),
            GpTimerId::Tim4 => w.set_tim4rst(false),
        });
    }

    fn set_center_aligned(&mut self) {
        self.regs.cr1().modify(|w| {
            w.set_cms(Cms::CENTER_ALIGNED3);
            w.set_dir(Dir::UP);
            w.set_arpe(true);
        });
    }

    fn set_period(&mut self, period: u16) {
        self.regs.arr().write(|w| w.set_arr(period));
    }

    fn set_output_mode(&mut self, channel: OutputChannel, polarity: Polarity) {
        let ch = index(channel);
        let mode = match polarity {
            Polarity::ActiveHigh => Ocm::PWM_MODE1,
            Polarity::ActiveLow => Ocm::PWM_MODE2,
        };

        self.regs.ccmr_output(ch / 2).modify(|w| {
            w.set_ocm(ch % 2, mode);
            w.set_ocpe(ch % 2, true);
        });
    }

    fn set_compare(&mut self, channel: OutputChannel, value: u16) {
        self.regs.ccr(index(channel)).write(|w| w.set_ccr(value));
    }

    fn enable_output(&mut self, channel: OutputChannel) {
        self.regs.ccer().modify(|w| w.set_cce(index(channel), true));
    }

    fn disable_output(&mut self, channel: OutputChannel) {
        self.regs.ccer().modify(|w| w.set_cce(index(channel), false));
    }

    fn generate_update(&mut self) {
        self.regs.egr().write(|w| w.set_ug(true));
    }

    fn set_master_on_enable(&mut self) {
        self.regs.cr2().modify(|w| w.set_mms(Mms::ENABLE));
    }

    fn set_gated_slave(&mut self, trigger: TriggerInput) {
        let ts = match trigger {
            TriggerInput::Itr0 => Ts::ITR0,
            TriggerInput::Itr1 => Ts::ITR1,
            TriggerInput::Itr2 => Ts::ITR2,
            TriggerInput::Itr3 => Ts::ITR3,
        };

        self.regs.smcr().modify(|w| {
            w.set_ts(ts);
            w.set_sms(Sms::GATED_MODE);
        });
    }

    fn enable_counter(&mut self) {
        self.regs.cr1().modify(|w| w.set_cen(true));
    }

    fn disable_counter(&mut self) {
        self.regs.cr1().modify(|w| w.set_cen(false));
    }
}
