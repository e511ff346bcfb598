#![no_std]
#![no_main]

use static_cell::StaticCell;

use defmt::*;
use {defmt_rtt as _, panic_probe as _};

use cortex_m_rt::entry;

use embassy_executor::{Executor, InterruptExecutor};
use embassy_stm32::{
    gpio::{Level, Output, OutputType, Speed},
    interrupt,
    interrupt::{InterruptExt, Priority},
    timer::{simple_pwm::PwmPin, Ch1, Ch3},
};

use ateam_regulator::{
    config::{CHANNEL1_CONFIG, CHANNEL2_CONFIG},
    drivers::{BuckBoostStage, BuckStage},
    dual::{Channel, DualRegulator},
    pwm::{OutputChannel, TriggerInput},
    regulator::{FeedbackMode, Regulator},
    sampling::TriggerConfig,
    shared::SharedRegulator,
};
use ateam_regulator_board::{
    front_end::{FrontEndState, SampledFrontEnd},
    pins::{Ch1BoostTimer, Ch1BuckTimer, Ch2Timer},
    tasks::{sampling_task::start_sampling_task, telemetry_task::start_telemetry_task},
    timers::{GpTimer, GpTimerId},
    BoardRegulator, CH1_DEFAULT_ILIMIT, CH1_DEFAULT_VSETPOINT,
};

static REGULATOR: BoardRegulator = SharedRegulator::new();
static FRONT_END_STATE: FrontEndState = FrontEndState::new();

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();
static EXECUTOR_LOW: StaticCell<Executor> = StaticCell::new();

#[interrupt]
unsafe fn SPI2() {
    EXECUTOR_HIGH.on_interrupt();
}

#[entry]
fn main() -> ! {
    // the regulator timing constants assume the 2.097MHz MSI reset clock
    let p = embassy_stm32::init(Default::default());
    info!("regulator startup!");

    // route the counter outputs to their pins, the counters themselves are
    // driven at register level by the power stages
    let _ch1_buck_pin: PwmPin<'_, Ch1BuckTimer, Ch3> =
        PwmPin::new_ch3(p.PB10, OutputType::PushPull);
    let _ch1_boost_pin: PwmPin<'_, Ch1BoostTimer, Ch3> =
        PwmPin::new_ch3(p.PB8, OutputType::PushPull);
    let _ch2_battery_pin: PwmPin<'_, Ch2Timer, Ch1> =
        PwmPin::new_ch1(p.PA6, OutputType::PushPull);
    let _ch2_input_pin: PwmPin<'_, Ch2Timer, Ch3> = PwmPin::new_ch3(p.PB0, OutputType::PushPull);

    let ch1_stage = BuckBoostStage::new(
        GpTimer::new(GpTimerId::Tim2),
        OutputChannel::Ch3,
        GpTimer::new(GpTimerId::Tim4),
        OutputChannel::Ch3,
        TriggerInput::Itr1,
        Output::new(p.PA5, Level::Low, Speed::Low),
    );
    let ch2_stage = BuckStage::new(
        GpTimer::new(GpTimerId::Tim3),
        OutputChannel::Ch1,
        OutputChannel::Ch3,
    );

    let dual = DualRegulator::new(
        Regulator::new(CHANNEL1_CONFIG, ch1_stage),
        Regulator::new(CHANNEL2_CONFIG, ch2_stage),
        SampledFrontEnd::new(&FRONT_END_STATE),
    );
    unwrap!(REGULATOR.init(dual));

    let startup = REGULATOR.with(|reg| {
        let ch1 = reg.channel1_mut();
        ch1.set_vsetpoint(CH1_DEFAULT_VSETPOINT)?;
        ch1.set_ilimit(CH1_DEFAULT_ILIMIT)?;
        reg.set_mode(Channel::One, FeedbackMode::VoltageFeedback)
    });
    match startup {
        Some(Ok(())) => info!("channel 1 regulating"),
        Some(Err(err)) => error!("channel 1 failed to start: {}", err),
        None => error!("regulator missing after init"),
    }

    // high priority executor runs the sample-and-control loop
    interrupt::SPI2.set_priority(Priority::P6);
    let spawner = EXECUTOR_HIGH.start(interrupt::SPI2);
    start_sampling_task(
        spawner,
        &REGULATOR,
        &FRONT_END_STATE,
        p.ADC1,
        p.PA0,
        p.PA1,
        p.PC0,
        p.PC1,
        TriggerConfig::default(),
    );

    // low priority executor handles telemetry
    let executor = EXECUTOR_LOW.init(Executor::new());
    executor.run(|spawner| {
        start_telemetry_task(&spawner, &REGULATOR);
    });
}
