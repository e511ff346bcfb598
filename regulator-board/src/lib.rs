#![no_std]

use embassy_stm32::gpio::Output;
use embassy_time::Duration;

use ateam_regulator::drivers::{BuckBoostStage, BuckStage};
use ateam_regulator::math::Fixed32;
use ateam_regulator::shared::SharedRegulator;

use front_end::SampledFrontEnd;
use timers::GpTimer;

pub mod front_end;
pub mod pins;
pub mod tasks;
pub mod timers;

pub type Ch1Stage = BuckBoostStage<GpTimer, GpTimer, Output<'static>>;
pub type Ch2Stage = BuckStage<GpTimer>;
pub type BoardRegulator = SharedRegulator<Ch1Stage, Ch2Stage, SampledFrontEnd>;

// power on defaults, channel 2 stays off until commanded
pub const CH1_DEFAULT_VSETPOINT: Fixed32 = Fixed32::from_milli(5_000);
pub const CH1_DEFAULT_ILIMIT: Fixed32 = Fixed32::from_milli(1_500);

pub const TELEMETRY_PERIOD: Duration = Duration::from_millis(1000);
