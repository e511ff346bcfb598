use crate::math::Duty;
use crate::pwm::PwmError;

pub mod buck;
pub mod buck_boost;

pub use buck::BuckStage;
pub use buck_boost::BuckBoostStage;

/// Everything a power stage needs to program its counters.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmGeometry {
    pub period: u32,
    pub duty1: Duty,
    pub duty2: Duty,
}

/// Hardware owned by one regulator channel.
///
/// The mode state machine is the only caller of `enable`/`disable`, and
/// `commit_duty` is called from the sampling interrupt.
pub trait PowerStage {
    /// Power the stage's sensing and counters. Only called on a transition
    /// out of Disabled.
    fn enable(&mut self);

    /// Program PWM geometry and start the counters.
    fn configure(&mut self, geometry: &PwmGeometry) -> Result<(), PwmError>;

    /// Stop outputs and counters and release their clocks.
    fn disable(&mut self);

    /// Push new duty values to the compare registers without touching the
    /// counter configuration.
    fn commit_duty(&mut self, geometry: &PwmGeometry);
}

/// Supply feeding a single switch stage.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerSource {
    Battery,
    Input,
}

/// A stage that can be fed from more than one source. Only switched while
/// the stage is disabled.
pub trait SelectableSource: PowerStage {
    fn select_source(&mut self, source: PowerSource);

    fn source(&self) -> PowerSource;
}
