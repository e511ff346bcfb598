/*
 * Both regulator channels plus the analog front end they share.
 *
 * Channel 1 is the buck-boost stage, channel 2 the buck stage with a
 * selectable supply. The front end runs whenever at least one channel is
 * active and is shut down once both are disabled again.
 */

use crate::drivers::{PowerSource, PowerStage, SelectableSource};
use crate::math::Duty;
use crate::regulator::{FeedbackMode, Regulator, RegulatorError, RegulatorStatus};
use crate::sampling::{AnalogFrontEnd, SampleSet};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    One,
    Two,
}

pub struct DualRegulator<B1: PowerStage, B2: SelectableSource, F: AnalogFrontEnd> {
    ch1: Regulator<B1>,
    ch2: Regulator<B2>,
    front_end: F,
    front_end_powered: bool,
}

impl<B1: PowerStage, B2: SelectableSource, F: AnalogFrontEnd> DualRegulator<B1, B2, F> {
    pub fn new(ch1: Regulator<B1>, ch2: Regulator<B2>, front_end: F) -> Self {
        DualRegulator {
            ch1,
            ch2,
            front_end,
            front_end_powered: false,
        }
    }

    /// Brings the hardware to a known state: both channels disabled and the
    /// front end off.
    pub fn init(&mut self) -> Result<(), RegulatorError> {
        self.ch1.set_mode(FeedbackMode::Disabled)?;
        self.ch2.set_mode(FeedbackMode::Disabled)?;

        self.front_end.power_down();
        self.front_end_powered = false;

        debug!("regulator init done");
        Ok(())
    }

    /// Mode change with front end gating. Always use this rather than
    /// `set_mode` on a channel directly, or the front end can be left off
    /// under an active channel.
    pub fn set_mode(&mut self, channel: Channel, mode: FeedbackMode) -> Result<(), RegulatorError> {
        if mode != FeedbackMode::Disabled && !self.front_end_powered {
            debug!("powering up analog front end");
            self.front_end.power_up();
            self.front_end_powered = true;
        }

        let res = match channel {
            Channel::One => self.ch1.set_mode(mode),
            Channel::Two => self.ch2.set_mode(mode),
        };

        self.power_down_if_idle();
        res
    }

    /// Constant duty update. A failed reconfigure drops the channel to
    /// Disabled, which can leave both channels idle.
    pub fn set_duty_cycle(
        &mut self,
        channel: Channel,
        duty1: Duty,
        duty2: Duty,
    ) -> Result<(), RegulatorError> {
        let res = match channel {
            Channel::One => self.ch1.set_duty_cycle(duty1, duty2),
            Channel::Two => self.ch2.set_duty_cycle(duty1, duty2),
        };

        self.power_down_if_idle();
        res
    }

    // also catches a channel that rolled back to Disabled on failure
    fn power_down_if_idle(&mut self) {
        if !self.ch1.is_active() && !self.ch2.is_active() && self.front_end_powered {
            debug!("both channels disabled, powering down analog front end");
            self.front_end.power_down();
            self.front_end_powered = false;
        }
    }

    pub fn mode(&self, channel: Channel) -> FeedbackMode {
        match channel {
            Channel::One => self.ch1.mode(),
            Channel::Two => self.ch2.mode(),
        }
    }

    pub fn set_source(&mut self, source: PowerSource) -> Result<(), RegulatorError> {
        self.ch2.set_source(source)
    }

    /// The sample-and-control cycle. Runs from the conversion complete
    /// interrupt and must not block.
    pub fn on_samples_ready(&mut self, samples: SampleSet) {
        self.ch1.update_samples(samples.vsense1, samples.isense1);
        self.ch2.update_samples(samples.vsense2, samples.isense2);

        self.ch1.run_feedback();
        self.ch2.run_feedback();
    }

    pub fn status(&self, channel: Channel) -> RegulatorStatus {
        match channel {
            Channel::One => self.ch1.status(),
            Channel::Two => self.ch2.status(),
        }
    }

    pub fn channel1(&self) -> &Regulator<B1> {
        &self.ch1
    }

    /// Direct channel access for setpoints, limits and gains. Mode and duty
    /// changes go through [`DualRegulator::set_mode`] and
    /// [`DualRegulator::set_duty_cycle`] so the front end stays in step.
    pub fn channel1_mut(&mut self) -> &mut Regulator<B1> {
        &mut self.ch1
    }

    pub fn channel2(&self) -> &Regulator<B2> {
        &self.ch2
    }

    pub fn channel2_mut(&mut self) -> &mut Regulator<B2> {
        &mut self.ch2
    }

    pub fn front_end(&self) -> &F {
        &self.front_end
    }

    pub fn is_front_end_powered(&self) -> bool {
        self.front_end_powered
    }
}
