use crate::drivers::PowerStage;
use crate::math::Codepoint;

use super::{FeedbackMode, Regulator};

impl<S: PowerStage> Regulator<S> {
    /// Latches a fresh sample pair. Called from the sampling interrupt.
    pub fn update_samples(&mut self, vsense: Codepoint, isense: Codepoint) {
        self.vsense = vsense;
        self.isense = isense;
    }

    pub fn raw_vsense(&self) -> Codepoint {
        self.vsense
    }

    pub fn raw_isense(&self) -> Codepoint {
        self.isense
    }

    /// One control step on the latched samples. Limit violations back off
    /// both switches by half and are never reported to a caller.
    pub fn run_feedback(&mut self) {
        match self.mode {
            FeedbackMode::VoltageFeedback => {
                if self.isense > self.ilimit {
                    trace!("current limit exceeded, backing off");
                    self.duty = self.duty.halved();
                } else {
                    let error = self.vsense as i32 - self.vsetpoint as i32;
                    self.duty = self.allocator.allocate(self.duty, error, &self.v_gains);
                }
            }
            FeedbackMode::CurrentFeedback => {
                if self.vsense > self.vlimit {
                    trace!("voltage limit exceeded, backing off");
                    self.duty = self.duty.halved();
                } else {
                    let error = self.isense as i32 - self.isetpoint as i32;
                    self.duty = self.allocator.allocate(self.duty, error, &self.i_gains);
                }
            }
            FeedbackMode::Disabled | FeedbackMode::ConstantDuty | FeedbackMode::MaxPower => return,
        }

        let geometry = self.geometry();
        self.stage.commit_duty(&geometry);
    }
}

#[cfg(test)]
mod tests {
    use core::num::NonZeroU32;

    use crate::drivers::{PowerStage, PwmGeometry};
    use crate::math::{Fixed32, FULL_SCALE};
    use crate::pwm::PwmError;
    use crate::regulator::{
        DutyAllocator, DutyPair, FeedbackGains, FeedbackMode, Regulator, RegulatorConfig,
    };

    #[derive(Default)]
    struct CommitLog {
        commits: Vec<PwmGeometry>,
    }

    impl PowerStage for CommitLog {
        fn enable(&mut self) {}

        fn configure(&mut self, _geometry: &PwmGeometry) -> Result<(), PwmError> {
            Ok(())
        }

        fn disable(&mut self) {}

        fn commit_duty(&mut self, geometry: &PwmGeometry) {
            self.commits.push(*geometry);
        }
    }

    const UNITY: FeedbackGains = FeedbackGains {
        prop_gain1: Fixed32::ONE,
        prop_gain2: Fixed32::ONE,
    };

    // one codepoint per unit keeps setpoints readable
    fn regulator() -> Regulator<CommitLog> {
        let gain = NonZeroU32::new(1).unwrap();
        let config = RegulatorConfig {
            vsense_gain: gain,
            isense_gain: gain,
            period: 400,
            vlimit: FULL_SCALE,
            ilimit: 1000,
            v_gains: UNITY,
            i_gains: UNITY,
            rail_margin: 2000,
        };

        let mut reg = Regulator::new(config, CommitLog::default());
        reg.set_duty_cycle(0x8000, 0x4000).unwrap();
        reg.set_allocator(DutyAllocator::new(2000).without_secondary_correction());
        reg
    }

    #[test]
    fn inactive_modes_leave_duty_alone() {
        for mode in [FeedbackMode::Disabled, FeedbackMode::ConstantDuty, FeedbackMode::MaxPower] {
            let mut reg = regulator();
            reg.set_mode(mode).unwrap();
            reg.update_samples(100, 100);
            reg.run_feedback();

            assert_eq!(reg.duty(), DutyPair { duty1: 0x8000, duty2: 0x4000 });
            assert!(reg.stage().commits.is_empty());
        }
    }

    #[test]
    fn voltage_feedback_commits_allocation() {
        let mut reg = regulator();
        reg.set_vsetpoint(Fixed32::from_int(500)).unwrap();
        reg.set_mode(FeedbackMode::VoltageFeedback).unwrap();

        reg.update_samples(400, 0);
        reg.run_feedback();

        assert_eq!(reg.duty1(), 0x8000 + 100);
        assert_eq!(reg.duty2(), 0x4000);
        assert_eq!(
            reg.stage().commits,
            [PwmGeometry { period: 400, duty1: 0x8000 + 100, duty2: 0x4000 }]
        );
    }

    #[test]
    fn overcurrent_halves_duty() {
        let mut reg = regulator();
        reg.set_vsetpoint(Fixed32::from_int(500)).unwrap();
        reg.set_mode(FeedbackMode::VoltageFeedback).unwrap();

        reg.update_samples(0, 1001);
        reg.run_feedback();

        assert_eq!(reg.duty(), DutyPair { duty1: 0x4000, duty2: 0x2000 });
        assert_eq!(reg.stage().commits.len(), 1);
    }

    #[test]
    fn current_at_limit_keeps_regulating() {
        let mut reg = regulator();
        reg.set_vsetpoint(Fixed32::from_int(1000)).unwrap();
        reg.set_mode(FeedbackMode::VoltageFeedback).unwrap();

        // on the limit, zero voltage error leaves the duty where it was
        reg.update_samples(1000, 1000);
        reg.run_feedback();
        assert_eq!(reg.duty(), DutyPair { duty1: 0x8000, duty2: 0x4000 });

        reg.update_samples(1000, 1001);
        reg.run_feedback();
        assert_eq!(reg.duty(), DutyPair { duty1: 0x4000, duty2: 0x2000 });
        assert_eq!(reg.stage().commits.len(), 2);
    }

    #[test]
    fn current_feedback_uses_current_error() {
        let mut reg = regulator();
        reg.set_isetpoint(Fixed32::from_int(300)).unwrap();
        reg.set_mode(FeedbackMode::CurrentFeedback).unwrap();

        // output current too high, switch 1 backs off
        reg.update_samples(0, 350);
        reg.run_feedback();

        assert_eq!(reg.duty1(), 0x8000 - 50);
    }

    #[test]
    fn overvoltage_halves_duty_under_current_feedback() {
        let mut reg = regulator();
        reg.set_vlimit(Fixed32::from_int(2000)).unwrap();
        reg.set_mode(FeedbackMode::CurrentFeedback).unwrap();

        reg.update_samples(2000, 0);
        reg.run_feedback();
        assert_eq!(reg.duty1(), 0x8000);

        reg.update_samples(2001, 0);
        reg.run_feedback();
        assert_eq!(reg.duty(), DutyPair { duty1: 0x4000, duty2: 0x2000 });
    }
}
