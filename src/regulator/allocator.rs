/*
 * Duty cycle allocation between the two switches of a channel.
 *
 * Both switches share one proportional loop. Switch 1 does the regulating
 * until it saturates against a rail, then the correction is handed to
 * switch 2. Invariants after every allocation:
 *   0 <= duty2 <= duty1 <= FULL_SCALE
 * duty2 <= duty1 is a hardware requirement, switch 2 must never be on
 * while switch 1 is off.
 */

use num_traits::clamp;

use crate::config::DUTY_RAIL_MARGIN;
use crate::math::{Duty, FULL_SCALE, HALF_SCALE};

use super::FeedbackGains;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyPair {
    pub duty1: Duty,
    pub duty2: Duty,
}

impl DutyPair {
    pub const ZERO: DutyPair = DutyPair { duty1: 0, duty2: 0 };

    /// `None` if the pair would turn switch 2 on longer than switch 1.
    pub const fn new(duty1: Duty, duty2: Duty) -> Option<DutyPair> {
        if duty2 > duty1 {
            None
        } else {
            Some(DutyPair { duty1, duty2 })
        }
    }

    /// Coarse back-off used when a limit is exceeded.
    pub const fn halved(self) -> DutyPair {
        DutyPair {
            duty1: self.duty1 / 2,
            duty2: self.duty2 / 2,
        }
    }
}

/// Which correction the allocator applies, in decision order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AllocationRule {
    /// Output too low with both switches pinned high. Reset to 50/50.
    CollapseRecovery,
    /// Output too low, switch 1 pinned high. Switch 2 takes over.
    Switch1SaturatedHigh,
    /// Output too high, switch 1 pinned low. Switch 2 takes over.
    Switch1SaturatedLow,
    /// Output too low while switch 2 is still on.
    // TODO: this path moves duty2 opposite to Switch1SaturatedHigh, confirm the intent on hardware
    Switch2Secondary,
    /// Normal operation, regulate with switch 1.
    Switch1,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DutyAllocator {
    rail_margin: i32,
    secondary_correction: bool,
}

impl Default for DutyAllocator {
    fn default() -> Self {
        Self::new(DUTY_RAIL_MARGIN)
    }
}

impl DutyAllocator {
    pub const fn new(rail_margin: i32) -> Self {
        DutyAllocator {
            rail_margin,
            secondary_correction: true,
        }
    }

    /// Skip the secondary switch 2 correction and fall through to switch 1.
    pub const fn without_secondary_correction(mut self) -> Self {
        self.secondary_correction = false;
        self
    }

    pub const fn rail_margin(&self) -> i32 {
        self.rail_margin
    }

    pub const fn secondary_correction(&self) -> bool {
        self.secondary_correction
    }

    /// Picks the correction for `error` (sensed minus setpoint, negative
    /// means the output is too low). First match wins.
    pub fn select(&self, duty: DutyPair, error: i32) -> AllocationRule {
        let near_top = FULL_SCALE as i32 - self.rail_margin;
        let duty1 = duty.duty1 as i32;
        let duty2 = duty.duty2 as i32;

        if error < 0 && duty1 > near_top && duty2 > near_top {
            AllocationRule::CollapseRecovery
        } else if error < 0 && duty1 > near_top {
            AllocationRule::Switch1SaturatedHigh
        } else if error > 0 && duty1 < self.rail_margin {
            AllocationRule::Switch1SaturatedLow
        } else if self.secondary_correction && error < 0 && duty2 > self.rail_margin {
            AllocationRule::Switch2Secondary
        } else {
            AllocationRule::Switch1
        }
    }

    /// Applies one proportional step and re-establishes the duty invariants.
    pub fn allocate(&self, duty: DutyPair, error: i32, gains: &FeedbackGains) -> DutyPair {
        let rule = self.select(duty, error);
        trace!("allocator rule {:?} error {}", rule, error);

        let mut duty1 = duty.duty1 as i64;
        let mut duty2 = duty.duty2 as i64;

        match rule {
            AllocationRule::CollapseRecovery => {
                duty1 = HALF_SCALE as i64;
                duty2 = HALF_SCALE as i64;
            }
            AllocationRule::Switch1SaturatedHigh | AllocationRule::Switch1SaturatedLow => {
                duty2 -= gains.prop_gain2.scale(error);
            }
            AllocationRule::Switch2Secondary => {
                duty2 += gains.prop_gain2.scale(error);
            }
            AllocationRule::Switch1 => {
                duty1 -= gains.prop_gain1.scale(error);
            }
        }

        if duty2 > duty1 {
            duty2 = duty1;
        }

        DutyPair {
            duty1: clamp(duty1, 0, FULL_SCALE as i64) as Duty,
            duty2: clamp(duty2, 0, FULL_SCALE as i64) as Duty,
        }
    }
}
