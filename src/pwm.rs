/*
 * Center-aligned PWM generation on general purpose counters.
 *
 *           period
 *   ╭────────────────────╮
 *       t
 *   ╭────────╮
 * 1 ┌────────┐
 * 0 ┘        └───────────┘
 *
 * The buck-boost channel runs two counters with a fixed phase relation:
 *
 *             period
 *      ╭────────────────────╮
 *        ta
 *      ╭────────╮
 *    1 ┌────────┐
 * A: 0 ┘        └───────────┘
 *    1    ┌──┐
 * B: 0 ───┘  └───────────────
 *         ╰──╯
 *          tb
 *      ╰──╯
 *       dt
 *
 * B is a gated slave of A. The phase is established once at configuration
 * time; afterwards only the compare values move.
 */

use crate::math::{Duty, FULL_SCALE};

/// Compare/output channel of a counter.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputChannel {
    Ch1,
    Ch2,
    Ch3,
    Ch4,
}

/// Output is active (high) while the counter is below the compare value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

/// Internal trigger input selecting which master a slave counter follows.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TriggerInput {
    Itr0,
    Itr1,
    Itr2,
    Itr3,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmError {
    /// period is zero or does not fit the counter
    PeriodOutOfRange,
    /// phase offset does not fit inside the period
    PhaseOffsetOutOfRange,
}

/// The register level operations the regulator needs from one 16 bit
/// hardware counter.
pub trait PwmTimer {
    /// Gate the counter's peripheral clock.
    fn enable_clock(&mut self);
    fn disable_clock(&mut self);

    /// Return every counter register to its reset value.
    fn reset(&mut self);

    /// Up/down counting, compare events on both slopes, buffered period.
    fn set_center_aligned(&mut self);
    fn set_period(&mut self, period: u16);

    /// PWM mode with a buffered compare register.
    fn set_output_mode(&mut self, channel: OutputChannel, polarity: Polarity);
    fn set_compare(&mut self, channel: OutputChannel, value: u16);
    fn enable_output(&mut self, channel: OutputChannel);
    fn disable_output(&mut self, channel: OutputChannel);

    /// Force an update event, loading buffered registers and restarting the count.
    fn generate_update(&mut self);

    /// Drive the trigger output while the counter is enabled.
    fn set_master_on_enable(&mut self);
    /// Only count while the selected trigger input is high.
    fn set_gated_slave(&mut self, trigger: TriggerInput);

    fn enable_counter(&mut self);
    fn disable_counter(&mut self);
}

/// Checks that a period fits a 16 bit counter.
pub fn validate_period(period: u32) -> Result<u16, PwmError> {
    match u16::try_from(period) {
        Ok(period) if period > 0 => Ok(period),
        _ => Err(PwmError::PeriodOutOfRange),
    }
}

/// Converts a duty fraction into a compare value for the given period.
///
/// A compare value that does not fit the counter means the period and duty
/// scale disagree somewhere in the core. That is not recoverable, so it
/// panics instead of wrapping.
pub fn duty_to_compare(duty: Duty, period: u32) -> u16 {
    let compare = duty as u64 * period as u64 / FULL_SCALE as u64;
    match u16::try_from(compare) {
        Ok(compare) => compare,
        Err(_) => panic!("compare value {} overflows counter (period {})", compare, period),
    }
}

/// Programs a single center-aligned PWM output. The counter is left stopped.
pub fn configure_pwm<T: PwmTimer>(
    timer: &mut T,
    channel: OutputChannel,
    period: u16,
    polarity: Polarity,
    compare: u16,
) {
    timer.reset();

    timer.set_output_mode(channel, polarity);
    timer.set_compare(channel, compare);
    timer.enable_output(channel);

    timer.set_center_aligned();
    timer.set_period(period);
    timer.generate_update();
}

/// Programs two center-aligned outputs where `slave` lags `master` by `dt`
/// counts. Both counters are left stopped; enable the slave first so it is
/// armed when the master starts driving its trigger.
#[allow(clippy::too_many_arguments)]
pub fn configure_dual_pwm<M: PwmTimer, S: PwmTimer>(
    master: &mut M,
    master_channel: OutputChannel,
    slave: &mut S,
    slave_channel: OutputChannel,
    slave_trigger: TriggerInput,
    period: u16,
    compare_master: u16,
    compare_slave: u16,
    dt: u16,
) -> Result<(), PwmError> {
    if dt >= period {
        return Err(PwmError::PhaseOffsetOutOfRange);
    }

    configure_pwm(master, master_channel, period, Polarity::ActiveHigh, compare_master);
    configure_pwm(slave, slave_channel, period, Polarity::ActiveHigh, compare_slave);

    master.set_master_on_enable();
    slave.set_gated_slave(slave_trigger);

    // run the master short for one update so the slave starts dt behind it
    master.set_period(period - dt);
    master.generate_update();
    master.set_period(period);

    Ok(())
}

#[cfg(test)]
pub(crate) mod mock {
    use std::vec::Vec;

    use super::*;

    #[derive(Clone, Copy, PartialEq, Eq, Debug)]
    pub enum TimerOp {
        EnableClock,
        DisableClock,
        Reset,
        CenterAligned,
        Period(u16),
        OutputMode(OutputChannel, Polarity),
        Compare(OutputChannel, u16),
        EnableOutput(OutputChannel),
        DisableOutput(OutputChannel),
        Update,
        Master,
        Slave(TriggerInput),
        EnableCounter,
        DisableCounter,
    }

    #[derive(Default)]
    pub struct MockTimer {
        pub ops: Vec<TimerOp>,
    }

    impl PwmTimer for MockTimer {
        fn enable_clock(&mut self) {
            self.ops.push(TimerOp::EnableClock);
        }

        fn disable_clock(&mut self) {
            self.ops.push(TimerOp::DisableClock);
        }

        fn reset(&mut self) {
            self.ops.push(TimerOp::Reset);
        }

        fn set_center_aligned(&mut self) {
            self.ops.push(TimerOp::CenterAligned);
        }

        fn set_period(&mut self, period: u16) {
            self.ops.push(TimerOp::Period(period));
        }

        fn set_output_mode(&mut self, channel: OutputChannel, polarity: Polarity) {
            self.ops.push(TimerOp::OutputMode(channel, polarity));
        }

        fn set_compare(&mut self, channel: OutputChannel, value: u16) {
            self.ops.push(TimerOp::Compare(channel, value));
        }

        fn enable_output(&mut self, channel: OutputChannel) {
            self.ops.push(TimerOp::EnableOutput(channel));
        }

        fn disable_output(&mut self, channel: OutputChannel) {
            self.ops.push(TimerOp::DisableOutput(channel));
        }

        fn generate_update(&mut self) {
            self.ops.push(TimerOp::Update);
        }

        fn set_master_on_enable(&mut self) {
            self.ops.push(TimerOp::Master);
        }

        fn set_gated_slave(&mut self, trigger: TriggerInput) {
            self.ops.push(TimerOp::Slave(trigger));
        }

        fn enable_counter(&mut self) {
            self.ops.push(TimerOp::EnableCounter);
        }

        fn disable_counter(&mut self) {
            self.ops.push(TimerOp::DisableCounter);
        }
    }
}
