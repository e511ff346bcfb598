/*
 * One switching regulator channel: calibration, operating mode, setpoints,
 * last sensed values and the commanded duty cycle.
 *
 * The mode state machine is the only path that powers the stage up or down.
 * Setpoints and limits live in the codepoint domain of the sense inputs so
 * the sampling interrupt never converts units.
 */

use core::num::NonZeroU32;

use crate::drivers::{PowerSource, PowerStage, PwmGeometry, SelectableSource};
use crate::math::fixed::{codepoints_to_physical, physical_to_codepoints};
use crate::math::{Codepoint, Duty, Fixed32};
use crate::pwm::PwmError;

pub mod allocator;
mod feedback;

pub use allocator::{AllocationRule, DutyAllocator, DutyPair};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FeedbackMode {
    Disabled,
    ConstantDuty,
    CurrentFeedback,
    VoltageFeedback,
    /// Reserved. Powers the stage like any active mode but runs no loop.
    MaxPower,
}

/// Proportional gains for the two switches, one set per feedback domain.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FeedbackGains {
    pub prop_gain1: Fixed32,
    pub prop_gain2: Fixed32,
}

/// Construction time parameters of a channel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RegulatorConfig {
    /// codepoints per volt
    pub vsense_gain: NonZeroU32,
    /// codepoints per amp
    pub isense_gain: NonZeroU32,
    /// PWM period in timer cycles
    pub period: u32,
    pub vlimit: Codepoint,
    pub ilimit: Codepoint,
    pub v_gains: FeedbackGains,
    pub i_gains: FeedbackGains,
    pub rail_margin: i32,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegulatorError {
    /// a setpoint or limit does not fit the channel's limits
    OutOfRange,
    /// switch 2 would be on longer than switch 1
    InvalidDutyOrder,
    /// not allowed in the current mode
    ModeConflict,
    /// the stage rejected its PWM geometry, the channel is now disabled
    Hardware(PwmError),
}

impl From<PwmError> for RegulatorError {
    fn from(err: PwmError) -> Self {
        RegulatorError::Hardware(err)
    }
}

/// Consistent view of a channel for telemetry.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegulatorStatus {
    pub mode: FeedbackMode,
    pub duty1: Duty,
    pub duty2: Duty,
    pub vsense: Fixed32,
    pub isense: Fixed32,
    pub vsetpoint: Fixed32,
    pub isetpoint: Fixed32,
}

pub struct Regulator<S: PowerStage> {
    vsense_gain: NonZeroU32,
    isense_gain: NonZeroU32,
    period: u32,
    duty: DutyPair,
    vsense: Codepoint,
    isense: Codepoint,
    mode: FeedbackMode,
    // current feedback
    isetpoint: Codepoint,
    vlimit: Codepoint,
    // voltage feedback
    vsetpoint: Codepoint,
    ilimit: Codepoint,
    v_gains: FeedbackGains,
    i_gains: FeedbackGains,
    allocator: DutyAllocator,
    stage: S,
}

impl<S: PowerStage> Regulator<S> {
    /// A disabled channel with zeroed duty and setpoints. The stage is not
    /// touched until the first mode change.
    pub fn new(config: RegulatorConfig, stage: S) -> Self {
        Regulator {
            vsense_gain: config.vsense_gain,
            isense_gain: config.isense_gain,
            period: config.period,
            duty: DutyPair::ZERO,
            vsense: 0,
            isense: 0,
            mode: FeedbackMode::Disabled,
            isetpoint: 0,
            vlimit: config.vlimit,
            vsetpoint: 0,
            ilimit: config.ilimit,
            v_gains: config.v_gains,
            i_gains: config.i_gains,
            allocator: DutyAllocator::new(config.rail_margin),
            stage,
        }
    }

    pub fn geometry(&self) -> PwmGeometry {
        PwmGeometry {
            period: self.period,
            duty1: self.duty.duty1,
            duty2: self.duty.duty2,
        }
    }

    /// Forces the channel into Disabled after a hardware failure.
    fn fail_safe(&mut self, err: PwmError) -> RegulatorError {
        error!("power stage rejected geometry ({:?}), disabling channel", err);
        self.mode = FeedbackMode::Disabled;
        self.stage.disable();
        RegulatorError::Hardware(err)
    }

    ////////////////////
    //  mode control  //
    ////////////////////

    pub fn set_mode(&mut self, mode: FeedbackMode) -> Result<(), RegulatorError> {
        let old_mode = self.mode;
        self.mode = mode;

        if old_mode == FeedbackMode::Disabled && mode != FeedbackMode::Disabled {
            self.stage.enable();
        } else if mode == FeedbackMode::Disabled {
            self.stage.disable();
        }

        if mode != FeedbackMode::Disabled {
            if let Err(err) = self.stage.configure(&self.geometry()) {
                return Err(self.fail_safe(err));
            }
        }

        info!("regulator mode {:?} -> {:?}", old_mode, mode);
        Ok(())
    }

    pub fn mode(&self) -> FeedbackMode {
        self.mode
    }

    pub fn is_active(&self) -> bool {
        self.mode != FeedbackMode::Disabled
    }

    //////////////////
    //  duty cycle  //
    //////////////////

    /// Only accepted while the loop does not own the duty values. An active
    /// channel is reconfigured immediately; a disabled one picks the values
    /// up when it is next enabled.
    pub fn set_duty_cycle(&mut self, duty1: Duty, duty2: Duty) -> Result<(), RegulatorError> {
        if self.mode != FeedbackMode::ConstantDuty && self.mode != FeedbackMode::Disabled {
            warn!("duty cycle is owned by the feedback loop in {:?}", self.mode);
            return Err(RegulatorError::ModeConflict);
        }

        self.duty = DutyPair::new(duty1, duty2).ok_or(RegulatorError::InvalidDutyOrder)?;

        if self.is_active() {
            if let Err(err) = self.stage.configure(&self.geometry()) {
                return Err(self.fail_safe(err));
            }
        }

        Ok(())
    }

    pub fn duty(&self) -> DutyPair {
        self.duty
    }

    pub fn duty1(&self) -> Duty {
        self.duty.duty1
    }

    pub fn duty2(&self) -> Duty {
        self.duty.duty2
    }

    //////////////
    //  period  //
    //////////////

    pub fn set_period(&mut self, period: u32) -> Result<(), RegulatorError> {
        if self.is_active() {
            warn!("period can only change while disabled");
            return Err(RegulatorError::ModeConflict);
        }

        self.period = period;
        Ok(())
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    //////////////////////////
    //  setpoints & limits  //
    //////////////////////////

    pub fn set_vsetpoint(&mut self, setpoint: Fixed32) -> Result<(), RegulatorError> {
        match physical_to_codepoints(self.vsense_gain, setpoint) {
            Some(code) if code <= self.vlimit => {
                self.vsetpoint = code;
                Ok(())
            }
            _ => {
                warn!("vsetpoint {} out of range", setpoint.to_bits());
                Err(RegulatorError::OutOfRange)
            }
        }
    }

    pub fn vsetpoint(&self) -> Fixed32 {
        codepoints_to_physical(self.vsense_gain, self.vsetpoint)
    }

    pub fn set_isetpoint(&mut self, setpoint: Fixed32) -> Result<(), RegulatorError> {
        match physical_to_codepoints(self.isense_gain, setpoint) {
            Some(code) if code <= self.ilimit => {
                self.isetpoint = code;
                Ok(())
            }
            _ => {
                warn!("isetpoint {} out of range", setpoint.to_bits());
                Err(RegulatorError::OutOfRange)
            }
        }
    }

    pub fn isetpoint(&self) -> Fixed32 {
        codepoints_to_physical(self.isense_gain, self.isetpoint)
    }

    /// Voltage ceiling under current feedback. Must stay at or above the
    /// present voltage setpoint.
    pub fn set_vlimit(&mut self, limit: Fixed32) -> Result<(), RegulatorError> {
        match physical_to_codepoints(self.vsense_gain, limit) {
            Some(code) if code >= self.vsetpoint => {
                self.vlimit = code;
                Ok(())
            }
            _ => Err(RegulatorError::OutOfRange),
        }
    }

    pub fn vlimit(&self) -> Fixed32 {
        codepoints_to_physical(self.vsense_gain, self.vlimit)
    }

    /// Current ceiling under voltage feedback. Must stay at or above the
    /// present current setpoint.
    pub fn set_ilimit(&mut self, limit: Fixed32) -> Result<(), RegulatorError> {
        match physical_to_codepoints(self.isense_gain, limit) {
            Some(code) if code >= self.isetpoint => {
                self.ilimit = code;
                Ok(())
            }
            _ => Err(RegulatorError::OutOfRange),
        }
    }

    pub fn ilimit(&self) -> Fixed32 {
        codepoints_to_physical(self.isense_gain, self.ilimit)
    }

    /////////////
    //  gains  //
    /////////////

    pub fn set_v_gains(&mut self, gains: FeedbackGains) {
        self.v_gains = gains;
    }

    pub fn v_gains(&self) -> FeedbackGains {
        self.v_gains
    }

    pub fn set_i_gains(&mut self, gains: FeedbackGains) {
        self.i_gains = gains;
    }

    pub fn i_gains(&self) -> FeedbackGains {
        self.i_gains
    }

    pub fn set_allocator(&mut self, allocator: DutyAllocator) {
        self.allocator = allocator;
    }

    pub fn allocator(&self) -> DutyAllocator {
        self.allocator
    }

    //////////////////////
    //  sensed values   //
    //////////////////////

    pub fn vsense(&self) -> Fixed32 {
        codepoints_to_physical(self.vsense_gain, self.vsense)
    }

    pub fn isense(&self) -> Fixed32 {
        codepoints_to_physical(self.isense_gain, self.isense)
    }

    pub fn status(&self) -> RegulatorStatus {
        RegulatorStatus {
            mode: self.mode,
            duty1: self.duty.duty1,
            duty2: self.duty.duty2,
            vsense: self.vsense(),
            isense: self.isense(),
            vsetpoint: self.vsetpoint(),
            isetpoint: self.isetpoint(),
        }
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }
}

impl<S: SelectableSource> Regulator<S> {
    /// Rewires the stage to another supply. Disabled channels only.
    pub fn set_source(&mut self, source: PowerSource) -> Result<(), RegulatorError> {
        if self.is_active() {
            warn!("source can only change while disabled");
            return Err(RegulatorError::ModeConflict);
        }

        self.stage.select_source(source);
        info!("regulator source {:?}", source);
        Ok(())
    }

    pub fn source(&self) -> PowerSource {
        self.stage.source()
    }
}
