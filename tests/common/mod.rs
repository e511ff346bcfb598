#![allow(dead_code)]

use core::num::NonZeroU32;

use ateam_regulator::config::DEFAULT_GAINS;
use ateam_regulator::drivers::{PowerSource, PowerStage, PwmGeometry, SelectableSource};
use ateam_regulator::math::FULL_SCALE;
use ateam_regulator::pwm::PwmError;
use ateam_regulator::regulator::{Regulator, RegulatorConfig};
use ateam_regulator::sampling::AnalogFrontEnd;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StageOp {
    Enable,
    Configure(PwmGeometry),
    Disable,
    Commit(PwmGeometry),
    SelectSource(PowerSource),
}

/// Power stage that records every call made into it.
#[derive(Default)]
pub struct MockStage {
    pub ops: Vec<StageOp>,
    fail_configure: Option<(usize, PwmError)>,
    configure_calls: usize,
    source: Option<PowerSource>,
}

impl MockStage {
    pub fn failing(err: PwmError) -> Self {
        Self::failing_after(0, err)
    }

    /// Accepts the first `ok_calls` configures, then fails every one after.
    pub fn failing_after(ok_calls: usize, err: PwmError) -> Self {
        MockStage {
            fail_configure: Some((ok_calls, err)),
            ..Default::default()
        }
    }

    pub fn commits(&self) -> Vec<PwmGeometry> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                StageOp::Commit(geometry) => Some(*geometry),
                _ => None,
            })
            .collect()
    }
}

impl PowerStage for MockStage {
    fn enable(&mut self) {
        self.ops.push(StageOp::Enable);
    }

    fn configure(&mut self, geometry: &PwmGeometry) -> Result<(), PwmError> {
        self.ops.push(StageOp::Configure(*geometry));
        self.configure_calls += 1;
        match self.fail_configure {
            Some((ok_calls, err)) if self.configure_calls > ok_calls => Err(err),
            _ => Ok(()),
        }
    }

    fn disable(&mut self) {
        self.ops.push(StageOp::Disable);
    }

    fn commit_duty(&mut self, geometry: &PwmGeometry) {
        self.ops.push(StageOp::Commit(*geometry));
    }
}

impl SelectableSource for MockStage {
    fn select_source(&mut self, source: PowerSource) {
        self.ops.push(StageOp::SelectSource(source));
        self.source = Some(source);
    }

    fn source(&self) -> PowerSource {
        self.source.unwrap_or(PowerSource::Input)
    }
}

#[derive(Default)]
pub struct MockFrontEnd {
    pub powered: bool,
    pub power_ups: u32,
    pub power_downs: u32,
}

impl AnalogFrontEnd for MockFrontEnd {
    fn power_up(&mut self) {
        self.powered = true;
        self.power_ups += 1;
    }

    fn power_down(&mut self) {
        self.powered = false;
        self.power_downs += 1;
    }
}

/// Channel config with the same gain on both sense inputs.
pub fn config(gain: u32) -> RegulatorConfig {
    RegulatorConfig {
        vsense_gain: NonZeroU32::new(gain).unwrap(),
        isense_gain: NonZeroU32::new(gain).unwrap(),
        period: 400,
        vlimit: FULL_SCALE,
        ilimit: FULL_SCALE,
        v_gains: DEFAULT_GAINS,
        i_gains: DEFAULT_GAINS,
        rail_margin: 2000,
    }
}

/// One codepoint per unit, so physical values and codepoints read the same.
pub fn unit_regulator() -> Regulator<MockStage> {
    Regulator::new(config(1), MockStage::default())
}
