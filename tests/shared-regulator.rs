mod common;

use ateam_regulator::dual::{Channel, DualRegulator};
use ateam_regulator::math::Fixed32;
use ateam_regulator::regulator::FeedbackMode;
use ateam_regulator::sampling::SampleSet;
use ateam_regulator::shared::SharedRegulator;

use common::{unit_regulator, MockFrontEnd, MockStage};

type TestShared = SharedRegulator<MockStage, MockStage, MockFrontEnd>;

static REGULATOR: TestShared = SharedRegulator::new();

fn dual() -> DualRegulator<MockStage, MockStage, MockFrontEnd> {
    DualRegulator::new(unit_regulator(), unit_regulator(), MockFrontEnd::default())
}

#[test]
fn empty_until_init() {
    let shared = TestShared::new();

    assert!(!shared.is_initialized());
    assert_eq!(shared.with(|reg| reg.mode(Channel::One)), None);
    assert_eq!(shared.status(Channel::Two), None);

    // must not panic
    shared.on_samples_ready(SampleSet::default());
}

#[test]
fn init_resets_installed_regulator() {
    let shared = TestShared::new();
    let mut reg = dual();
    reg.set_mode(Channel::One, FeedbackMode::ConstantDuty).unwrap();

    shared.init(reg).unwrap();

    assert!(shared.is_initialized());
    assert_eq!(shared.status(Channel::One).map(|s| s.mode), Some(FeedbackMode::Disabled));
    assert_eq!(shared.with(|reg| reg.is_front_end_powered()), Some(false));
}

#[test]
fn configuration_and_interrupt_share_state() {
    REGULATOR.init(dual()).unwrap();

    REGULATOR
        .with(|reg| {
            reg.channel1_mut().set_isetpoint(Fixed32::from_int(200))?;
            reg.set_mode(Channel::One, FeedbackMode::CurrentFeedback)
        })
        .unwrap()
        .unwrap();

    REGULATOR.on_samples_ready(SampleSet::from_sequence([12, 150, 0, 0]));

    let status = REGULATOR.status(Channel::One).unwrap();
    assert_eq!(status.mode, FeedbackMode::CurrentFeedback);
    assert_eq!(status.isense, Fixed32::from_int(150));
    assert_eq!(status.vsense, Fixed32::from_int(12));
    assert_eq!(status.isetpoint, Fixed32::from_int(200));

    let commits = REGULATOR.with(|reg| reg.channel1().stage().commits().len());
    assert_eq!(commits, Some(1));
}
