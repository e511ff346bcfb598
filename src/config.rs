// Naming Scheme
// *_HZ are frequencies, *_CYCLES are timer counts, *_MV/*_MOHM are board component values
// codepoint gains are codepoints per volt (vsense) or per amp (isense)

use core::num::NonZeroU32;

use crate::math::{Fixed32, FULL_SCALE};
use crate::regulator::{FeedbackGains, RegulatorConfig};

// core runs from the 2.097MHz MSI clock
pub const CLOCK_RATE_HZ: u32 = 2_097_000;

// the sampling trigger counter divides the core clock by (prescaler + 1) and
// fires once per period, kicking off the 4 entry analog sequence
pub const SAMPLE_TRIGGER_PRESCALER: u16 = 1;
pub const SAMPLE_TRIGGER_PERIOD_CYCLES: u16 = (CLOCK_RATE_HZ / 1000) as u16;
pub const SAMPLE_RATE_HZ: u32 =
    CLOCK_RATE_HZ / (SAMPLE_TRIGGER_PRESCALER as u32 + 1) / SAMPLE_TRIGGER_PERIOD_CYCLES as u32;

// switching frequency of both channels
pub const PWM_TIMER_CLOCK_HZ: u32 = 2_000_000;
pub const PWM_FREQUENCY_HZ: u32 = 5_000;
pub const DEFAULT_PERIOD_CYCLES: u32 = PWM_TIMER_CLOCK_HZ / PWM_FREQUENCY_HZ;

// lag of the boost switch edge behind the buck switch edge on channel 1
pub const PHASE_OFFSET_CYCLES: u16 = 0x10;

// a duty within this many counts of a rail is considered saturated (~3%)
pub const DUTY_RAIL_MARGIN: i32 = 2000;

// analog front end
pub const ADC_FULL_SCALE_CODES: u32 = 1 << 12;
pub const ADC_VREF_MV: u32 = 3300;

// vsense dividers are 68k over 33k on both channels
const VSENSE_DIVIDER_HIGH_OHM: u32 = 68_000;
const VSENSE_DIVIDER_LOW_OHM: u32 = 33_000;

// both channels share a 50mOhm shunt, the amplifier gain differs
const ISENSE_SHUNT_MOHM: u32 = 50;
const CH1_ISENSE_AMP_GAIN: u32 = 10;
const CH2_ISENSE_AMP_GAIN: u32 = 47;

const fn nonzero(value: u32) -> NonZeroU32 {
    match NonZeroU32::new(value) {
        Some(value) => value,
        None => core::panic!("calibration gain must be nonzero"),
    }
}

const fn vsense_gain() -> NonZeroU32 {
    nonzero(
        ADC_FULL_SCALE_CODES * VSENSE_DIVIDER_LOW_OHM / ADC_VREF_MV * 1000
            / (VSENSE_DIVIDER_HIGH_OHM + VSENSE_DIVIDER_LOW_OHM),
    )
}

const fn isense_gain(amp_gain: u32) -> NonZeroU32 {
    nonzero(ADC_FULL_SCALE_CODES * ISENSE_SHUNT_MOHM * amp_gain / ADC_VREF_MV)
}

pub const DEFAULT_GAINS: FeedbackGains = FeedbackGains {
    prop_gain1: Fixed32::ONE,
    prop_gain2: Fixed32::ONE,
};

pub const CHANNEL1_CONFIG: RegulatorConfig = RegulatorConfig {
    vsense_gain: vsense_gain(),
    isense_gain: isense_gain(CH1_ISENSE_AMP_GAIN),
    period: DEFAULT_PERIOD_CYCLES,
    vlimit: FULL_SCALE,
    ilimit: FULL_SCALE,
    v_gains: DEFAULT_GAINS,
    i_gains: DEFAULT_GAINS,
    rail_margin: DUTY_RAIL_MARGIN,
};

pub const CHANNEL2_CONFIG: RegulatorConfig = RegulatorConfig {
    vsense_gain: vsense_gain(),
    isense_gain: isense_gain(CH2_ISENSE_AMP_GAIN),
    period: DEFAULT_PERIOD_CYCLES,
    vlimit: FULL_SCALE,
    ilimit: FULL_SCALE,
    v_gains: DEFAULT_GAINS,
    i_gains: DEFAULT_GAINS,
    rail_margin: DUTY_RAIL_MARGIN,
};
