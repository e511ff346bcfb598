use crate::config::{SAMPLE_TRIGGER_PERIOD_CYCLES, SAMPLE_TRIGGER_PRESCALER};
use crate::math::Codepoint;

/// Number of conversions in one triggered sequence.
pub const SEQUENCE_LEN: usize = 4;

/// One completed conversion sequence, in trigger order.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SampleSet {
    pub vsense1: Codepoint,
    pub isense1: Codepoint,
    pub vsense2: Codepoint,
    pub isense2: Codepoint,
}

impl SampleSet {
    /// Unpacks the sequence as converted: vsense1, isense1, vsense2, isense2.
    pub const fn from_sequence(seq: [Codepoint; SEQUENCE_LEN]) -> Self {
        SampleSet {
            vsense1: seq[0],
            isense1: seq[1],
            vsense2: seq[2],
            isense2: seq[3],
        }
    }
}

/// Counter settings for the periodic conversion trigger.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerConfig {
    pub prescaler: u16,
    pub period: u16,
}

impl TriggerConfig {
    pub const fn rate_hz(&self, clock_hz: u32) -> u32 {
        clock_hz / (self.prescaler as u32 + 1) / self.period as u32
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        TriggerConfig {
            prescaler: SAMPLE_TRIGGER_PRESCALER,
            period: SAMPLE_TRIGGER_PERIOD_CYCLES,
        }
    }
}

/// The trigger counter and converter shared by both channels.
///
/// Only powered while at least one channel is active. Completion of a
/// sequence is reported back by the owner calling
/// [`DualRegulator::on_samples_ready`](crate::dual::DualRegulator::on_samples_ready).
pub trait AnalogFrontEnd {
    fn power_up(&mut self);

    fn power_down(&mut self);
}
