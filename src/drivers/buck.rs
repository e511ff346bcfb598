use crate::pwm::{
    configure_pwm, duty_to_compare, validate_period, OutputChannel, Polarity, PwmError, PwmTimer,
};

use super::{PowerSource, PowerStage, PwmGeometry, SelectableSource};

/// Single switch buck channel. One counter, with the switch driven from
/// whichever compare output is wired to the selected supply.
pub struct BuckStage<T: PwmTimer> {
    timer: T,
    battery_channel: OutputChannel,
    input_channel: OutputChannel,
    source: PowerSource,
}

impl<T: PwmTimer> BuckStage<T> {
    pub fn new(timer: T, battery_channel: OutputChannel, input_channel: OutputChannel) -> Self {
        BuckStage {
            timer,
            battery_channel,
            input_channel,
            source: PowerSource::Input,
        }
    }

    fn active_channel(&self) -> OutputChannel {
        match self.source {
            PowerSource::Battery => self.battery_channel,
            PowerSource::Input => self.input_channel,
        }
    }

    fn release_outputs(&mut self) {
        self.timer.disable_output(self.battery_channel);
        self.timer.disable_output(self.input_channel);
    }
}

impl<T: PwmTimer> PowerStage for BuckStage<T> {
    fn enable(&mut self) {
        self.timer.enable_clock();
    }

    fn configure(&mut self, geometry: &PwmGeometry) -> Result<(), PwmError> {
        let period = validate_period(geometry.period)?;
        let compare = duty_to_compare(geometry.duty1, geometry.period);
        let channel = self.active_channel();

        configure_pwm(&mut self.timer, channel, period, Polarity::ActiveHigh, compare);
        self.timer.enable_counter();

        Ok(())
    }

    fn disable(&mut self) {
        self.release_outputs();
        self.timer.disable_counter();
        self.timer.disable_clock();
    }

    fn commit_duty(&mut self, geometry: &PwmGeometry) {
        let compare = duty_to_compare(geometry.duty1, geometry.period);
        let channel = self.active_channel();
        self.timer.set_compare(channel, compare);
    }
}

impl<T: PwmTimer> SelectableSource for BuckStage<T> {
    fn select_source(&mut self, source: PowerSource) {
        self.source = source;
        self.release_outputs();
    }

    fn source(&self) -> PowerSource {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FULL_SCALE;
    use crate::pwm::mock::{MockTimer, TimerOp};

    fn stage() -> BuckStage<MockTimer> {
        BuckStage::new(MockTimer::default(), OutputChannel::Ch1, OutputChannel::Ch3)
    }

    #[test]
    fn source_selects_output() {
        let mut stage = stage();
        let geometry = PwmGeometry { period: 400, duty1: FULL_SCALE, duty2: 0 };

        stage.configure(&geometry).unwrap();
        assert!(stage.timer.ops.contains(&TimerOp::EnableOutput(OutputChannel::Ch3)));

        stage.select_source(PowerSource::Battery);
        assert_eq!(stage.source(), PowerSource::Battery);
        assert!(stage.timer.ops.ends_with(&[
            TimerOp::DisableOutput(OutputChannel::Ch1),
            TimerOp::DisableOutput(OutputChannel::Ch3),
        ]));

        stage.timer.ops.clear();
        stage.configure(&geometry).unwrap();
        assert!(stage.timer.ops.contains(&TimerOp::EnableOutput(OutputChannel::Ch1)));
        assert!(stage.timer.ops.contains(&TimerOp::Compare(OutputChannel::Ch1, 400)));
        assert_eq!(stage.timer.ops.last(), Some(&TimerOp::EnableCounter));
    }

    #[test]
    fn commit_uses_first_duty_only() {
        let mut stage = stage();
        stage.commit_duty(&PwmGeometry { period: 400, duty1: 0x8000, duty2: 0x1234 });

        assert_eq!(stage.timer.ops, [TimerOp::Compare(OutputChannel::Ch3, 200)]);
    }

    #[test]
    fn disable_releases_both_outputs() {
        let mut stage = stage();
        stage.disable();

        assert_eq!(
            stage.timer.ops,
            [
                TimerOp::DisableOutput(OutputChannel::Ch1),
                TimerOp::DisableOutput(OutputChannel::Ch3),
                TimerOp::DisableCounter,
                TimerOp::DisableClock,
            ]
        );
    }
}
