use embedded_hal::digital::OutputPin;

use crate::config::PHASE_OFFSET_CYCLES;
use crate::pwm::{
    configure_dual_pwm, duty_to_compare, validate_period, OutputChannel, PwmError, PwmTimer,
    TriggerInput,
};

use super::{PowerStage, PwmGeometry};

/// Buck-boost channel: the buck switch runs on the master counter, the
/// boost switch on a gated slave that lags it by a fixed phase offset.
pub struct BuckBoostStage<M: PwmTimer, S: PwmTimer, P: OutputPin> {
    master: M,
    master_channel: OutputChannel,
    slave: S,
    slave_channel: OutputChannel,
    slave_trigger: TriggerInput,
    phase_offset: u16,
    sense_enable: P,
}

impl<M: PwmTimer, S: PwmTimer, P: OutputPin> BuckBoostStage<M, S, P> {
    pub fn new(
        master: M,
        master_channel: OutputChannel,
        slave: S,
        slave_channel: OutputChannel,
        slave_trigger: TriggerInput,
        sense_enable: P,
    ) -> Self {
        BuckBoostStage {
            master,
            master_channel,
            slave,
            slave_channel,
            slave_trigger,
            phase_offset: PHASE_OFFSET_CYCLES,
            sense_enable,
        }
    }

    pub fn with_phase_offset(mut self, phase_offset: u16) -> Self {
        self.phase_offset = phase_offset;
        self
    }

    fn set_sense_enabled(&mut self, enabled: bool) {
        let res = if enabled {
            self.sense_enable.set_high()
        } else {
            self.sense_enable.set_low()
        };

        if res.is_err() {
            warn!("buck-boost sense enable pin did not switch");
        }
    }
}

impl<M: PwmTimer, S: PwmTimer, P: OutputPin> PowerStage for BuckBoostStage<M, S, P> {
    fn enable(&mut self) {
        self.set_sense_enabled(true);
        self.master.enable_clock();
        self.slave.enable_clock();
    }

    fn configure(&mut self, geometry: &PwmGeometry) -> Result<(), PwmError> {
        let period = validate_period(geometry.period)?;
        let compare_master = duty_to_compare(geometry.duty1, geometry.period);
        let compare_slave = duty_to_compare(geometry.duty2, geometry.period);

        configure_dual_pwm(
            &mut self.master,
            self.master_channel,
            &mut self.slave,
            self.slave_channel,
            self.slave_trigger,
            period,
            compare_master,
            compare_slave,
            self.phase_offset,
        )?;

        // slave first, it only counts once the master raises its trigger
        self.slave.enable_counter();
        self.master.enable_counter();

        Ok(())
    }

    fn disable(&mut self) {
        self.master.disable_output(self.master_channel);
        self.slave.disable_output(self.slave_channel);
        self.master.disable_counter();
        self.slave.disable_counter();
        self.master.disable_clock();
        self.slave.disable_clock();
        self.set_sense_enabled(false);
    }

    fn commit_duty(&mut self, geometry: &PwmGeometry) {
        let compare_master = duty_to_compare(geometry.duty1, geometry.period);
        let compare_slave = duty_to_compare(geometry.duty2, geometry.period);

        // pausing the master also gates the slave, so both compares land in the same period
        self.master.disable_counter();
        self.master.set_compare(self.master_channel, compare_master);
        self.slave.set_compare(self.slave_channel, compare_slave);
        self.master.enable_counter();
    }
}
