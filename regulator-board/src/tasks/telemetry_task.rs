use embassy_executor::Spawner;
use embassy_time::Ticker;

use ateam_regulator::dual::Channel;
use ateam_regulator::regulator::RegulatorStatus;

use crate::{BoardRegulator, TELEMETRY_PERIOD};

fn log_status(name: &str, status: &RegulatorStatus) {
    defmt::info!(
        "{}: mode {}, duty ({=u16:#x}, {=u16:#x}), v {} / {} V, i {} / {} A",
        name,
        status.mode,
        status.duty1,
        status.duty2,
        status.vsense.to_f32(),
        status.vsetpoint.to_f32(),
        status.isense.to_f32(),
        status.isetpoint.to_f32(),
    );
}

#[embassy_executor::task]
async fn telemetry_task_entry(regulator: &'static BoardRegulator) {
    let mut telemetry_ticker = Ticker::every(TELEMETRY_PERIOD);

    loop {
        match (regulator.status(Channel::One), regulator.status(Channel::Two)) {
            (Some(ch1), Some(ch2)) => {
                log_status("ch1", &ch1);
                log_status("ch2", &ch2);
            }
            _ => defmt::warn!("regulator not initialized"),
        }

        telemetry_ticker.next().await;
    }
}

pub fn start_telemetry_task(task_spawner: &Spawner, regulator: &'static BoardRegulator) {
    task_spawner.spawn(telemetry_task_entry(regulator)).unwrap();
}
