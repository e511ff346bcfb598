use embassy_executor::SendSpawner;
use embassy_stm32::adc::{Adc, AdcChannel, AnyAdcChannel, SampleTime};
use embassy_stm32::pac;
use embassy_time::{Duration, Ticker};

use ateam_regulator::config::CLOCK_RATE_HZ;
use ateam_regulator::sampling::{SampleSet, TriggerConfig, SEQUENCE_LEN};

use crate::front_end::FrontEndState;
use crate::pins::{
    Ch1CurrentSensePin, Ch1VoltageSensePin, Ch2CurrentSensePin, Ch2VoltageSensePin, SenseAdc,
};
use crate::BoardRegulator;

/// Sample-and-control loop. Runs on the high priority executor so a
/// configuration call from thread mode never delays a control step by more
/// than its own critical section.
///
/// The converter only exists while the front end is powered. On power down
/// the driver is dropped, the ADC clock is gated and the task parks until
/// the next power up.
#[embassy_executor::task]
async fn sampling_task_entry(
    regulator: &'static BoardRegulator,
    front_end: &'static FrontEndState,
    mut adc_peri: SenseAdc,
    mut sequence: [AnyAdcChannel<SenseAdc>; SEQUENCE_LEN],
    trigger: TriggerConfig,
) -> ! {
    let sample_period = Duration::from_hz(trigger.rate_hz(CLOCK_RATE_HZ) as u64);

    loop {
        front_end.wait_powered().await;

        let mut adc = Adc::new(&mut adc_peri);
        adc.set_sample_time(SampleTime::CYCLES96);
        let mut sample_ticker = Ticker::every(sample_period);

        loop {
            sample_ticker.next().await;

            if !front_end.is_powered() {
                break;
            }

            let mut samples = [0u16; SEQUENCE_LEN];
            for (sample, channel) in samples.iter_mut().zip(sequence.iter_mut()) {
                *sample = adc.blocking_read(channel);
            }

            regulator.on_samples_ready(SampleSet::from_sequence(samples));
        }

        drop(adc);
        pac::RCC.apb2enr().modify(|w| w.set_adc1en(false));
        defmt::debug!("sense adc clock gated");
    }
}

#[allow(clippy::too_many_arguments)]
pub fn start_sampling_task(
    task_spawner: SendSpawner,
    regulator: &'static BoardRegulator,
    front_end: &'static FrontEndState,
    adc: SenseAdc,
    vsense1_pin: Ch1VoltageSensePin,
    isense1_pin: Ch1CurrentSensePin,
    vsense2_pin: Ch2VoltageSensePin,
    isense2_pin: Ch2CurrentSensePin,
    trigger: TriggerConfig,
) {
    // conversion order is fixed: vsense1, isense1, vsense2, isense2
    let sequence = [
        vsense1_pin.degrade_adc(),
        isense1_pin.degrade_adc(),
        vsense2_pin.degrade_adc(),
        isense2_pin.degrade_adc(),
    ];

    defmt::info!("sampling at {} Hz", trigger.rate_hz(CLOCK_RATE_HZ));
    task_spawner.spawn(sampling_task_entry(regulator, front_end, adc, sequence, trigger)).unwrap();
}
