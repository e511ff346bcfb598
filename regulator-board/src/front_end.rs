use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use ateam_regulator::sampling::AnalogFrontEnd;

/// Power state of the sense converter. The sampling task owns the converter
/// and parks on this while the front end is down.
pub struct FrontEndState {
    powered: AtomicBool,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl FrontEndState {
    pub const fn new() -> Self {
        FrontEndState {
            powered: AtomicBool::new(false),
            wake: Signal::new(),
        }
    }

    pub fn is_powered(&self) -> bool {
        self.powered.load(Ordering::Acquire)
    }

    pub async fn wait_powered(&self) {
        while !self.is_powered() {
            self.wake.wait().await;
        }
    }

    fn set_powered(&self, powered: bool) {
        self.powered.store(powered, Ordering::Release);
        if powered {
            self.wake.signal(());
        }
    }
}

impl Default for FrontEndState {
    fn default() -> Self {
        Self::new()
    }
}

/// The regulator's handle on the shared front end.
pub struct SampledFrontEnd {
    state: &'static FrontEndState,
}

impl SampledFrontEnd {
    pub fn new(state: &'static FrontEndState) -> Self {
        SampledFrontEnd { state }
    }
}

impl AnalogFrontEnd for SampledFrontEnd {
    fn power_up(&mut self) {
        defmt::debug!("sense front end up");
        self.state.set_powered(true);
    }

    fn power_down(&mut self) {
        defmt::debug!("sense front end down");
        self.state.set_powered(false);
    }
}
