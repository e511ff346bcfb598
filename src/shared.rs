use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::drivers::{PowerStage, SelectableSource};
use crate::dual::{Channel, DualRegulator};
use crate::regulator::{RegulatorError, RegulatorStatus};
use crate::sampling::{AnalogFrontEnd, SampleSet};

/// Regulator state shared between the configuration context and the
/// sampling interrupt.
///
/// Every access runs inside a critical section, so the interrupt never sees
/// a half applied configuration call (e.g. a new period with old duties)
/// and a configuration call never observes a half finished control step.
/// Closures passed to [`SharedRegulator::with`] must stay short, the
/// sampling interrupt is held off for their whole duration.
pub struct SharedRegulator<B1: PowerStage, B2: SelectableSource, F: AnalogFrontEnd> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<DualRegulator<B1, B2, F>>>>,
}

impl<B1: PowerStage, B2: SelectableSource, F: AnalogFrontEnd> SharedRegulator<B1, B2, F> {
    pub const fn new() -> Self {
        SharedRegulator {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Installs the regulator and brings it to its reset state. Replaces any
    /// previously installed instance.
    pub fn init(&self, mut regulator: DualRegulator<B1, B2, F>) -> Result<(), RegulatorError> {
        self.inner.lock(|inner| {
            regulator.init()?;
            inner.replace(Some(regulator));
            Ok(())
        })
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.lock(|inner| inner.borrow().is_some())
    }

    /// Runs `f` with exclusive access. `None` before [`SharedRegulator::init`].
    pub fn with<R>(&self, f: impl FnOnce(&mut DualRegulator<B1, B2, F>) -> R) -> Option<R> {
        self.inner.lock(|inner| inner.borrow_mut().as_mut().map(f))
    }

    /// Entry point for the conversion complete interrupt. Samples arriving
    /// before init are dropped.
    pub fn on_samples_ready(&self, samples: SampleSet) {
        if self.with(|reg| reg.on_samples_ready(samples)).is_none() {
            trace!("samples ready before init, dropped");
        }
    }

    pub fn status(&self, channel: Channel) -> Option<RegulatorStatus> {
        self.with(|reg| reg.status(channel))
    }
}

impl<B1: PowerStage, B2: SelectableSource, F: AnalogFrontEnd> Default
    for SharedRegulator<B1, B2, F>
{
    fn default() -> Self {
        Self::new()
    }
}
