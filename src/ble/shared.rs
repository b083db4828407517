//! Shared Advertiser
//!
//! For targets that deliver GAP events from more than one execution context.
//! The machine sits behind a single blocking mutex so the
//! read-mask/clear-bit/decide-to-start sequence of each event runs as one
//! critical section and the start command is still issued exactly once.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::ble::advertising::{AdvertisingStateMachine, Transition};
use crate::ble::events::GapEvent;
use crate::ble::gap_state::AdvState;
use crate::ble::host::HostStack;
use crate::ble::params::AdvertisingParameters;
use crate::ble::payload::AdvertisingPayload;
use crate::error::AdvError;

pub struct SharedAdvertiser<M: RawMutex, H: HostStack> {
    inner: Mutex<M, RefCell<AdvertisingStateMachine<H>>>,
}

impl<M: RawMutex, H: HostStack> SharedAdvertiser<M, H> {
    pub fn new(machine: AdvertisingStateMachine<H>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(machine)),
        }
    }

    /// Run `f` with exclusive access to the machine
    ///
    /// Must not be re-entered from inside `f` (e.g. by a host that calls
    /// back synchronously).
    pub fn with<R>(&self, f: impl FnOnce(&mut AdvertisingStateMachine<H>) -> R) -> R {
        self.inner.lock(|machine| f(&mut machine.borrow_mut()))
    }

    pub fn handle_event(&self, event: GapEvent) -> Transition {
        self.with(|machine| machine.handle_event(event))
    }

    pub fn begin_configuration(
        &self,
        payload: &AdvertisingPayload,
        scan_response: Option<&AdvertisingPayload>,
        params: AdvertisingParameters,
    ) -> Result<Transition, AdvError> {
        self.with(|machine| machine.begin_configuration(payload, scan_response, params))
    }

    pub fn request_stop(&self) -> Result<Transition, AdvError> {
        self.with(|machine| machine.request_stop())
    }

    pub fn state(&self) -> AdvState {
        self.with(|machine| machine.state())
    }

    pub fn into_inner(self) -> AdvertisingStateMachine<H> {
        self.inner.into_inner().into_inner()
    }
}
