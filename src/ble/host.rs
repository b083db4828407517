//! Host Stack Interface
//!
//! The BLE host stack is an external collaborator. Submissions return
//! synchronously with the stack's accept/reject decision; the outcome of an
//! accepted submission arrives later as a [`GapEvent`](crate::ble::events::GapEvent)
//! posted by the backend.

use crate::ble::params::AdvertisingParameters;
use crate::ble::payload::AdvertisingPayload;

/// Host stack operations issued by the advertiser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostOp {
    SetAdvData,
    SetScanRspData,
    StartAdvertising,
    StopAdvertising,
    SetDeviceName,
}

/// Raw error code returned by the host stack or controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostError(pub u32);

impl HostError {
    pub const INTERNAL: Self = Self(3);
    pub const NO_MEM: Self = Self(4);
    pub const NOT_SUPPORTED: Self = Self(6);
    pub const INVALID_PARAM: Self = Self(7);
    pub const INVALID_STATE: Self = Self(8);
    pub const INVALID_LENGTH: Self = Self(9);
    pub const BUSY: Self = Self(17);

    pub const fn code(self) -> u32 {
        self.0
    }
}

/// Submission side of the host stack
///
/// Implementations must not deliver completion events by calling back into
/// the advertiser from inside these methods; they post to an event queue.
pub trait HostStack {
    fn submit_advertising_data(&mut self, payload: &AdvertisingPayload) -> Result<(), HostError>;

    fn submit_scan_response_data(&mut self, payload: &AdvertisingPayload) -> Result<(), HostError>;

    fn start_advertising(&mut self, params: &AdvertisingParameters) -> Result<(), HostError>;

    fn stop_advertising(&mut self) -> Result<(), HostError>;

    fn set_device_name(&mut self, name: &str) -> Result<(), HostError>;
}
