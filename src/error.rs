//! Error kinds
//!
//! Every failure the advertising core can observe maps to one of four kinds:
//! a malformed payload or parameter set caught before anything is submitted,
//! a synchronous rejection by the host stack, a failed asynchronous
//! acknowledgment, or a failed controller/host bring-up step.

use crate::ble::bringup::InitStage;
use crate::ble::events::AckStatus;
use crate::ble::gap_state::AdvState;
use crate::ble::host::{HostError, HostOp};

/// Payload or parameter validation errors, detected before submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Raw UUID was not 2, 4 or 16 bytes long
    InvalidUuidLength(usize),
    /// Interval minimum greater than interval maximum
    IntervalOrder { min: u16, max: u16 },
    /// Advertising interval outside 0x20..=0x4000
    IntervalRange(u16),
    /// Channel map selects no advertising channel
    EmptyChannelMap,
    /// Bounded storage for UUIDs or data is full
    CapacityExceeded,
    /// Encoded AD structures do not fit in one advertising PDU
    PayloadTooLarge,
    /// Primary payload marked as scan response, or the reverse
    PayloadRole,
    /// Device name longer than the GAP limit
    NameTooLong,
    /// Operation not allowed in the current advertising state
    Busy(AdvState),
}

/// Top-level advertising error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvError {
    Configuration(ConfigError),
    Submission { op: HostOp, error: HostError },
    AckFailure { op: HostOp, status: AckStatus },
    Initialization { stage: InitStage, error: HostError },
}

impl From<ConfigError> for AdvError {
    fn from(err: ConfigError) -> Self {
        AdvError::Configuration(err)
    }
}
