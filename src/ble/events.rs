//! GAP Event Delivery
//!
//! The host stack reports completions of submitted operations, and a few
//! unsolicited notifications, as [`GapEvent`]s. Backends post them into an
//! [`EventQueue`]; the advertising state machine drains the queue one event
//! at a time.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};

/// Default event queue depth
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// Acknowledgment status carried by completion events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AckStatus {
    Success,
    /// Stack-specific failure status
    Failed(u8),
}

impl AckStatus {
    /// Map a raw stack status, zero meaning success
    pub const fn from_raw(status: u8) -> Self {
        match status {
            0 => AckStatus::Success,
            code => AckStatus::Failed(code),
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, AckStatus::Success)
    }
}

/// Connection parameter update notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnParamsUpdate {
    pub status: AckStatus,
    pub min_int: u16,  // 1.25ms units
    pub max_int: u16,  // 1.25ms units
    pub conn_int: u16, // 1.25ms units
    pub latency: u16,
    pub timeout: u16, // 10ms units
}

/// GAP events delivered by the host stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GapEvent {
    AdvDataSetComplete(AckStatus),
    ScanRspSetComplete(AckStatus),
    AdvStartComplete(AckStatus),
    AdvStopComplete(AckStatus),
    ConnParamsUpdate(ConnParamsUpdate),
    /// Any event the advertiser does not act on, by stack event id
    Other(u16),
}

/// Bounded queue carrying events from the host stack to the dispatcher
pub struct EventQueue<M: RawMutex, const N: usize> {
    channel: Channel<M, GapEvent, N>,
}

impl<M: RawMutex, const N: usize> EventQueue<M, N> {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Post an event without blocking; hands the event back when full
    pub fn post(&self, event: GapEvent) -> Result<(), GapEvent> {
        self.channel.try_send(event).map_err(|e| match e {
            TrySendError::Full(event) => event,
        })
    }

    /// Next queued event, if any
    pub fn try_next(&self) -> Option<GapEvent> {
        self.channel.try_receive().ok()
    }

    /// Wait for the next event
    pub async fn next(&self) -> GapEvent {
        self.channel.receive().await
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl<M: RawMutex, const N: usize> Default for EventQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}
