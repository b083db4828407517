//! BLE Advertising Implementation
//!
//! Contains the advertising payload builder, the GAP event model and the
//! advertising configuration state machine, plus the S140 SoftDevice backend
//! when the `softdevice` feature is enabled.

pub mod ad;
pub mod advertising;
pub mod bringup;
pub mod events;
pub mod gap_state;
pub mod host;
pub mod params;
pub mod payload;
pub mod shared;
#[cfg(feature = "softdevice")]
pub mod softdevice;
