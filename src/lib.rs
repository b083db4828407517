#![cfg_attr(not(test), no_std)]

//! nRF52820 S140 BLE Advertising Bring-up Library
//!
//! Brings a BLE peripheral up to the advertising state, organized as:
//!
//! - `ble`: advertising payloads, GAP events, the host-stack seam and the
//!   advertising configuration state machine
//! - `config`: the firmware's advertising configuration
//! - `error`: error kinds shared by all layers

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod ble;
pub mod config;
pub mod error;
