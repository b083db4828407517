//! Common test utilities for the host-side integration tests
//!
//! - `RecordingHost`: a `HostStack` double that records every call
//! - payload and machine constructors shared by the test files

#![allow(dead_code)]

use nrf52820_s140_advertiser::ble::advertising::{AdvertiserConfig, AdvertisingStateMachine};
use nrf52820_s140_advertiser::ble::host::{HostError, HostOp, HostStack};
use nrf52820_s140_advertiser::ble::params::AdvertisingParameters;
use nrf52820_s140_advertiser::ble::payload::{AdvFlags, AdvertisingPayload};

/// One call observed by `RecordingHost`
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    SetAdvData(AdvertisingPayload),
    SetScanRsp(AdvertisingPayload),
    Start(AdvertisingParameters),
    Stop,
    SetName(String),
}

/// Host stack double: records calls, optionally rejects one operation
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<HostCall>,
    pub reject: Option<HostOp>,
}

impl RecordingHost {
    fn result(&self, op: HostOp) -> Result<(), HostError> {
        match self.reject {
            Some(rejected) if rejected == op => Err(HostError::INVALID_STATE),
            _ => Ok(()),
        }
    }

    pub fn starts(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, HostCall::Start(_))).count()
    }

    pub fn stops(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, HostCall::Stop)).count()
    }
}

impl HostStack for RecordingHost {
    fn submit_advertising_data(&mut self, payload: &AdvertisingPayload) -> Result<(), HostError> {
        self.calls.push(HostCall::SetAdvData(payload.clone()));
        self.result(HostOp::SetAdvData)
    }

    fn submit_scan_response_data(&mut self, payload: &AdvertisingPayload) -> Result<(), HostError> {
        self.calls.push(HostCall::SetScanRsp(payload.clone()));
        self.result(HostOp::SetScanRspData)
    }

    fn start_advertising(&mut self, params: &AdvertisingParameters) -> Result<(), HostError> {
        self.calls.push(HostCall::Start(*params));
        self.result(HostOp::StartAdvertising)
    }

    fn stop_advertising(&mut self) -> Result<(), HostError> {
        self.calls.push(HostCall::Stop);
        self.result(HostOp::StopAdvertising)
    }

    fn set_device_name(&mut self, name: &str) -> Result<(), HostError> {
        self.calls.push(HostCall::SetName(name.to_owned()));
        self.result(HostOp::SetDeviceName)
    }
}

pub fn adv_payload() -> AdvertisingPayload {
    AdvertisingPayload::builder()
        .flags(AdvFlags::GENERAL_DISCOVERY | AdvFlags::BREDR_NOT_SUPPORTED)
        .include_name(true)
        .include_tx_power(true)
        .interval(0x20, 0x40)
        .build()
        .unwrap()
}

pub fn scan_rsp_payload() -> AdvertisingPayload {
    AdvertisingPayload::builder()
        .scan_response(true)
        .manufacturer_data(&[0xFF, 0xFF, 0x01])
        .build()
        .unwrap()
}

pub fn machine() -> AdvertisingStateMachine<RecordingHost> {
    machine_with(AdvertiserConfig::default())
}

pub fn machine_with(config: AdvertiserConfig) -> AdvertisingStateMachine<RecordingHost> {
    AdvertisingStateMachine::new(RecordingHost::default(), config)
}

/// Machine with both configuration steps submitted
pub fn configuring_both() -> AdvertisingStateMachine<RecordingHost> {
    let mut sm = machine();
    sm.begin_configuration(&adv_payload(), Some(&scan_rsp_payload()), AdvertisingParameters::default())
        .unwrap();
    sm
}
