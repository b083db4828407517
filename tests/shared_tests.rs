//! Shared advertiser tests
//!
//! Completions delivered from several threads at once must still produce a
//! single start command.

mod common;

use std::sync::Barrier;
use std::thread;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use nrf52820_s140_advertiser::ble::events::{AckStatus, GapEvent};
use nrf52820_s140_advertiser::ble::gap_state::AdvState;
use nrf52820_s140_advertiser::ble::host::HostOp;
use nrf52820_s140_advertiser::ble::shared::SharedAdvertiser;

use crate::common::*;

type Shared = SharedAdvertiser<CriticalSectionRawMutex, RecordingHost>;

#[test]
fn test_concurrent_completions_start_once() {
    for _ in 0..64 {
        let shared = Shared::new(configuring_both());
        let barrier = Barrier::new(2);

        let issued: Vec<Option<HostOp>> = thread::scope(|s| {
            let handles = [GapEvent::AdvDataSetComplete(AckStatus::Success), GapEvent::ScanRspSetComplete(AckStatus::Success)]
                .map(|event| {
                    let shared = &shared;
                    let barrier = &barrier;
                    s.spawn(move || {
                        barrier.wait();
                        shared.handle_event(event).issued
                    })
                });
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(issued.iter().filter(|op| **op == Some(HostOp::StartAdvertising)).count(), 1);
        assert_eq!(shared.state(), AdvState::ReadyToAdvertise);

        let machine = shared.into_inner();
        assert_eq!(machine.host().starts(), 1);
        assert!(machine.pending().is_empty());
    }
}

#[test]
fn test_duplicate_completions_across_threads() {
    let shared = Shared::new(configuring_both());

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                shared.handle_event(GapEvent::AdvDataSetComplete(AckStatus::Success));
                shared.handle_event(GapEvent::ScanRspSetComplete(AckStatus::Success));
            });
        }
    });

    assert_eq!(shared.with(|m| m.host().starts()), 1);
}

#[test]
fn test_shared_lifecycle() {
    let shared = Shared::new(machine());
    shared
        .begin_configuration(&adv_payload(), Some(&scan_rsp_payload()), Default::default())
        .unwrap();
    assert_eq!(shared.state(), AdvState::ConfiguringBoth);

    shared.handle_event(GapEvent::ScanRspSetComplete(AckStatus::Success));
    shared.handle_event(GapEvent::AdvDataSetComplete(AckStatus::Success));
    shared.handle_event(GapEvent::AdvStartComplete(AckStatus::Success));
    assert_eq!(shared.state(), AdvState::Advertising);

    shared.request_stop().unwrap();
    shared.handle_event(GapEvent::AdvStopComplete(AckStatus::Success));
    assert_eq!(shared.state(), AdvState::Stopped);
}
