#![no_std]
#![no_main]

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::{config::Config, interrupt};
use embassy_time::{Duration, Timer};
use nrf52820_s140_advertiser::ble::advertising::AdvertisingStateMachine;
use nrf52820_s140_advertiser::ble::bringup::bring_up;
use nrf52820_s140_advertiser::ble::softdevice::{SoftdeviceHost, SoftdeviceRadio, GAP_EVENTS};
use nrf52820_s140_advertiser::config;
use nrf_softdevice::Config as SdConfig;
use panic_probe as _;

fn softdevice_config() -> SdConfig {
    SdConfig {
        clock: Some(nrf_softdevice::raw::nrf_clock_lf_cfg_t {
            source: nrf_softdevice::raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: nrf_softdevice::raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(nrf_softdevice::raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(nrf_softdevice::raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gap_role_count: Some(nrf_softdevice::raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: Default::default(),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting nRF52820 S140 advertiser");

    let mut nrf_config = Config::default();
    // Configure interrupt priorities to avoid SoftDevice reserved levels (0, 1, 4)
    nrf_config.gpiote_interrupt_priority = interrupt::Priority::P2;
    nrf_config.time_interrupt_priority = interrupt::Priority::P2;
    let _peripherals = embassy_nrf::init(nrf_config);

    let mut radio = SoftdeviceRadio::new(spawner, softdevice_config());
    if let Err(e) = bring_up(&mut radio) {
        defmt::panic!("BLE bring-up failed: {}", e);
    }

    let advertiser_config = unwrap!(config::advertiser_config());
    let machine = AdvertisingStateMachine::new(SoftdeviceHost::new(config::TX_POWER_DBM, config::OWN_ADDR_TYPE), advertiser_config);
    unwrap!(spawner.spawn(gap_event_task(machine)));

    info!("System initialized, entering main loop");

    // Main loop - just logging heartbeat
    loop {
        Timer::after(Duration::from_secs(10)).await;
        info!("Heartbeat - system running");
    }
}

/// Configures advertising, then feeds GAP events to the state machine
#[embassy_executor::task]
async fn gap_event_task(mut machine: AdvertisingStateMachine<SoftdeviceHost>) {
    let adv = unwrap!(config::advertising_payload());
    let scan_rsp = unwrap!(config::scan_response_payload());

    if let Err(e) = machine.begin_configuration(&adv, Some(&scan_rsp), config::advertising_parameters()) {
        error!("config adv data failed: {}", e);
    }

    machine.run(&GAP_EVENTS).await
}
