//! S140 SoftDevice Backend
//!
//! Implements [`HostStack`] and [`RadioController`] over `nrf-softdevice`.
//! The SoftDevice takes raw AD bytes and has no "data set" completion, so
//! set-data submissions are validated by encoding and acknowledged straight
//! into [`GAP_EVENTS`]. Start/stop requests go to [`advertiser_task`], which
//! owns the advertising future and reports its outcome as GAP events.

use core::future::{poll_fn, Future};
use core::pin::pin;
use core::task::Poll;

use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::String;
use nrf_softdevice::ble::peripheral::{self, Config as PeripheralConfig, ConnectableAdvertisement, FilterPolicy};
use nrf_softdevice::ble::TxPower;
use nrf_softdevice::{Config as SdConfig, Softdevice};

use crate::ble::ad::{self, AdvBytes};
use crate::ble::bringup::RadioController;
use crate::ble::events::{AckStatus, EventQueue, GapEvent, EVENT_QUEUE_DEPTH};
use crate::ble::gap_state::MAX_DEVICE_NAME_LEN;
use crate::ble::host::{HostError, HostStack};
use crate::ble::params::{self as adv_params, AdvType, AdvertisingParameters, OwnAddrType};
use crate::ble::payload::AdvertisingPayload;

/// BLE_GAP_EVT_CONNECTED
pub const BLE_GAP_EVT_CONNECTED: u16 = 0x10;

/// Event queue fed by the SoftDevice backend
pub type GapEventQueue = EventQueue<CriticalSectionRawMutex, EVENT_QUEUE_DEPTH>;

/// GAP events from the SoftDevice to the advertising state machine
pub static GAP_EVENTS: GapEventQueue = EventQueue::new();

/// Requests from the host adapter to the advertiser task
enum AdvRequest {
    Start {
        config: PeripheralConfig,
        adv_data: AdvBytes,
        scan_data: AdvBytes,
    },
    Stop,
}

static ADV_REQUESTS: Channel<CriticalSectionRawMutex, AdvRequest, 2> = Channel::new();

fn post(event: GapEvent) {
    if GAP_EVENTS.post(event).is_err() {
        error!("GAP event queue full, dropping {:?}", event);
    }
}

fn filter_policy(policy: adv_params::FilterPolicy) -> FilterPolicy {
    match (policy.filters_scan(), policy.filters_connect()) {
        (false, false) => FilterPolicy::Any,
        (true, false) => FilterPolicy::ScanRequests,
        (false, true) => FilterPolicy::ConnectionRequests,
        (true, true) => FilterPolicy::Both,
    }
}

fn tx_power(dbm: i8) -> TxPower {
    match dbm {
        i8::MIN..=-30 => TxPower::Minus40dBm,
        -29..=-18 => TxPower::Minus20dBm,
        -17..=-14 => TxPower::Minus16dBm,
        -13..=-10 => TxPower::Minus12dBm,
        -9..=-6 => TxPower::Minus8dBm,
        -5..=-2 => TxPower::Minus4dBm,
        -1..=1 => TxPower::ZerodBm,
        _ => TxPower::Plus4dBm,
    }
}

/// [`HostStack`] over the SoftDevice
///
/// Advertises scannable connectable undirected on all primary channels from
/// the identity address the SoftDevice holds. Parameter sets asking for
/// anything else are refused with [`HostError::NOT_SUPPORTED`].
pub struct SoftdeviceHost {
    adv_payload: Option<AdvertisingPayload>,
    scan_payload: Option<AdvertisingPayload>,
    device_name: String<MAX_DEVICE_NAME_LEN>,
    tx_power: i8,
    identity_addr_type: OwnAddrType,
}

impl SoftdeviceHost {
    /// `identity_addr_type` is the type of the address the SoftDevice was
    /// enabled with (random static unless a public address is programmed)
    pub fn new(tx_power: i8, identity_addr_type: OwnAddrType) -> Self {
        Self {
            adv_payload: None,
            scan_payload: None,
            device_name: String::new(),
            tx_power,
            identity_addr_type,
        }
    }

    fn encode(&self, payload: Option<&AdvertisingPayload>) -> Result<AdvBytes, HostError> {
        match payload {
            Some(payload) => ad::encode(payload, Some(&self.device_name), self.tx_power)
                .map_err(|_| HostError::INVALID_LENGTH),
            None => Ok(AdvBytes::new()),
        }
    }
}

impl HostStack for SoftdeviceHost {
    fn submit_advertising_data(&mut self, payload: &AdvertisingPayload) -> Result<(), HostError> {
        self.encode(Some(payload))?;
        self.adv_payload = Some(payload.clone());
        post(GapEvent::AdvDataSetComplete(AckStatus::Success));
        Ok(())
    }

    fn submit_scan_response_data(&mut self, payload: &AdvertisingPayload) -> Result<(), HostError> {
        self.encode(Some(payload))?;
        self.scan_payload = Some(payload.clone());
        post(GapEvent::ScanRspSetComplete(AckStatus::Success));
        Ok(())
    }

    fn start_advertising(&mut self, params: &AdvertisingParameters) -> Result<(), HostError> {
        params.ensure_supported(
            AdvType::ConnectableUndirected,
            self.identity_addr_type,
            adv_params::ChannelMap::ALL,
        )?;

        // The SoftDevice takes one interval; the lower bound lies in the range
        let config = PeripheralConfig {
            interval: u32::from(params.interval_min),
            tx_power: tx_power(self.tx_power),
            filter_policy: filter_policy(params.filter_policy),
            ..Default::default()
        };
        let request = AdvRequest::Start {
            config,
            adv_data: self.encode(self.adv_payload.as_ref())?,
            scan_data: self.encode(self.scan_payload.as_ref())?,
        };
        ADV_REQUESTS.try_send(request).map_err(|_| HostError::BUSY)
    }

    fn stop_advertising(&mut self) -> Result<(), HostError> {
        ADV_REQUESTS.try_send(AdvRequest::Stop).map_err(|_| HostError::BUSY)
    }

    fn set_device_name(&mut self, name: &str) -> Result<(), HostError> {
        self.device_name = String::try_from(name).map_err(|_| HostError::INVALID_LENGTH)?;
        Ok(())
    }
}

/// Wait for a stop request, refusing starts while advertising
async fn stop_requested() {
    loop {
        match ADV_REQUESTS.receive().await {
            AdvRequest::Stop => return,
            AdvRequest::Start { .. } => {
                warn!("start requested while already advertising");
                post(GapEvent::AdvStartComplete(AckStatus::Failed(HostError::INVALID_STATE.code() as u8)));
            }
        }
    }
}

/// Runs advertising sets on behalf of [`SoftdeviceHost`]
#[embassy_executor::task]
pub async fn advertiser_task(sd: &'static Softdevice) -> ! {
    info!("Starting advertiser task...");

    loop {
        let (config, adv_data, scan_data) = match ADV_REQUESTS.receive().await {
            AdvRequest::Start {
                config,
                adv_data,
                scan_data,
            } => (config, adv_data, scan_data),
            AdvRequest::Stop => {
                warn!("stop requested while not advertising");
                post(GapEvent::AdvStopComplete(AckStatus::Failed(HostError::INVALID_STATE.code() as u8)));
                continue;
            }
        };

        let adv = ConnectableAdvertisement::ScannableUndirected {
            adv_data: &adv_data,
            scan_data: &scan_data,
        };
        let mut advertising = pin!(peripheral::advertise_connectable(sd, adv, &config));

        // The SoftDevice configures and starts the set on the first poll
        match poll_fn(|cx| Poll::Ready(advertising.as_mut().poll(cx))).await {
            Poll::Ready(Err(e)) => {
                error!("Advertising start failed: {:?}", defmt::Debug2Format(&e));
                post(GapEvent::AdvStartComplete(AckStatus::Failed(HostError::INTERNAL.code() as u8)));
                continue;
            }
            Poll::Ready(Ok(conn)) => {
                post(GapEvent::AdvStartComplete(AckStatus::Success));
                info!("connected on first poll, handle {:?}", conn.handle());
                post(GapEvent::Other(BLE_GAP_EVT_CONNECTED));
                post(GapEvent::AdvStopComplete(AckStatus::Success));
                continue;
            }
            Poll::Pending => post(GapEvent::AdvStartComplete(AckStatus::Success)),
        }

        match select(advertising, stop_requested()).await {
            Either::First(Ok(conn)) => {
                // Connections are not managed here; the link is released on drop
                info!("connection established, handle {:?}", conn.handle());
                post(GapEvent::Other(BLE_GAP_EVT_CONNECTED));
            }
            Either::First(Err(e)) => {
                info!("advertising ended: {:?}", defmt::Debug2Format(&e));
            }
            Either::Second(()) => {
                debug!("advertising set dropped on stop request");
            }
        }
        post(GapEvent::AdvStopComplete(AckStatus::Success));
    }
}

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// [`RadioController`] over the SoftDevice
pub struct SoftdeviceRadio {
    spawner: Spawner,
    config: SdConfig,
    sd: Option<&'static Softdevice>,
}

impl SoftdeviceRadio {
    pub fn new(spawner: Spawner, config: SdConfig) -> Self {
        Self {
            spawner,
            config,
            sd: None,
        }
    }

    /// Enabled SoftDevice, once the controller is up
    pub fn softdevice(&self) -> Option<&'static Softdevice> {
        self.sd
    }
}

impl RadioController for SoftdeviceRadio {
    /// The S140 has no separate controller init step; this checks that the
    /// SoftDevice config can host one advertising peripheral before enabling
    fn init_controller(&mut self) -> Result<(), HostError> {
        // Peripheral role needs a connection configuration and one advertising set
        match (&self.config.conn_gap, &self.config.gap_role_count) {
            (Some(_), Some(roles)) if roles.adv_set_count >= 1 && roles.periph_role_count >= 1 => Ok(()),
            _ => Err(HostError::INVALID_PARAM),
        }
    }

    fn enable_controller(&mut self) -> Result<(), HostError> {
        // Softdevice::enable panics on failure; it does not return an error
        let sd: &'static Softdevice = Softdevice::enable(&self.config);
        self.sd = Some(sd);
        info!("SoftDevice enabled successfully!");
        Ok(())
    }

    fn init_host(&mut self) -> Result<(), HostError> {
        let sd = self.sd.ok_or(HostError::INVALID_STATE)?;
        self.spawner.spawn(softdevice_task(sd)).map_err(|_| HostError::NO_MEM)
    }

    fn enable_host(&mut self) -> Result<(), HostError> {
        let sd = self.sd.ok_or(HostError::INVALID_STATE)?;
        self.spawner.spawn(advertiser_task(sd)).map_err(|_| HostError::NO_MEM)
    }
}
