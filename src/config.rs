//! Firmware Advertising Configuration
//!
//! The payloads and parameters the firmware advertises with at boot.

use crate::ble::advertising::{AdvertiserConfig, DEFAULT_DEVICE_NAME};
use crate::ble::params::{AdvertisingParameters, OwnAddrType};
use crate::ble::payload::{AdvFlags, AdvertisingPayload, ServiceUuid};
use crate::error::ConfigError;

/// Device name advertised and set on the host stack
pub const DEVICE_NAME: &str = DEFAULT_DEVICE_NAME;

/// Radiated power advertised in the tx power field (dBm)
pub const TX_POWER_DBM: i8 = 0;

/// Factory address of the nRF52820 (FICR DEVICEADDR, random static)
pub const OWN_ADDR_TYPE: OwnAddrType = OwnAddrType::Random;

/// Service UUIDs, LSB first: Base UUID forms of 0x00EE and 0x00FF
pub const SERVICE_UUIDS: [[u8; 16]; 2] = [
    [0xfb, 0x34, 0x9b, 0x5f, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0xEE, 0x00, 0x00, 0x00],
    [0xfb, 0x34, 0x9b, 0x5f, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00],
];

/// Manufacturer data for the scan response (0xFFFF: no assigned company)
pub const MANUFACTURER_DATA: [u8; 4] = [0xFF, 0xFF, 0x01, 0x00];

/// Primary advertisement
pub fn advertising_payload() -> Result<AdvertisingPayload, ConfigError> {
    let mut builder = AdvertisingPayload::builder()
        .flags(AdvFlags::GENERAL_DISCOVERY | AdvFlags::BREDR_NOT_SUPPORTED)
        .include_name(true)
        .include_tx_power(true)
        .interval(0x20, 0x40)
        .appearance(0x00);
    for uuid in SERVICE_UUIDS {
        builder = builder.service_uuid(ServiceUuid::Uuid128(uuid));
    }
    builder.build()
}

/// Scan response
pub fn scan_response_payload() -> Result<AdvertisingPayload, ConfigError> {
    AdvertisingPayload::builder()
        .scan_response(true)
        .manufacturer_data(&MANUFACTURER_DATA)
        .build()
}

pub fn advertising_parameters() -> AdvertisingParameters {
    AdvertisingParameters {
        own_addr_type: OWN_ADDR_TYPE,
        ..AdvertisingParameters::DEFAULT
    }
}

pub fn advertiser_config() -> Result<AdvertiserConfig, ConfigError> {
    AdvertiserConfig::new(DEVICE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::ad;
    use crate::ble::gap_state::MAX_ADV_DATA_LEN;
    use crate::ble::params::{AdvType, ChannelMap};

    #[test]
    fn test_firmware_payloads_fit() {
        let adv = advertising_payload().unwrap();
        let rsp = scan_response_payload().unwrap();

        let adv_bytes = ad::encode(&adv, Some(DEVICE_NAME), TX_POWER_DBM).unwrap();
        let rsp_bytes = ad::encode(&rsp, Some(DEVICE_NAME), TX_POWER_DBM).unwrap();
        assert!(adv_bytes.len() <= MAX_ADV_DATA_LEN);
        assert_eq!(&rsp_bytes[..], &[0x05, 0xff, 0xFF, 0xFF, 0x01, 0x00]);

        // The full name made it in, not a shortened one
        let name = DEVICE_NAME.as_bytes();
        assert_eq!(&adv_bytes[adv_bytes.len() - name.len()..], name);
        assert_eq!(adv_bytes[adv_bytes.len() - name.len() - 1], 0x09);
    }

    #[test]
    fn test_firmware_roles() {
        assert!(!advertising_payload().unwrap().is_scan_response());
        assert!(scan_response_payload().unwrap().is_scan_response());
        assert_eq!(advertising_parameters().validate(), Ok(()));
        assert_eq!(advertising_parameters().own_addr_type, OWN_ADDR_TYPE);
        // What the SoftDevice backend can run
        let params = advertising_parameters();
        assert_eq!(
            params.ensure_supported(AdvType::ConnectableUndirected, OWN_ADDR_TYPE, ChannelMap::ALL),
            Ok(())
        );
        assert_eq!(advertiser_config().unwrap().device_name(), DEVICE_NAME);
    }
}
