//! Payload construction and AD encoding tests

use nrf52820_s140_advertiser::ble::ad;
use nrf52820_s140_advertiser::ble::payload::{AdvertisingPayload, ServiceUuid};
use nrf52820_s140_advertiser::config;
use nrf52820_s140_advertiser::error::ConfigError;
use proptest::prelude::*;

#[test]
fn test_firmware_advertisement_bytes() {
    let payload = config::advertising_payload().unwrap();
    let data = ad::encode(&payload, Some(config::DEVICE_NAME), config::TX_POWER_DBM).unwrap();

    assert_eq!(
        &data[..],
        &[
            0x02, 0x01, 0x06, // flags
            0x05, 0x03, 0xEE, 0x00, 0xFF, 0x00, // 16-bit services
            0x02, 0x0a, 0x00, // tx power
            0x05, 0x12, 0x20, 0x00, 0x40, 0x00, // interval range
            0x0a, 0x09, b'B', b'L', b'E', b'_', b'S', b'T', b'A', b'R', b'T', // full name
        ]
    );
}

#[test]
fn test_seventeen_byte_uuid_rejected() {
    let result = AdvertisingPayload::builder().service_uuid_bytes(&[0u8; 17]).build();
    assert_eq!(result, Err(ConfigError::InvalidUuidLength(17)));
}

#[test]
fn test_inverted_interval_rejected() {
    let result = AdvertisingPayload::builder().interval(0x40, 0x20).build();
    assert_eq!(result, Err(ConfigError::IntervalOrder { min: 0x40, max: 0x20 }));
}

#[test]
fn test_long_name_shortened() {
    let payload = AdvertisingPayload::builder()
        .include_name(true)
        .manufacturer_data(&[0xFF, 0xFF, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10])
        .build()
        .unwrap();

    let data = ad::encode(&payload, Some("a-rather-long-device-name"), 0).unwrap();
    assert_eq!(data.len(), 31);
    assert_eq!(&data[14..16], &[16, 0x08]);
    assert_eq!(&data[16..], b"a-rather-long-d");
}

proptest! {
    #[test]
    fn prop_encoded_payload_fits(
        name in "[a-zA-Z0-9_]{0,32}",
        manufacturer in prop::collection::vec(any::<u8>(), 0..20),
        short_uuids in prop::collection::vec(any::<u16>(), 0..4),
        tx_power in any::<i8>(),
    ) {
        let mut builder = AdvertisingPayload::builder()
            .include_name(true)
            .include_tx_power(true);
        if !manufacturer.is_empty() {
            builder = builder.manufacturer_data(&manufacturer);
        }
        for uuid in short_uuids {
            builder = builder.service_uuid(ServiceUuid::Uuid16(uuid));
        }

        let Ok(payload) = builder.build() else {
            return Ok(());
        };
        if let Ok(data) = ad::encode(&payload, Some(&name), tx_power) {
            prop_assert!(data.len() <= 31);
            // Every AD structure's length byte walks exactly to the end
            let mut at = 0;
            while at < data.len() {
                prop_assert!(data[at] >= 1);
                at += usize::from(data[at]) + 1;
            }
            prop_assert_eq!(at, data.len());
        }
    }
}
