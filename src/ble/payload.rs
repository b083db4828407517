//! Advertising Payload Builder
//!
//! Assembles the advertising data (flags, service UUIDs, name/power
//! inclusion, interval hints) handed to the host stack's "set advertising
//! data" operation. Building is pure; submission is up to the caller.

use core::ops::BitOr;

use heapless::Vec;

use crate::ble::gap_state::MAX_ADV_DATA_LEN;
use crate::error::ConfigError;

/// Maximum number of service UUIDs carried by one payload
pub const MAX_SERVICE_UUIDS: usize = 4;

/// Advertising flags (AD type 0x01)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvFlags(u8);

impl AdvFlags {
    pub const LIMITED_DISCOVERY: Self = Self(1 << 0);
    pub const GENERAL_DISCOVERY: Self = Self(1 << 1);
    pub const BREDR_NOT_SUPPORTED: Self = Self(1 << 2);
    pub const DUAL_MODE_CONTROLLER: Self = Self(1 << 3);
    pub const DUAL_MODE_HOST: Self = Self(1 << 4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl BitOr for AdvFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Service UUID in one of the three Bluetooth widths
///
/// 128-bit values are stored least significant byte first, as sent on air.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceUuid {
    Uuid16(u16),
    Uuid32(u32),
    Uuid128([u8; 16]),
}

impl ServiceUuid {
    /// Bluetooth Base UUID 00000000-0000-1000-8000-00805F9B34FB, LSB first
    pub const BASE_UUID: [u8; 16] = [
        0xfb, 0x34, 0x9b, 0x5f, 0x80, 0x00, 0x00, 0x80, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    /// Parse a little-endian UUID of 2, 4 or 16 bytes
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        match *bytes {
            [a, b] => Ok(ServiceUuid::Uuid16(u16::from_le_bytes([a, b]))),
            [a, b, c, d] => Ok(ServiceUuid::Uuid32(u32::from_le_bytes([a, b, c, d]))),
            _ => {
                let full: [u8; 16] = bytes
                    .try_into()
                    .map_err(|_| ConfigError::InvalidUuidLength(bytes.len()))?;
                Ok(ServiceUuid::Uuid128(full))
            }
        }
    }

    /// Width on air in bytes
    pub const fn byte_len(&self) -> usize {
        match self {
            ServiceUuid::Uuid16(_) => 2,
            ServiceUuid::Uuid32(_) => 4,
            ServiceUuid::Uuid128(_) => 16,
        }
    }

    /// Little-endian bytes as sent on air
    pub fn to_le_bytes(&self) -> Vec<u8, 16> {
        let mut out = Vec::new();
        // Capacity is 16, every variant fits
        let _ = match self {
            ServiceUuid::Uuid16(v) => out.extend_from_slice(&v.to_le_bytes()),
            ServiceUuid::Uuid32(v) => out.extend_from_slice(&v.to_le_bytes()),
            ServiceUuid::Uuid128(v) => out.extend_from_slice(v),
        };
        out
    }

    /// Compress a 128-bit UUID built on the Base UUID to 16 or 32 bits
    pub fn shortened(self) -> Self {
        let ServiceUuid::Uuid128(full) = self else {
            return self;
        };
        if full[..12] != Self::BASE_UUID[..12] {
            return self;
        }

        let value = u32::from_le_bytes([full[12], full[13], full[14], full[15]]);
        match u16::try_from(value) {
            Ok(short) => ServiceUuid::Uuid16(short),
            Err(_) => ServiceUuid::Uuid32(value),
        }
    }
}

/// Static advertising payload, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingPayload {
    flags: AdvFlags,
    include_name: bool,
    include_tx_power: bool,
    interval_min: u16,
    interval_max: u16,
    appearance: u16,
    manufacturer_data: Option<Vec<u8, MAX_ADV_DATA_LEN>>,
    service_data: Option<Vec<u8, MAX_ADV_DATA_LEN>>,
    service_uuids: Vec<ServiceUuid, MAX_SERVICE_UUIDS>,
    set_scan_rsp: bool,
}

impl AdvertisingPayload {
    pub fn builder() -> AdvertisingPayloadBuilder {
        AdvertisingPayloadBuilder::new()
    }

    pub fn flags(&self) -> AdvFlags {
        self.flags
    }

    pub fn include_name(&self) -> bool {
        self.include_name
    }

    pub fn include_tx_power(&self) -> bool {
        self.include_tx_power
    }

    /// Preferred interval bounds; `(0, 0)` when no hint is given
    pub fn interval(&self) -> (u16, u16) {
        (self.interval_min, self.interval_max)
    }

    pub fn appearance(&self) -> u16 {
        self.appearance
    }

    pub fn manufacturer_data(&self) -> Option<&[u8]> {
        self.manufacturer_data.as_deref()
    }

    pub fn service_data(&self) -> Option<&[u8]> {
        self.service_data.as_deref()
    }

    pub fn service_uuids(&self) -> &[ServiceUuid] {
        &self.service_uuids
    }

    /// Whether this payload is the scan response rather than the advertisement
    pub fn is_scan_response(&self) -> bool {
        self.set_scan_rsp
    }
}

/// Builder for [`AdvertisingPayload`]
///
/// Setters never fail; the first problem is remembered and returned by
/// [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct AdvertisingPayloadBuilder {
    payload: AdvertisingPayload,
    error: Option<ConfigError>,
}

impl AdvertisingPayloadBuilder {
    pub fn new() -> Self {
        Self {
            payload: AdvertisingPayload {
                flags: AdvFlags::empty(),
                include_name: false,
                include_tx_power: false,
                interval_min: 0,
                interval_max: 0,
                appearance: 0,
                manufacturer_data: None,
                service_data: None,
                service_uuids: Vec::new(),
                set_scan_rsp: false,
            },
            error: None,
        }
    }

    fn fail(mut self, err: ConfigError) -> Self {
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }

    pub fn flags(mut self, flags: AdvFlags) -> Self {
        self.payload.flags = flags;
        self
    }

    pub fn include_name(mut self, include: bool) -> Self {
        self.payload.include_name = include;
        self
    }

    pub fn include_tx_power(mut self, include: bool) -> Self {
        self.payload.include_tx_power = include;
        self
    }

    /// Preferred interval bounds in controller units
    pub fn interval(mut self, min: u16, max: u16) -> Self {
        self.payload.interval_min = min;
        self.payload.interval_max = max;
        self
    }

    pub fn appearance(mut self, appearance: u16) -> Self {
        self.payload.appearance = appearance;
        self
    }

    /// Manufacturer specific data, company identifier included
    pub fn manufacturer_data(mut self, data: &[u8]) -> Self {
        match Vec::from_slice(data) {
            Ok(data) => {
                self.payload.manufacturer_data = Some(data);
                self
            }
            Err(_) => self.fail(ConfigError::CapacityExceeded),
        }
    }

    /// Service data, service UUID included
    pub fn service_data(mut self, data: &[u8]) -> Self {
        match Vec::from_slice(data) {
            Ok(data) => {
                self.payload.service_data = Some(data);
                self
            }
            Err(_) => self.fail(ConfigError::CapacityExceeded),
        }
    }

    pub fn service_uuid(mut self, uuid: ServiceUuid) -> Self {
        match self.payload.service_uuids.push(uuid) {
            Ok(()) => self,
            Err(_) => self.fail(ConfigError::CapacityExceeded),
        }
    }

    /// Add a service UUID given as little-endian bytes
    pub fn service_uuid_bytes(self, bytes: &[u8]) -> Self {
        match ServiceUuid::from_le_bytes(bytes) {
            Ok(uuid) => self.service_uuid(uuid),
            Err(err) => self.fail(err),
        }
    }

    /// Mark the payload as the scan response
    pub fn scan_response(mut self, set_scan_rsp: bool) -> Self {
        self.payload.set_scan_rsp = set_scan_rsp;
        self
    }

    pub fn build(self) -> Result<AdvertisingPayload, ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let (min, max) = self.payload.interval();
        if min > max {
            return Err(ConfigError::IntervalOrder { min, max });
        }

        Ok(self.payload)
    }
}

impl Default for AdvertisingPayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}
