//! AD Structure Encoding
//!
//! Serializes an [`AdvertisingPayload`] into the `[len][type][data]...` AD
//! structures of a legacy advertising PDU. Host stacks that take a payload
//! description do this themselves; backends that take raw bytes (the
//! SoftDevice) use this encoder.

use heapless::Vec;

use crate::ble::gap_state::MAX_ADV_DATA_LEN;
use crate::ble::payload::{AdvertisingPayload, ServiceUuid};
use crate::error::ConfigError;

/// Raw advertising or scan response data
pub type AdvBytes = Vec<u8, MAX_ADV_DATA_LEN>;

/// AD type identifiers used by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdType(u8);

impl AdType {
    pub const FLAGS: AdType = AdType(0x01);
    pub const COMPLETE_16_SERVICE_LIST: AdType = AdType(0x03);
    pub const COMPLETE_32_SERVICE_LIST: AdType = AdType(0x05);
    pub const COMPLETE_128_SERVICE_LIST: AdType = AdType(0x07);
    pub const SHORT_NAME: AdType = AdType(0x08);
    pub const FULL_NAME: AdType = AdType(0x09);
    pub const TXPOWER_LEVEL: AdType = AdType(0x0a);
    pub const PERIPHERAL_CONNECTION_INTERVAL_RANGE: AdType = AdType(0x12);
    pub const SERVICE_DATA_16: AdType = AdType(0x16);
    pub const APPEARANCE: AdType = AdType(0x19);
    pub const MANUFACTURER_SPECIFIC_DATA: AdType = AdType(0xff);

    pub const fn to_u8(self) -> u8 {
        self.0
    }
}

/// Append one AD structure
fn push_field(out: &mut AdvBytes, ty: AdType, data: &[u8]) -> Result<(), ConfigError> {
    if out.len() + 2 + data.len() > MAX_ADV_DATA_LEN {
        return Err(ConfigError::PayloadTooLarge);
    }
    // Room checked above
    let _ = out.push(data.len() as u8 + 1);
    let _ = out.push(ty.to_u8());
    let _ = out.extend_from_slice(data);
    Ok(())
}

/// Append the complete list of service UUIDs of one width
fn push_uuid_list(
    out: &mut AdvBytes,
    ty: AdType,
    width: usize,
    uuids: &[ServiceUuid],
) -> Result<(), ConfigError> {
    let mut list: Vec<u8, MAX_ADV_DATA_LEN> = Vec::new();
    for uuid in uuids.iter().map(|u| u.shortened()).filter(|u| u.byte_len() == width) {
        list.extend_from_slice(&uuid.to_le_bytes())
            .map_err(|_| ConfigError::PayloadTooLarge)?;
    }
    if list.is_empty() {
        return Ok(());
    }
    push_field(out, ty, &list)
}

/// Encode `payload` into AD structures
///
/// Field order: flags, service UUID lists (16, 32, 128-bit), tx power,
/// interval range, appearance, service data, manufacturer data, name.
/// Base UUIDs are sent in their shortened form. The name goes last and is
/// sent shortened when the full name does not fit.
pub fn encode(payload: &AdvertisingPayload, name: Option<&str>, tx_power: i8) -> Result<AdvBytes, ConfigError> {
    let mut out = AdvBytes::new();

    if !payload.flags().is_empty() {
        push_field(&mut out, AdType::FLAGS, &[payload.flags().bits()])?;
    }

    let uuids = payload.service_uuids();
    push_uuid_list(&mut out, AdType::COMPLETE_16_SERVICE_LIST, 2, uuids)?;
    push_uuid_list(&mut out, AdType::COMPLETE_32_SERVICE_LIST, 4, uuids)?;
    push_uuid_list(&mut out, AdType::COMPLETE_128_SERVICE_LIST, 16, uuids)?;

    if payload.include_tx_power() {
        push_field(&mut out, AdType::TXPOWER_LEVEL, &[tx_power as u8])?;
    }

    let (min, max) = payload.interval();
    if min != 0 && max != 0 {
        let mut range = [0u8; 4];
        range[..2].copy_from_slice(&min.to_le_bytes());
        range[2..].copy_from_slice(&max.to_le_bytes());
        push_field(&mut out, AdType::PERIPHERAL_CONNECTION_INTERVAL_RANGE, &range)?;
    }

    if payload.appearance() != 0 {
        push_field(&mut out, AdType::APPEARANCE, &payload.appearance().to_le_bytes())?;
    }

    if let Some(data) = payload.service_data() {
        push_field(&mut out, AdType::SERVICE_DATA_16, data)?;
    }

    if let Some(data) = payload.manufacturer_data() {
        push_field(&mut out, AdType::MANUFACTURER_SPECIFIC_DATA, data)?;
    }

    if let Some(name) = name.filter(|n| payload.include_name() && !n.is_empty()) {
        let room = MAX_ADV_DATA_LEN - out.len();
        if name.len() + 2 <= room {
            push_field(&mut out, AdType::FULL_NAME, name.as_bytes())?;
        } else {
            // Shortened names end on a char boundary
            let mut cut = room.saturating_sub(2);
            while !name.is_char_boundary(cut) {
                cut -= 1;
            }
            if cut > 0 {
                push_field(&mut out, AdType::SHORT_NAME, &name.as_bytes()[..cut])?;
            } else {
                debug!("no room left for device name");
            }
        }
    }

    Ok(out)
}
