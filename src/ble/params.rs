//! Advertising Parameters
//!
//! Static parameter set supplied once to "start advertising".

use crate::ble::host::HostError;
use crate::error::ConfigError;

/// Shortest legacy advertising interval (0.625ms units, 20ms)
pub const ADV_INTERVAL_MIN: u16 = 0x0020;

/// Longest legacy advertising interval (0.625ms units, 10.24s)
pub const ADV_INTERVAL_MAX: u16 = 0x4000;

/// Advertising PDU type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdvType {
    ConnectableUndirected = 0x00,
    ConnectableDirectedHighDuty = 0x01,
    ScannableUndirected = 0x02,
    NonConnectableUndirected = 0x03,
    ConnectableDirectedLowDuty = 0x04,
}

/// Own address type used while advertising
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum OwnAddrType {
    Public = 0x00,
    Random = 0x01,
    RpaPublic = 0x02,
    RpaRandom = 0x03,
}

/// Advertising filter policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FilterPolicy {
    ScanAnyConnAny = 0x00,
    ScanWhitelistConnAny = 0x01,
    ScanAnyConnWhitelist = 0x02,
    ScanWhitelistConnWhitelist = 0x03,
}

impl FilterPolicy {
    /// Scan requests only from the whitelist
    pub const fn filters_scan(self) -> bool {
        matches!(self, Self::ScanWhitelistConnAny | Self::ScanWhitelistConnWhitelist)
    }

    /// Connection requests only from the whitelist
    pub const fn filters_connect(self) -> bool {
        matches!(self, Self::ScanAnyConnWhitelist | Self::ScanWhitelistConnWhitelist)
    }
}

/// Primary advertising channels in use (bit-packed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelMap(u8);

impl ChannelMap {
    pub const CH37: Self = Self(1 << 0);
    pub const CH38: Self = Self(1 << 1);
    pub const CH39: Self = Self(1 << 2);
    pub const ALL: Self = Self(0b111);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Advertising parameters (matches the controller's LE Set Advertising Parameters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingParameters {
    pub interval_min: u16, // 0.625ms units
    pub interval_max: u16, // 0.625ms units
    pub adv_type: AdvType,
    pub own_addr_type: OwnAddrType,
    pub channel_map: ChannelMap,
    pub filter_policy: FilterPolicy,
}

impl AdvertisingParameters {
    pub const DEFAULT: Self = Self {
        interval_min: 0x20, // 20ms
        interval_max: 0x40, // 40ms
        adv_type: AdvType::ConnectableUndirected,
        own_addr_type: OwnAddrType::Public,
        channel_map: ChannelMap::ALL,
        filter_policy: FilterPolicy::ScanAnyConnAny,
    };

    /// Check interval bounds and channel map
    pub fn validate(&self) -> Result<(), ConfigError> {
        for interval in [self.interval_min, self.interval_max] {
            if !(ADV_INTERVAL_MIN..=ADV_INTERVAL_MAX).contains(&interval) {
                return Err(ConfigError::IntervalRange(interval));
            }
        }
        if self.interval_min > self.interval_max {
            return Err(ConfigError::IntervalOrder {
                min: self.interval_min,
                max: self.interval_max,
            });
        }
        if self.channel_map.is_empty() {
            return Err(ConfigError::EmptyChannelMap);
        }
        Ok(())
    }

    /// Refuse a set a backend can only run as `adv_type` from `own_addr_type`
    /// on `channel_map`, instead of advertising with different settings
    pub fn ensure_supported(
        &self,
        adv_type: AdvType,
        own_addr_type: OwnAddrType,
        channel_map: ChannelMap,
    ) -> Result<(), HostError> {
        if self.adv_type != adv_type {
            warn!("advertising type {:?} not supported", self.adv_type);
            return Err(HostError::NOT_SUPPORTED);
        }
        if self.own_addr_type != own_addr_type {
            warn!("own address type {:?} not supported", self.own_addr_type);
            return Err(HostError::NOT_SUPPORTED);
        }
        if self.channel_map != channel_map {
            warn!("channel map {:x} not supported", self.channel_map.bits());
            return Err(HostError::NOT_SUPPORTED);
        }
        Ok(())
    }
}

impl Default for AdvertisingParameters {
    fn default() -> Self {
        Self::DEFAULT
    }
}
