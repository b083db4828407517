//! GAP Advertising State
//!
//! Advertising lifecycle states and the two-bit mask tracking which
//! configuration steps are still waiting for their completion event.

/// Maximum device name length (GAP specification limit)
pub const MAX_DEVICE_NAME_LEN: usize = 32;

/// Maximum advertising data length (BLE specification)
pub const MAX_ADV_DATA_LEN: usize = 31;

/// Advertising state enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum AdvState {
    /// No configuration in flight
    Idle = 0,
    /// Advertising data and scan response both pending
    ConfiguringBoth = 1,
    /// Exactly one configuration step pending
    ConfiguringOne = 2,
    /// Configuration done, start command issued
    ReadyToAdvertise = 3,
    /// Start acknowledged successfully
    Advertising = 4,
    /// Start (or a submission) failed; nothing is retried
    AdvertisingFailed = 5,
    /// Stop acknowledged successfully
    Stopped = 6,
}

impl AdvState {
    /// Configuring state matching the number of pending steps
    pub fn configuring(pending: PendingConfigMask) -> Self {
        match pending.count() {
            0 => AdvState::ReadyToAdvertise,
            1 => AdvState::ConfiguringOne,
            _ => AdvState::ConfiguringBoth,
        }
    }

    pub fn is_configuring(self) -> bool {
        matches!(self, AdvState::ConfiguringBoth | AdvState::ConfiguringOne)
    }

    /// States from which a fresh configuration cycle may begin
    pub fn accepts_configuration(self) -> bool {
        matches!(self, AdvState::Idle | AdvState::Stopped | AdvState::AdvertisingFailed)
    }
}

/// Pending configuration steps (bit-packed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingConfigMask(u8);

impl PendingConfigMask {
    pub const EMPTY: Self = Self(0);
    pub const ADV_DATA_PENDING: Self = Self(1 << 0);
    pub const SCAN_RSP_PENDING: Self = Self(1 << 1);
    pub const BOTH: Self = Self(Self::ADV_DATA_PENDING.0 | Self::SCAN_RSP_PENDING.0);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, step: Self) -> bool {
        (self.0 & step.0) == step.0 && step.0 != 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub fn insert(&mut self, step: Self) {
        self.0 |= step.0;
    }

    /// Clear `step`, returning whether it was pending
    pub fn clear(&mut self, step: Self) -> bool {
        let was_pending = self.contains(step);
        self.0 &= !step.0;
        was_pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_size() {
        assert_eq!(core::mem::size_of::<PendingConfigMask>(), 1);
    }

    #[test]
    fn test_mask_clears_independently() {
        let mut mask = PendingConfigMask::BOTH;
        assert_eq!(mask.count(), 2);

        assert!(mask.clear(PendingConfigMask::SCAN_RSP_PENDING));
        assert!(mask.contains(PendingConfigMask::ADV_DATA_PENDING));
        assert!(!mask.contains(PendingConfigMask::SCAN_RSP_PENDING));

        // Second clear of the same bit is a no-op
        assert!(!mask.clear(PendingConfigMask::SCAN_RSP_PENDING));
        assert_eq!(mask, PendingConfigMask::ADV_DATA_PENDING);

        assert!(mask.clear(PendingConfigMask::ADV_DATA_PENDING));
        assert!(mask.is_empty());
    }

    #[test]
    fn test_empty_mask_contains_nothing() {
        assert!(!PendingConfigMask::BOTH.contains(PendingConfigMask::EMPTY));
        assert!(!PendingConfigMask::EMPTY.contains(PendingConfigMask::ADV_DATA_PENDING));
    }

    #[test]
    fn test_configuring_state_from_mask() {
        assert_eq!(AdvState::configuring(PendingConfigMask::BOTH), AdvState::ConfiguringBoth);
        assert_eq!(
            AdvState::configuring(PendingConfigMask::SCAN_RSP_PENDING),
            AdvState::ConfiguringOne
        );
        assert_eq!(AdvState::configuring(PendingConfigMask::EMPTY), AdvState::ReadyToAdvertise);
    }

    #[test]
    fn test_states_accepting_configuration() {
        assert!(AdvState::Idle.accepts_configuration());
        assert!(AdvState::Stopped.accepts_configuration());
        assert!(AdvState::AdvertisingFailed.accepts_configuration());
        assert!(!AdvState::ConfiguringOne.accepts_configuration());
        assert!(!AdvState::Advertising.accepts_configuration());
    }
}
