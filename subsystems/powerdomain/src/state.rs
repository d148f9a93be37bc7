//! Power states, state sets, and capability flags.
//!
//! A power domain's high-level state is one of four values; which of them a
//! particular domain (or memory bank) supports is described by a
//! [`PowerStateSet`] bitmap in its descriptor. The numeric register encoding
//! of these states lives at the hardware boundary (`hw`), not here.

use core::fmt;

use bitflags::bitflags;

// =============================================================================
// POWER STATE
// =============================================================================

/// High-level power state of a domain or memory bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PowerState {
    /// Power removed, all state lost
    Off,
    /// Reduced power, state partially preserved
    Retention,
    /// Powered but clock-stopped
    Inactive,
    /// Fully powered
    On,
}

impl PowerState {
    /// Short lowercase name, as used in diagnostics listings
    pub const fn name(self) -> &'static str {
        match self {
            PowerState::Off => "off",
            PowerState::Retention => "ret",
            PowerState::Inactive => "inactive",
            PowerState::On => "on",
        }
    }

    /// The single-state [`PowerStateSet`] for this state
    pub const fn as_set(self) -> PowerStateSet {
        match self {
            PowerState::Off => PowerStateSet::OFF,
            PowerState::Retention => PowerStateSet::RET,
            PowerState::Inactive => PowerStateSet::INACTIVE,
            PowerState::On => PowerStateSet::ON,
        }
    }

    /// Whether this state counts as a low-power state (toward OFF)
    pub const fn is_low_power(self) -> bool {
        matches!(self, PowerState::Off | PowerState::Retention)
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// POWER STATE SET
// =============================================================================

bitflags! {
    /// Bitmap of supported power states
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PowerStateSet: u8 {
        /// OFF supported
        const OFF      = 1 << 0;
        /// RETENTION supported
        const RET      = 1 << 1;
        /// INACTIVE supported
        const INACTIVE = 1 << 2;
        /// ON supported
        const ON       = 1 << 3;
    }
}

impl PowerStateSet {
    /// OFF and ON
    pub const OFF_ON: Self = Self::OFF.union(Self::ON);
    /// OFF and RETENTION
    pub const OFF_RET: Self = Self::OFF.union(Self::RET);
    /// RETENTION and ON
    pub const RET_ON: Self = Self::RET.union(Self::ON);
    /// OFF, RETENTION and ON
    pub const OFF_RET_ON: Self = Self::OFF_RET.union(Self::ON);
    /// INACTIVE and ON
    pub const INA_ON: Self = Self::INACTIVE.union(Self::ON);
    /// All four states
    pub const OFF_RET_INA_ON: Self = Self::OFF_RET.union(Self::INA_ON);

    /// Whether `state` is a member of this set
    pub const fn supports(self, state: PowerState) -> bool {
        self.contains(state.as_set())
    }

    /// The deepest (lowest-power) member of the set, if any
    pub fn deepest(self) -> Option<PowerState> {
        [
            PowerState::Off,
            PowerState::Retention,
            PowerState::Inactive,
            PowerState::On,
        ]
        .into_iter()
        .find(|&s| self.supports(s))
    }

    /// The deepest low-power member (OFF or RETENTION), if any
    pub fn deepest_low_power(self) -> Option<PowerState> {
        [PowerState::Off, PowerState::Retention]
            .into_iter()
            .find(|&s| self.supports(s))
    }
}

// =============================================================================
// LOGIC STATE
// =============================================================================

/// Logic-retention sub-state during RETENTION
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicState {
    /// Logic state lost (registers/flip-flops powered off)
    Lost,
    /// Logic state preserved at low power
    Retained,
}

impl LogicState {
    /// The power state the logic rail is held in for this sub-state
    pub const fn as_power_state(self) -> PowerState {
        match self {
            LogicState::Lost => PowerState::Off,
            LogicState::Retained => PowerState::Retention,
        }
    }
}

impl fmt::Display for LogicState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicState::Lost => write!(f, "logic-lost"),
            LogicState::Retained => write!(f, "logic-retained"),
        }
    }
}

// =============================================================================
// CONFIRMED STATE
// =============================================================================

/// Hardware-confirmed state of a domain or bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmedState {
    /// Last readback decoded to this state
    Known(PowerState),
    /// A transition timed out; the next successful transition or resync
    /// clears this
    Unconfirmed,
    /// Never successfully read back; the domain is excluded from
    /// transitions until an explicit resync
    Unknown,
}

impl ConfirmedState {
    /// The confirmed power state, if any
    pub const fn known(self) -> Option<PowerState> {
        match self {
            ConfirmedState::Known(s) => Some(s),
            _ => None,
        }
    }

    /// Whether a confirmed state is available
    pub const fn is_known(self) -> bool {
        matches!(self, ConfirmedState::Known(_))
    }
}

impl fmt::Display for ConfirmedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmedState::Known(s) => write!(f, "{}", s),
            ConfirmedState::Unconfirmed => write!(f, "unconfirmed"),
            ConfirmedState::Unknown => write!(f, "unknown"),
        }
    }
}

// =============================================================================
// DOMAIN FLAGS
// =============================================================================

bitflags! {
    /// Static capability flags of a power domain
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DomainFlags: u8 {
        /// Hardware save-and-restore support
        const HAS_HDWR_SAR            = 1 << 0;
        /// MPU-specific errata handling required
        const HAS_MPU_QUIRK           = 1 << 1;
        /// Low-power state changes require the handshake protocol
        const HAS_LOWPOWERSTATECHANGE = 1 << 2;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_membership() {
        let set = PowerStateSet::OFF_RET_ON;

        assert!(set.supports(PowerState::Off));
        assert!(set.supports(PowerState::Retention));
        assert!(set.supports(PowerState::On));
        assert!(!set.supports(PowerState::Inactive));
    }

    #[test]
    fn test_deepest() {
        assert_eq!(
            PowerStateSet::OFF_RET_ON.deepest(),
            Some(PowerState::Off)
        );
        assert_eq!(PowerStateSet::RET_ON.deepest(), Some(PowerState::Retention));
        assert_eq!(PowerStateSet::ON.deepest(), Some(PowerState::On));
        assert_eq!(PowerStateSet::empty().deepest(), None);
    }

    #[test]
    fn test_deepest_low_power() {
        assert_eq!(
            PowerStateSet::OFF_RET_ON.deepest_low_power(),
            Some(PowerState::Off)
        );
        assert_eq!(
            PowerStateSet::RET_ON.deepest_low_power(),
            Some(PowerState::Retention)
        );
        assert_eq!(PowerStateSet::ON.deepest_low_power(), None);
        assert_eq!(PowerStateSet::INA_ON.deepest_low_power(), None);
    }

    #[test]
    fn test_low_power_states() {
        assert!(PowerState::Off.is_low_power());
        assert!(PowerState::Retention.is_low_power());
        assert!(!PowerState::Inactive.is_low_power());
        assert!(!PowerState::On.is_low_power());
    }

    #[test]
    fn test_confirmed_state() {
        assert_eq!(
            ConfirmedState::Known(PowerState::On).known(),
            Some(PowerState::On)
        );
        assert_eq!(ConfirmedState::Unconfirmed.known(), None);
        assert!(!ConfirmedState::Unknown.is_known());
    }
}
