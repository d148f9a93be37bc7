//! Power-domain descriptors.
//!
//! A descriptor is the immutable, per-chip description of one power domain:
//! where its control and status registers live, which states it supports,
//! and the bit masks for each of its memory banks. Chip crates build tables
//! of descriptors with [`PowerDomainDesc::builder`] and hand them to the
//! registry at startup; after registration they are never mutated.

use crate::error::{ErrorKind, PwrdmResult};
use crate::state::{DomainFlags, PowerStateSet};
use crate::pwrdm_ensure;

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

/// Maximum number of memory banks per domain
pub const MAX_MEM_BANKS: usize = 5;

// =============================================================================
// MEMORY BANK DESCRIPTOR
// =============================================================================

/// Descriptor for one memory bank within a power domain.
///
/// All masks are full register masks (value bits in place); field positions
/// are derived from the masks at the hardware boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemBankDesc {
    /// Control bits selecting the bank's state while the domain is ON
    pub on_mask: u32,
    /// Control bits selecting the bank's retention state
    pub ret_mask: u32,
    /// Status readback bits for the bank's current state
    pub pwrst_mask: u32,
    /// Status readback bits for the bank's retention state
    pub retst_mask: u32,
    /// States the bank supports while the domain is in RETENTION/OFF
    pub pwrsts_ret: PowerStateSet,
    /// States the bank supports while the domain is ON
    pub pwrsts_on: PowerStateSet,
}

impl MemBankDesc {
    /// Create a bank descriptor from its masks and supported-state sets.
    pub const fn new(
        on_mask: u32,
        ret_mask: u32,
        pwrst_mask: u32,
        retst_mask: u32,
        pwrsts_ret: PowerStateSet,
        pwrsts_on: PowerStateSet,
    ) -> Self {
        Self {
            on_mask,
            ret_mask,
            pwrst_mask,
            retst_mask,
            pwrsts_ret,
            pwrsts_on,
        }
    }
}

// =============================================================================
// POWER DOMAIN DESCRIPTOR
// =============================================================================

/// Immutable description of one power domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerDomainDesc {
    /// Unique domain name
    pub name: String,
    /// Associated voltage domain, by name (not managed here)
    pub voltdm: String,
    /// Register-group offset of the domain's PRM instance
    pub prcm_offs: u32,
    /// Control register offset within the instance
    pub pwrstctrl_offs: u32,
    /// Status register offset within the instance
    pub pwrstst_offs: u32,
    /// Supported high-level power states
    pub pwrsts: PowerStateSet,
    /// Supported logic-retention sub-states (as OFF/RET membership)
    pub pwrsts_logic_ret: PowerStateSet,
    /// Capability flags
    pub flags: DomainFlags,
    /// Control bit selecting the logic-retention state (0 if absent)
    pub logicretstate_mask: u32,
    /// Memory banks, ordered by bank index
    pub banks: Vec<MemBankDesc>,
}

impl PowerDomainDesc {
    /// Start building a descriptor for the named domain.
    pub fn builder(name: &str) -> DescBuilder {
        DescBuilder::new(name)
    }

    /// Validate internal consistency.
    ///
    /// Called by the registry before a descriptor is accepted; exposed so
    /// chip crates can check their tables in isolation.
    pub fn validate(&self) -> PwrdmResult<()> {
        pwrdm_ensure!(
            !self.name.is_empty(),
            ErrorKind::InvalidDescriptor,
            "empty domain name"
        );
        pwrdm_ensure!(
            !self.pwrsts.is_empty(),
            ErrorKind::InvalidDescriptor,
            "{}: empty supported-state set",
            self.name
        );
        pwrdm_ensure!(
            self.banks.len() <= MAX_MEM_BANKS,
            ErrorKind::InvalidDescriptor,
            "{}: {} banks exceeds maximum of {}",
            self.name,
            self.banks.len(),
            MAX_MEM_BANKS
        );
        pwrdm_ensure!(
            self.pwrsts_logic_ret
                .difference(PowerStateSet::OFF_RET)
                .is_empty(),
            ErrorKind::InvalidDescriptor,
            "{}: logic retention set may only contain OFF and RET",
            self.name
        );

        for (index, bank) in self.banks.iter().enumerate() {
            pwrdm_ensure!(
                bank.pwrsts_on.is_empty() || (bank.on_mask != 0 && bank.pwrst_mask != 0),
                ErrorKind::InvalidDescriptor,
                "{}: bank {} declares on-states without control/status masks",
                self.name,
                index
            );
            pwrdm_ensure!(
                bank.pwrsts_ret.is_empty() || bank.ret_mask != 0,
                ErrorKind::InvalidDescriptor,
                "{}: bank {} declares retention states without a control mask",
                self.name,
                index
            );
        }

        Ok(())
    }
}

// =============================================================================
// DESCRIPTOR BUILDER
// =============================================================================

/// Builder for [`PowerDomainDesc`].
///
/// Mirrors the field-by-field aggregate style of chip data tables; fields
/// not set keep their "absent" defaults (zero masks, empty sets).
#[derive(Debug, Clone)]
pub struct DescBuilder {
    desc: PowerDomainDesc,
}

impl DescBuilder {
    fn new(name: &str) -> Self {
        Self {
            desc: PowerDomainDesc {
                name: String::from(name),
                voltdm: String::new(),
                prcm_offs: 0,
                pwrstctrl_offs: 0,
                pwrstst_offs: 0,
                pwrsts: PowerStateSet::empty(),
                pwrsts_logic_ret: PowerStateSet::empty(),
                flags: DomainFlags::empty(),
                logicretstate_mask: 0,
                banks: Vec::new(),
            },
        }
    }

    /// Set the voltage-domain name.
    pub fn voltdm(mut self, name: &str) -> Self {
        self.desc.voltdm = String::from(name);
        self
    }

    /// Set the PRM instance offset.
    pub fn prcm_offs(mut self, offs: u32) -> Self {
        self.desc.prcm_offs = offs;
        self
    }

    /// Set the control and status register offsets within the instance.
    pub fn ctrl_status_offs(mut self, ctrl: u32, status: u32) -> Self {
        self.desc.pwrstctrl_offs = ctrl;
        self.desc.pwrstst_offs = status;
        self
    }

    /// Set the supported power states.
    pub fn pwrsts(mut self, set: PowerStateSet) -> Self {
        self.desc.pwrsts = set;
        self
    }

    /// Set the supported logic-retention sub-states.
    pub fn pwrsts_logic_ret(mut self, set: PowerStateSet) -> Self {
        self.desc.pwrsts_logic_ret = set;
        self
    }

    /// Set the capability flags.
    pub fn flags(mut self, flags: DomainFlags) -> Self {
        self.desc.flags = flags;
        self
    }

    /// Set the logic-retention control mask.
    pub fn logicretstate_mask(mut self, mask: u32) -> Self {
        self.desc.logicretstate_mask = mask;
        self
    }

    /// Append a memory bank (bank index = append order).
    pub fn bank(mut self, bank: MemBankDesc) -> Self {
        self.desc.banks.push(bank);
        self
    }

    /// Finish building.
    pub fn build(self) -> PowerDomainDesc {
        self.desc
    }
}

// =============================================================================
// TESTS
// =============================================================================
