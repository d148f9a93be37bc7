//! # State Snapshots & Diagnostics
//!
//! Read-only, point-in-time views of every registered domain, in
//! registration order. Each domain's entry is taken under its own state
//! lock, so the per-domain fields are mutually consistent; the snapshot
//! never blocks on hardware.
//!
//! `Display` on [`RegistrySnapshot`] renders the human-readable listing
//! used by diagnostics consoles.

use core::fmt;

use crate::domain::TransitionStats;
use crate::registry::PowerDomainRegistry;
use crate::state::{ConfirmedState, LogicState, PowerState};

extern crate alloc;
use alloc::string::String;
use alloc::vec::Vec;

// =============================================================================
// SNAPSHOT TYPES
// =============================================================================

/// Point-in-time view of one domain.
#[derive(Debug, Clone)]
pub struct DomainSnapshot {
    /// Domain name
    pub name: String,
    /// Voltage-domain name
    pub voltdm: String,
    /// Last requested power state
    pub requested: PowerState,
    /// Last confirmed power state
    pub confirmed: ConfirmedState,
    /// Last confirmed logic sub-state
    pub logic: Option<LogicState>,
    /// Per-bank confirmed states, in bank order
    pub banks: Vec<ConfirmedState>,
    /// Active users
    pub usecount: u32,
    /// Transition counters
    pub stats: TransitionStats,
}

/// Point-in-time view of the whole registry, in registration order.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// Per-domain entries
    pub domains: Vec<DomainSnapshot>,
}

impl PowerDomainRegistry {
    /// Take a snapshot of every registered domain.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let domains = self
            .domains()
            .iter()
            .map(|domain| {
                let st = domain.state().lock();
                DomainSnapshot {
                    name: String::from(domain.name()),
                    voltdm: domain.desc().voltdm.clone(),
                    requested: st.requested,
                    confirmed: st.confirmed,
                    logic: st.confirmed_logic,
                    banks: st.bank_confirmed.clone(),
                    usecount: st.usecount,
                    stats: st.stats,
                }
            })
            .collect();

        RegistrySnapshot { domains }
    }
}

// =============================================================================
// LISTING OUTPUT
// =============================================================================

impl fmt::Display for DomainSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let confirmed = alloc::format!("{}", self.confirmed);
        write!(
            f,
            "{:<16} {:<8} req={:<8} conf={:<12} use={}",
            self.name,
            self.voltdm,
            self.requested.name(),
            confirmed,
            self.usecount
        )?;

        if let Some(logic) = self.logic {
            write!(f, " {}", logic)?;
        }

        if !self.banks.is_empty() {
            write!(f, " banks=[")?;
            for (index, bank) in self.banks.iter().enumerate() {
                if index > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", bank)?;
            }
            write!(f, "]")?;
        }

        Ok(())
    }
}

impl fmt::Display for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for domain in &self.domains {
            writeln!(f, "{}", domain)?;
        }
        Ok(())
    }
}
