//! Per-domain runtime state.
//!
//! A [`Domain`] pairs an immutable descriptor with its mutable runtime
//! state. Two locks guard each domain:
//!
//! - the **state lock** protects the runtime-state struct itself; critical
//!   sections are short and never span hardware access
//! - the **transition lock** serializes whole transition sequences; it is
//!   only ever contended by another request for the same domain
//!
//! Registry-wide locks are never held while either of these is taken.

use spin::Mutex;

use crate::descriptor::PowerDomainDesc;
use crate::state::{ConfirmedState, LogicState, PowerState};

extern crate alloc;
use alloc::vec::Vec;

// =============================================================================
// TRANSITION STATISTICS
// =============================================================================

/// Per-domain transition counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStats {
    /// Confirmed transitions
    pub transitions: u64,
    /// Poll timeouts
    pub timeouts: u64,
    /// Requests satisfied without a register write
    pub skipped_writes: u64,
}

// =============================================================================
// RUNTIME STATE
// =============================================================================

/// Mutable per-domain state, guarded by the domain's state lock.
#[derive(Debug, Clone)]
pub(crate) struct RuntimeState {
    /// Last requested power state
    pub requested: PowerState,
    /// Last hardware-confirmed power state
    pub confirmed: ConfirmedState,
    /// Last requested logic sub-state
    pub requested_logic: LogicState,
    /// Last confirmed logic sub-state, where the domain has one
    pub confirmed_logic: Option<LogicState>,
    /// Last requested per-bank states, in bank order
    pub bank_requested: Vec<PowerState>,
    /// Last confirmed per-bank states, in bank order
    pub bank_confirmed: Vec<ConfirmedState>,
    /// Active users (clock domains, other domains) requiring power
    pub usecount: u32,
    /// State requested before the last suspend sweep
    pub pre_suspend: Option<PowerState>,
    /// Counters
    pub stats: TransitionStats,
}

impl RuntimeState {
    fn new(banks: usize) -> Self {
        Self {
            requested: PowerState::On,
            confirmed: ConfirmedState::Unknown,
            requested_logic: LogicState::Retained,
            confirmed_logic: None,
            bank_requested: alloc::vec![PowerState::On; banks],
            bank_confirmed: alloc::vec![ConfirmedState::Unknown; banks],
            usecount: 0,
            pre_suspend: None,
            stats: TransitionStats::default(),
        }
    }
}

// =============================================================================
// DOMAIN
// =============================================================================

/// One registered power domain: descriptor plus runtime state.
#[derive(Debug)]
pub struct Domain {
    desc: PowerDomainDesc,
    state: Mutex<RuntimeState>,
    xfer: Mutex<()>,
}

impl Domain {
    pub(crate) fn new(desc: PowerDomainDesc) -> Self {
        let banks = desc.banks.len();
        Self {
            desc,
            state: Mutex::new(RuntimeState::new(banks)),
            xfer: Mutex::new(()),
        }
    }

    /// Domain name.
    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.desc.name
    }

    /// The immutable descriptor.
    #[inline(always)]
    pub fn desc(&self) -> &PowerDomainDesc {
        &self.desc
    }

    /// Last requested power state.
    pub fn requested(&self) -> PowerState {
        self.state.lock().requested
    }

    /// Last confirmed power state.
    pub fn confirmed(&self) -> ConfirmedState {
        self.state.lock().confirmed
    }

    /// Transition counters.
    pub fn stats(&self) -> TransitionStats {
        self.state.lock().stats
    }

    pub(crate) fn state(&self) -> &Mutex<RuntimeState> {
        &self.state
    }

    pub(crate) fn xfer(&self) -> &Mutex<()> {
        &self.xfer
    }
}

// =============================================================================
// TESTS
// =============================================================================
