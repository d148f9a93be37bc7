//! # Transition Controller
//!
//! Validates and executes power-state transitions:
//!
//! 1. validate the target against the descriptor's supported sets
//! 2. reject low-power targets while the domain has active users
//! 3. program the control register (state, logic-retention, bank fields)
//! 4. run the low-power handshake where the domain requires it
//! 5. poll the status register within the configured budget
//! 6. commit the confirmed state, or mark the domain unconfirmed on timeout
//!
//! The domain's transition lock is held for the whole sequence; the state
//! lock only for validation and the final commit. No lock shared with other
//! domains is held across hardware access.

use crate::config::PollConfig;
use crate::domain::Domain;
use crate::error::{ErrorKind, PwrdmError, PwrdmResult};
use crate::hw;
use crate::ops::PrcmOps;
use crate::registry::PowerDomainRegistry;
use crate::state::{ConfirmedState, LogicState, PowerState, PowerStateSet};

extern crate alloc;
use alloc::vec::Vec;

// =============================================================================
// TRANSITION REQUEST
// =============================================================================

/// A requested domain transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Target power state
    pub target: PowerState,
    /// Logic sub-state for RETENTION targets; `None` picks the deepest
    /// retained option the domain supports
    pub logic: Option<LogicState>,
    /// Per-bank target states, in bank order; empty lets each bank follow
    /// the domain
    pub banks: Vec<PowerState>,
}

impl TransitionRequest {
    /// Request a transition to `target` with default bank/logic handling.
    pub fn new(target: PowerState) -> Self {
        Self {
            target,
            logic: None,
            banks: Vec::new(),
        }
    }

    /// Request a specific logic sub-state.
    pub fn with_logic(mut self, logic: LogicState) -> Self {
        self.logic = Some(logic);
        self
    }

    /// Request specific per-bank states (one entry per bank).
    pub fn with_banks(mut self, banks: Vec<PowerState>) -> Self {
        self.banks = banks;
        self
    }
}

// =============================================================================
// REGISTRY SURFACE
// =============================================================================

impl PowerDomainRegistry {
    /// Request a state transition for the named domain.
    ///
    /// See the module docs for the validation and execution sequence.
    pub fn request_state(&self, name: &str, req: &TransitionRequest) -> PwrdmResult<()> {
        let domain = self.domain(name)?;
        transition(&domain, self.ops(), self.cfg(), req, false)
    }

    /// Shutdown-path variant of [`request_state`](Self::request_state) that
    /// bypasses the use-count check.
    pub fn request_state_forced(&self, name: &str, req: &TransitionRequest) -> PwrdmResult<()> {
        let domain = self.domain(name)?;
        transition(&domain, self.ops(), self.cfg(), req, true)
    }

    /// Last requested and last confirmed state of the named domain.
    ///
    /// Never blocks on hardware; fails only for unregistered names.
    pub fn current_state(&self, name: &str) -> PwrdmResult<(PowerState, ConfirmedState)> {
        let domain = self.domain(name)?;
        let st = domain.state().lock();
        Ok((st.requested, st.confirmed))
    }

    /// Re-read the named domain's state from hardware.
    ///
    /// Clears the `Unknown`/`Unconfirmed` sentinels and realigns the cached
    /// requested state with what the hardware reports.
    pub fn resync(&self, name: &str) -> PwrdmResult<()> {
        let domain = self.domain(name)?;
        resync_domain(&domain, self.ops())
    }
}

// =============================================================================
// VALIDATION
// =============================================================================

fn bank_set_for(target: PowerState, bank: &crate::descriptor::MemBankDesc) -> PowerStateSet {
    match target {
        PowerState::On | PowerState::Inactive => bank.pwrsts_on,
        PowerState::Retention | PowerState::Off => bank.pwrsts_ret,
    }
}

fn default_bank_state(target: PowerState, set: PowerStateSet) -> Option<PowerState> {
    let candidate = match target {
        PowerState::On | PowerState::Inactive => PowerState::On,
        PowerState::Retention => PowerState::Retention,
        PowerState::Off => PowerState::Off,
    };
    if set.supports(candidate) {
        Some(candidate)
    } else {
        set.deepest()
    }
}

fn resolve_banks(domain: &Domain, req: &TransitionRequest) -> PwrdmResult<Vec<PowerState>> {
    let desc = domain.desc();

    if !req.banks.is_empty() && req.banks.len() != desc.banks.len() {
        return Err(PwrdmError::from_kind(ErrorKind::UnsupportedBankState)
            .with_domain(&desc.name)
            .with_details(alloc::format!(
                "{} bank states supplied, domain has {} banks",
                req.banks.len(),
                desc.banks.len()
            )));
    }

    desc.banks
        .iter()
        .enumerate()
        .map(|(index, bank)| {
            let set = bank_set_for(req.target, bank);
            let state = if req.banks.is_empty() {
                default_bank_state(req.target, set)
            } else {
                Some(req.banks[index])
            }
            .filter(|&s| set.supports(s));

            state.ok_or_else(|| {
                PwrdmError::from_kind(ErrorKind::UnsupportedBankState)
                    .with_domain(&desc.name)
                    .with_details(alloc::format!("bank {}", index))
            })
        })
        .collect()
}

fn resolve_logic(domain: &Domain, req: &TransitionRequest) -> PwrdmResult<Option<LogicState>> {
    let desc = domain.desc();
    let configurable = req.target == PowerState::Retention
        && desc.logicretstate_mask != 0
        && !desc.pwrsts_logic_ret.is_empty();

    match req.logic {
        None => Ok(if configurable {
            Some(if desc.pwrsts_logic_ret.supports(PowerState::Retention) {
                LogicState::Retained
            } else {
                LogicState::Lost
            })
        } else {
            None
        }),
        Some(logic) => {
            if !configurable || !desc.pwrsts_logic_ret.supports(logic.as_power_state()) {
                return Err(PwrdmError::from_kind(ErrorKind::UnsupportedState)
                    .with_domain(&desc.name)
                    .with_details(alloc::format!("logic sub-state {} not supported", logic)));
            }
            Ok(Some(logic))
        }
    }
}

// =============================================================================
// TRANSITION EXECUTION
// =============================================================================

pub(crate) fn transition(
    domain: &Domain,
    ops: &dyn PrcmOps,
    cfg: &PollConfig,
    req: &TransitionRequest,
    forced: bool,
) -> PwrdmResult<()> {
    let desc = domain.desc();
    let layout = *ops.layout();
    let target = req.target;

    let _xfer = domain.xfer().lock();

    if !desc.pwrsts.supports(target) {
        return Err(PwrdmError::from_kind(ErrorKind::UnsupportedState)
            .with_domain(&desc.name)
            .with_details(alloc::format!("{} not in supported set", target)));
    }
    let banks = resolve_banks(domain, req)?;
    let logic = resolve_logic(domain, req)?;

    {
        let mut st = domain.state().lock();

        if st.confirmed == ConfirmedState::Unknown {
            return Err(PwrdmError::from_kind(ErrorKind::HardwareReadError)
                .with_domain(&desc.name)
                .with_details(alloc::string::String::from(
                    "domain state unknown; resync required",
                )));
        }

        if target.is_low_power() && st.usecount > 0 && !forced {
            return Err(PwrdmError::from_kind(ErrorKind::DomainBusy).with_domain(&desc.name));
        }

        // Re-requesting the confirmed state is a successful no-op.
        if st.requested == target
            && st.confirmed == ConfirmedState::Known(target)
            && st.bank_requested == banks
            && logic.map_or(true, |l| st.requested_logic == l)
        {
            st.stats.skipped_writes += 1;
            return Ok(());
        }

        st.requested = target;
        if let Some(logic) = logic {
            st.requested_logic = logic;
        }
        st.bank_requested = banks.clone();
    }

    let ctrl_offs = desc.prcm_offs + desc.pwrstctrl_offs;
    let stat_offs = desc.prcm_offs + desc.pwrstst_offs;

    let current = ops
        .read_register(ctrl_offs)
        .map_err(|e| hw_err(ErrorKind::HardwareReadError, desc, e))?;
    let word = hw::compose_ctrl(current, desc, &layout, target, logic, &banks);
    ops.write_register(ctrl_offs, word)
        .map_err(|e| hw_err(ErrorKind::HardwareWriteError, desc, e))?;

    // Low-power handshake: raise the request bit, then wait for the
    // in-transition indication to clear before trusting the state field.
    if target.is_low_power()
        && desc
            .flags
            .contains(crate::state::DomainFlags::HAS_LOWPOWERSTATECHANGE)
    {
        let v = ops
            .read_register(ctrl_offs)
            .map_err(|e| hw_err(ErrorKind::HardwareReadError, desc, e))?;
        ops.write_register(ctrl_offs, v | layout.lowpowerstatechange.mask())
            .map_err(|e| hw_err(ErrorKind::HardwareWriteError, desc, e))?;
    }

    let confirmed_word = poll_status(domain, ops, cfg, stat_offs, target)?;

    let mut st = domain.state().lock();
    match confirmed_word {
        Some(word) => {
            let readback = hw::decode_status(word, desc, &layout);
            st.confirmed = ConfirmedState::Known(target);
            st.confirmed_logic = readback.logic;
            st.bank_confirmed = readback.banks;
            st.stats.transitions += 1;
            log::debug!("powerdomain: '{}' -> {}", desc.name, target);
            Ok(())
        }
        None => {
            st.confirmed = ConfirmedState::Unconfirmed;
            st.stats.timeouts += 1;
            log::warn!(
                "powerdomain: '{}' transition to {} not confirmed after {} polls",
                desc.name,
                target,
                cfg.attempts
            );
            Err(PwrdmError::from_kind(ErrorKind::TransitionTimeout).with_domain(&desc.name))
        }
    }
}

/// Poll the status register until it reflects `target` or the budget is
/// exhausted. Returns the final status word on success.
fn poll_status(
    domain: &Domain,
    ops: &dyn PrcmOps,
    cfg: &PollConfig,
    stat_offs: u32,
    target: PowerState,
) -> PwrdmResult<Option<u32>> {
    let layout = ops.layout();

    for attempt in 0..cfg.attempts {
        let word = ops.read_register(stat_offs).map_err(|e| {
            domain.state().lock().confirmed = ConfirmedState::Unconfirmed;
            hw_err(ErrorKind::HardwareReadError, domain.desc(), e)
        })?;

        if !layout.intransition.is_set(word) {
            let observed = hw::observed_state(word, layout);
            if hw::status_satisfies(target, observed) {
                return Ok(Some(word));
            }
        }

        if attempt + 1 < cfg.attempts {
            ops.delay_us(cfg.delay_us);
        }
    }

    Ok(None)
}

fn hw_err(
    kind: ErrorKind,
    desc: &crate::descriptor::PowerDomainDesc,
    err: prism_hal::AccessError,
) -> PwrdmError {
    PwrdmError::from_kind(kind)
        .with_domain(&desc.name)
        .with_details(alloc::format!("{}", err))
}

// =============================================================================
// RESYNC
// =============================================================================

/// Re-read a domain's state from hardware and realign the cache.
pub(crate) fn resync_domain(domain: &Domain, ops: &dyn PrcmOps) -> PwrdmResult<()> {
    let desc = domain.desc();
    let layout = *ops.layout();
    let stat_offs = desc.prcm_offs + desc.pwrstst_offs;

    let _xfer = domain.xfer().lock();

    let word = match ops.read_register(stat_offs) {
        Ok(word) => word,
        Err(e) => {
            domain.state().lock().confirmed = ConfirmedState::Unknown;
            return Err(hw_err(ErrorKind::HardwareReadError, desc, e));
        }
    };

    let readback = hw::decode_status(word, desc, &layout);

    let mut st = domain.state().lock();
    st.requested = readback.state;
    st.confirmed = ConfirmedState::Known(readback.state);
    st.confirmed_logic = readback.logic;
    if let Some(logic) = readback.logic {
        st.requested_logic = logic;
    }
    for (requested, confirmed) in st
        .bank_requested
        .iter_mut()
        .zip(readback.banks.iter())
    {
        if let ConfirmedState::Known(s) = confirmed {
            *requested = *s;
        }
    }
    st.bank_confirmed = readback.banks;

    log::debug!("powerdomain: '{}' resynced to {}", desc.name, readback.state);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MemBankDesc, PowerDomainDesc};
    use crate::registry::PowerDomainRegistry;
    use crate::state::DomainFlags;
    use crate::testing::FakePrcm;
    use alloc::sync::Arc;
    use alloc::vec;

    const GFX_CTRL: u32 = 0x1100;
    const GFX_STAT: u32 = 0x1110;

    fn gfx_desc() -> PowerDomainDesc {
        PowerDomainDesc::builder("gfx")
            .voltdm("core")
            .prcm_offs(0x1100)
            .ctrl_status_offs(0x0, 0x10)
            .pwrsts(PowerStateSet::OFF_RET_ON)
            .pwrsts_logic_ret(PowerStateSet::OFF_RET)
            .flags(DomainFlags::HAS_LOWPOWERSTATECHANGE)
            .logicretstate_mask(0x1 << 2)
            .bank(MemBankDesc::new(
                0x3 << 17,
                0x1 << 6,
                0x3 << 4,
                0x1 << 6,
                PowerStateSet::OFF_RET,
                PowerStateSet::ON,
            ))
            .build()
    }

    fn cefuse_desc() -> PowerDomainDesc {
        PowerDomainDesc::builder("cefuse")
            .voltdm("core")
            .prcm_offs(0x1200)
            .ctrl_status_offs(0x0, 0x4)
            .pwrsts(PowerStateSet::OFF_ON)
            .build()
    }

    fn setup() -> (Arc<FakePrcm>, PowerDomainRegistry) {
        let fake = Arc::new(FakePrcm::new());
        fake.mirror_domain(&gfx_desc());
        fake.mirror_domain(&cefuse_desc());

        let registry = PowerDomainRegistry::register(
            vec![gfx_desc(), cefuse_desc()],
            fake.clone(),
            PollConfig::new(5, 10),
        )
        .unwrap();
        registry.complete_init().unwrap();

        (fake, registry)
    }

    #[test]
    fn test_gfx_on_scenario() {
        let (_fake, registry) = setup();

        registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap();

        assert_eq!(
            registry.current_state("gfx").unwrap(),
            (PowerState::On, ConfirmedState::Known(PowerState::On))
        );
    }

    #[test]
    fn test_unsupported_state_leaves_state_unchanged() {
        let (_fake, registry) = setup();
        let before = registry.current_state("gfx").unwrap();

        let err = registry
            .request_state("gfx", &TransitionRequest::new(PowerState::Inactive))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedState);
        assert_eq!(registry.current_state("gfx").unwrap(), before);
    }

    #[test]
    fn test_unsupported_bank_state() {
        let (_fake, registry) = setup();

        // gfx_mem only supports ON while the domain is on
        let err = registry
            .request_state(
                "gfx",
                &TransitionRequest::new(PowerState::On).with_banks(vec![PowerState::Retention]),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedBankState);

        // bank count mismatch
        let err = registry
            .request_state(
                "gfx",
                &TransitionRequest::new(PowerState::On)
                    .with_banks(vec![PowerState::On, PowerState::On]),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedBankState);
    }

    #[test]
    fn test_domain_busy_and_forced_override() {
        let (_fake, registry) = setup();

        registry.acquire("gfx").unwrap();

        let err = registry
            .request_state("gfx", &TransitionRequest::new(PowerState::Retention))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DomainBusy);

        // the shutdown path may force the transition through
        registry
            .request_state_forced("gfx", &TransitionRequest::new(PowerState::Retention))
            .unwrap();
        assert_eq!(
            registry.current_state("gfx").unwrap().1,
            ConfirmedState::Known(PowerState::Retention)
        );

        registry.release("gfx").unwrap();
    }

    #[test]
    fn test_busy_domain_still_allows_power_up() {
        let (_fake, registry) = setup();

        registry.acquire("gfx").unwrap();
        registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap();
        registry.release("gfx").unwrap();
    }

    #[test]
    fn test_idempotent_rerequest_skips_write() {
        let (fake, registry) = setup();

        registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap();
        let writes_after_first = fake.write_count();

        registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap();

        assert_eq!(fake.write_count(), writes_after_first);
        assert_eq!(registry.domain("gfx").unwrap().stats().skipped_writes, 1);
    }

    #[test]
    fn test_timeout_leaves_unconfirmed() {
        let (fake, registry) = setup();
        fake.freeze_status(true);

        let err = registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::TransitionTimeout);
        assert_eq!(
            registry.current_state("gfx").unwrap(),
            (PowerState::On, ConfirmedState::Unconfirmed)
        );

        // poll budget: attempts - 1 delays of delay_us each
        assert_eq!(fake.delay_calls(), 4);
        assert_eq!(fake.total_delay_us(), 40);

        // a later successful transition exits the unconfirmed state
        fake.freeze_status(false);
        registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap();
        assert_eq!(
            registry.current_state("gfx").unwrap().1,
            ConfirmedState::Known(PowerState::On)
        );

        assert_eq!(registry.domain("gfx").unwrap().stats().timeouts, 1);
    }

    #[test]
    fn test_unknown_domain_is_reported() {
        let (_fake, registry) = setup();

        let err = registry
            .request_state("nope", &TransitionRequest::new(PowerState::On))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownDomain);
        assert!(err.is_defect());

        assert!(registry.current_state("nope").is_err());
    }

    #[test]
    fn test_unknown_sentinel_requires_resync() {
        let fake = Arc::new(FakePrcm::new());
        fake.mirror_domain(&gfx_desc());
        let registry = PowerDomainRegistry::register(
            vec![gfx_desc()],
            fake.clone(),
            PollConfig::new(5, 10),
        )
        .unwrap();

        fake.fail_reads(true);
        let err = registry.complete_init().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HardwareReadError);
        assert_eq!(
            registry.current_state("gfx").unwrap().1,
            ConfirmedState::Unknown
        );

        fake.fail_reads(false);

        // still excluded from transitions until resynced
        let err = registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::HardwareReadError);

        registry.resync("gfx").unwrap();
        registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap();
    }

    #[test]
    fn test_retention_programs_logic_and_bank_bits() {
        let (fake, registry) = setup();

        registry
            .request_state(
                "gfx",
                &TransitionRequest::new(PowerState::Retention).with_logic(LogicState::Retained),
            )
            .unwrap();

        let ctrl = fake.register(GFX_CTRL);
        assert_eq!(ctrl & 0x3, 1);
        assert_eq!((ctrl >> 2) & 0x1, 1);
        assert_eq!((ctrl >> 6) & 0x1, 1);
        // handshake bit raised for a low-power change
        assert_eq!((ctrl >> 4) & 0x1, 1);

        let snapshot = registry.snapshot();
        let gfx = &snapshot.domains[0];
        assert_eq!(gfx.logic, Some(LogicState::Retained));
    }

    #[test]
    fn test_unsupported_logic_substate() {
        let (_fake, registry) = setup();

        // logic sub-states are only meaningful for RETENTION targets
        let err = registry
            .request_state(
                "gfx",
                &TransitionRequest::new(PowerState::On).with_logic(LogicState::Retained),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedState);
    }

    #[test]
    fn test_snapshot_confirms_requested_after_success() {
        let (_fake, registry) = setup();

        registry
            .request_state("gfx", &TransitionRequest::new(PowerState::On))
            .unwrap();
        registry
            .request_state("cefuse", &TransitionRequest::new(PowerState::Off))
            .unwrap();

        for domain in &registry.snapshot().domains {
            assert_eq!(domain.confirmed, ConfirmedState::Known(domain.requested));
        }
    }

    #[test]
    fn test_resync_picks_up_external_change() {
        let (fake, registry) = setup();

        // hardware event moved the domain behind our back
        fake.set_register(GFX_STAT, 3);
        registry.resync("gfx").unwrap();

        assert_eq!(
            registry.current_state("gfx").unwrap(),
            (PowerState::On, ConfirmedState::Known(PowerState::On))
        );
    }
}
