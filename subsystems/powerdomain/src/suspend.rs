//! # Suspend/Resume Orchestration
//!
//! Bulk sweeps used by system suspend:
//!
//! - [`prepare_suspend`] walks every domain in registration order, records
//!   its requested state, and moves idle domains to the deepest low-power
//!   state they support
//! - [`resume`] resyncs every domain from hardware and restores the
//!   recorded states
//!
//! Per-domain failures never abort a sweep; they are logged and the first
//! one is surfaced after the sweep completes.
//!
//! [`prepare_suspend`]: PowerDomainRegistry::prepare_suspend
//! [`resume`]: PowerDomainRegistry::resume

use crate::controller::{self, TransitionRequest};
use crate::error::{ErrorKind, PwrdmResult};
use crate::registry::PowerDomainRegistry;

impl PowerDomainRegistry {
    /// Move every idle domain to its deepest supported low-power state.
    ///
    /// Domains with active users, and domains supporting neither OFF nor
    /// RETENTION, are skipped. Powering down remains this sweep's explicit
    /// decision; it is not triggered by use counts reaching zero.
    pub fn prepare_suspend(&self) -> PwrdmResult<()> {
        let mut first_err = None;

        for domain in self.domains() {
            let Some(deepest) = domain.desc().pwrsts.deepest_low_power() else {
                continue;
            };

            {
                let mut st = domain.state().lock();
                st.pre_suspend = Some(st.requested);
            }

            let req = TransitionRequest::new(deepest);
            match controller::transition(&domain, self.ops(), self.cfg(), &req, false) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::DomainBusy => {
                    domain.state().lock().pre_suspend = None;
                    log::debug!("powerdomain: '{}' busy, left powered", domain.name());
                }
                Err(e) => {
                    log::warn!("powerdomain: suspend of '{}' failed: {}", domain.name(), e);
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Resync every domain from hardware and restore pre-suspend states.
    pub fn resume(&self) -> PwrdmResult<()> {
        let mut first_err = None;

        for domain in self.domains() {
            if let Err(e) = controller::resync_domain(&domain, self.ops()) {
                log::warn!("powerdomain: resync of '{}' failed: {}", domain.name(), e);
                first_err.get_or_insert(e);
                continue;
            }

            let saved = domain.state().lock().pre_suspend.take();
            if let Some(target) = saved {
                let req = TransitionRequest::new(target);
                if let Err(e) =
                    controller::transition(&domain, self.ops(), self.cfg(), &req, false)
                {
                    log::warn!(
                        "powerdomain: restore of '{}' to {} failed: {}",
                        domain.name(),
                        target,
                        e
                    );
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
