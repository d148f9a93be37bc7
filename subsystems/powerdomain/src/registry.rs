//! # Power-Domain Registry
//!
//! Holds the set of registered domains and the platform ops capability.
//! The registry is an explicitly-owned object: the hosting platform creates
//! one, hands it the chip's descriptor table, and passes it by reference to
//! every consumer. There is no process-wide singleton.
//!
//! Lifecycle:
//!
//! 1. [`PowerDomainRegistry::register`] validates the table and allocates
//!    runtime state (domains start in the `Unknown` confirmed state)
//! 2. further tables may be merged with [`add_domains`]
//! 3. [`complete_init`] performs one readback sweep and locks the registry
//!
//! [`add_domains`]: PowerDomainRegistry::add_domains
//! [`complete_init`]: PowerDomainRegistry::complete_init

use core::sync::atomic::{AtomicBool, Ordering};

use spin::RwLock;

use crate::config::PollConfig;
use crate::controller;
use crate::descriptor::PowerDomainDesc;
use crate::domain::Domain;
use crate::error::{ErrorKind, PwrdmError, PwrdmResult};
use crate::ops::PrcmOps;
use crate::state::DomainFlags;

extern crate alloc;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

// =============================================================================
// REGISTRY
// =============================================================================

struct RegistryInner {
    /// Domains in registration order (diagnostics output order)
    domains: Vec<Arc<Domain>>,
    /// Name index into `domains`
    by_name: BTreeMap<String, usize>,
}

/// The power-domain registry.
pub struct PowerDomainRegistry {
    inner: RwLock<RegistryInner>,
    ops: Arc<dyn PrcmOps>,
    cfg: PollConfig,
    initialized: AtomicBool,
}

impl core::fmt::Debug for PowerDomainRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PowerDomainRegistry")
            .field("domains", &self.len())
            .field("initialized", &self.initialized.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl PowerDomainRegistry {
    /// Create a registry from a descriptor table and a platform ops
    /// capability.
    ///
    /// Fails with `DuplicateDomain` if two descriptors share a name, with
    /// `InvalidDescriptor` if a descriptor is inconsistent, and with
    /// `InvalidPlatformOps` if the table needs a capability the ops do not
    /// provide.
    pub fn register(
        descs: Vec<PowerDomainDesc>,
        ops: Arc<dyn PrcmOps>,
        cfg: PollConfig,
    ) -> PwrdmResult<Self> {
        let registry = Self {
            inner: RwLock::new(RegistryInner {
                domains: Vec::new(),
                by_name: BTreeMap::new(),
            }),
            ops,
            cfg,
            initialized: AtomicBool::new(false),
        };
        registry.add_domains(descs)?;
        Ok(registry)
    }

    /// Merge another descriptor table into the registry.
    ///
    /// Only allowed before [`complete_init`](Self::complete_init); fails
    /// with `RegistryLocked` afterwards.
    pub fn add_domains(&self, descs: Vec<PowerDomainDesc>) -> PwrdmResult<()> {
        if self.initialized.load(Ordering::Acquire) {
            return Err(PwrdmError::from_kind(ErrorKind::RegistryLocked));
        }

        let mut inner = self.inner.write();
        for desc in descs {
            desc.validate()?;

            if desc.flags.contains(DomainFlags::HAS_LOWPOWERSTATECHANGE)
                && !self.ops.has_lowpower_handshake()
            {
                return Err(PwrdmError::from_kind(ErrorKind::InvalidPlatformOps)
                    .with_domain(&desc.name));
            }

            if inner.by_name.contains_key(&desc.name) {
                return Err(
                    PwrdmError::from_kind(ErrorKind::DuplicateDomain).with_domain(&desc.name)
                );
            }

            log::debug!("powerdomain: registered '{}'", desc.name);

            let index = inner.domains.len();
            inner.by_name.insert(desc.name.clone(), index);
            inner.domains.push(Arc::new(Domain::new(desc)));
        }

        Ok(())
    }

    /// Perform the initial hardware readback for every domain and lock the
    /// registry.
    ///
    /// A readback failure leaves that domain in the `Unknown` confirmed
    /// state (excluded from transitions until resynced) and the sweep
    /// continues; the first failure is surfaced after the sweep.
    pub fn complete_init(&self) -> PwrdmResult<()> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(PwrdmError::from_kind(ErrorKind::RegistryLocked));
        }

        let mut first_err = None;
        for domain in self.domains() {
            if let Err(e) = controller::resync_domain(&domain, self.ops.as_ref()) {
                log::warn!(
                    "powerdomain: '{}' initial readback failed: {}",
                    domain.name(),
                    e
                );
                first_err.get_or_insert(e);
            }
        }

        log::info!(
            "powerdomain: init complete, {} domains registered",
            self.len()
        );

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Look up a domain by name.
    ///
    /// Looking up an unregistered name is a caller defect and is logged.
    pub fn domain(&self, name: &str) -> PwrdmResult<Arc<Domain>> {
        let inner = self.inner.read();
        match inner.by_name.get(name) {
            Some(&index) => Ok(inner.domains[index].clone()),
            None => {
                log::error!("powerdomain: lookup of unregistered domain '{}'", name);
                Err(PwrdmError::from_kind(ErrorKind::UnknownDomain).with_domain(name))
            }
        }
    }

    /// Whether a domain with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().by_name.contains_key(name)
    }

    /// All domains, in registration order.
    ///
    /// Returns a snapshot of the list; the registry lock is not held while
    /// the caller iterates.
    pub fn domains(&self) -> Vec<Arc<Domain>> {
        self.inner.read().domains.clone()
    }

    /// Number of registered domains.
    pub fn len(&self) -> usize {
        self.inner.read().domains.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`complete_init`](Self::complete_init) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub(crate) fn ops(&self) -> &dyn PrcmOps {
        self.ops.as_ref()
    }

    pub(crate) fn cfg(&self) -> &PollConfig {
        &self.cfg
    }
}

// =============================================================================
// TESTS
// =============================================================================
