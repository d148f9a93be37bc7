//! # Use-Count Tracking
//!
//! Each domain carries a count of active users (clock domains, other power
//! domains) that require it to stay powered. A domain with a nonzero count
//! rejects transitions toward OFF/RETENTION. Reaching zero never powers a
//! domain down by itself; that decision stays with the calling policy
//! layer.
//!
//! Releasing a count that is already zero is a defect in the caller; it is
//! logged at error level and reported, never swallowed.

use crate::domain::Domain;
use crate::error::{ErrorKind, PwrdmError, PwrdmResult};
use crate::registry::PowerDomainRegistry;

impl Domain {
    /// Record an active user. Returns the new count.
    pub fn acquire(&self) -> PwrdmResult<u32> {
        let mut st = self.state().lock();
        match st.usecount.checked_add(1) {
            Some(count) => {
                st.usecount = count;
                Ok(count)
            }
            None => {
                log::error!("powerdomain: '{}' use count overflow", self.name());
                Err(PwrdmError::from_kind(ErrorKind::Overflow).with_domain(self.name()))
            }
        }
    }

    /// Drop an active user. Returns the new count.
    pub fn release(&self) -> PwrdmResult<u32> {
        let mut st = self.state().lock();
        match st.usecount.checked_sub(1) {
            Some(count) => {
                st.usecount = count;
                Ok(count)
            }
            None => {
                log::error!("powerdomain: '{}' released below zero", self.name());
                Err(PwrdmError::from_kind(ErrorKind::Underflow).with_domain(self.name()))
            }
        }
    }

    /// Current number of active users.
    pub fn usecount(&self) -> u32 {
        self.state().lock().usecount
    }
}

impl PowerDomainRegistry {
    /// Record an active user of the named domain.
    pub fn acquire(&self, name: &str) -> PwrdmResult<u32> {
        self.domain(name)?.acquire()
    }

    /// Drop an active user of the named domain.
    pub fn release(&self, name: &str) -> PwrdmResult<u32> {
        self.domain(name)?.release()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::PowerDomainDesc;
    use crate::state::PowerStateSet;

    fn domain() -> Domain {
        Domain::new(
            PowerDomainDesc::builder("gfx")
                .pwrsts(PowerStateSet::OFF_RET_ON)
                .build(),
        )
    }

    #[test]
    fn test_acquire_release_inverse() {
        let d = domain();

        for expected in 1..=5 {
            assert_eq!(d.acquire().unwrap(), expected);
        }
        for expected in (0..5).rev() {
            assert_eq!(d.release().unwrap(), expected);
        }
        assert_eq!(d.usecount(), 0);
    }

    #[test]
    fn test_release_underflow() {
        let d = domain();

        let err = d.release().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Underflow);
        assert!(err.is_defect());
        assert_eq!(d.usecount(), 0);
    }

    #[test]
    fn test_extra_release_after_balanced_sequence() {
        let d = domain();

        d.acquire().unwrap();
        d.acquire().unwrap();
        d.release().unwrap();
        d.release().unwrap();

        assert_eq!(d.release().unwrap_err().kind(), ErrorKind::Underflow);
    }
}
