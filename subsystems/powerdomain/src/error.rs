//! # Error Handling
//!
//! Error types for the power-domain framework.
//!
//! ## Error Categories
//!
//! | Category | Range | Example |
//! |------------|---------|----------------------------------|
//! | Registration | 0-99 | Duplicate domain name |
//! | Lookup | 100-199 | Unknown domain |
//! | Validation | 200-299 | Unsupported target state |
//! | Transition | 300-399 | Hardware poll timeout |
//! | Tracking | 400-499 | Use-count underflow |
//!
//! Tracking errors ([`ErrorKind::Underflow`] in particular) and lookups of
//! unregistered domains are caller defects, not transient faults; they are
//! logged at error level at the point of detection and never silently
//! swallowed.

use core::fmt;

extern crate alloc;
use alloc::string::String;

// =============================================================================
// ERROR KIND
// =============================================================================

/// Classification of power-domain framework errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorKind {
    // -------------------------------------------------------------------------
    // Registration Errors (0-99)
    // -------------------------------------------------------------------------
    /// Two descriptors share a name
    DuplicateDomain      = 0,

    /// Platform ops capability set is incomplete for the supplied table
    InvalidPlatformOps   = 1,

    /// Descriptor failed validation
    InvalidDescriptor    = 2,

    /// Registry is locked (initialization already completed)
    RegistryLocked       = 3,

    // -------------------------------------------------------------------------
    // Lookup Errors (100-199)
    // -------------------------------------------------------------------------
    /// Domain name is not registered
    UnknownDomain        = 100,

    // -------------------------------------------------------------------------
    // Validation Errors (200-299)
    // -------------------------------------------------------------------------
    /// Requested state is not in the domain's supported-state set
    UnsupportedState     = 200,

    /// Requested memory-bank state is not in the bank's supported set
    UnsupportedBankState = 201,

    // -------------------------------------------------------------------------
    // Transition Errors (300-399)
    // -------------------------------------------------------------------------
    /// Domain has active users and may not leave the ON state
    DomainBusy           = 300,

    /// Hardware did not confirm the transition within the poll budget
    TransitionTimeout    = 301,

    /// Status register read failed
    HardwareReadError    = 302,

    /// Control register write failed
    HardwareWriteError   = 303,

    // -------------------------------------------------------------------------
    // Tracking Errors (400-499)
    // -------------------------------------------------------------------------
    /// Use count cannot be incremented past its maximum
    Overflow             = 400,

    /// Use count released below zero
    Underflow            = 401,
}

impl ErrorKind {
    /// Get the error category name
    pub const fn category(&self) -> &'static str {
        match *self as u32 {
            0..=99 => "Registration",
            100..=199 => "Lookup",
            200..=299 => "Validation",
            300..=399 => "Transition",
            400..=499 => "Tracking",
            _ => "Unknown",
        }
    }

    /// Check if the error can clear on retry or resync
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorKind::TransitionTimeout
                | ErrorKind::HardwareReadError
                | ErrorKind::HardwareWriteError
                | ErrorKind::DomainBusy
        )
    }

    /// Check if the error indicates a defect in the caller
    pub const fn is_defect(&self) -> bool {
        matches!(self, ErrorKind::Underflow | ErrorKind::UnknownDomain)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Get default message for error kind
const fn kind_to_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::DuplicateDomain => "Duplicate domain name",
        ErrorKind::InvalidPlatformOps => "Incomplete platform ops capability",
        ErrorKind::InvalidDescriptor => "Invalid domain descriptor",
        ErrorKind::RegistryLocked => "Registry is locked",
        ErrorKind::UnknownDomain => "Unknown domain",
        ErrorKind::UnsupportedState => "Unsupported power state",
        ErrorKind::UnsupportedBankState => "Unsupported memory-bank state",
        ErrorKind::DomainBusy => "Domain has active users",
        ErrorKind::TransitionTimeout => "Transition not confirmed in time",
        ErrorKind::HardwareReadError => "Hardware register read failed",
        ErrorKind::HardwareWriteError => "Hardware register write failed",
        ErrorKind::Overflow => "Use count overflow",
        ErrorKind::Underflow => "Use count underflow",
    }
}

// =============================================================================
// PWRDM ERROR
// =============================================================================

/// Power-domain framework error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PwrdmError {
    /// Error classification
    kind: ErrorKind,

    /// Human-readable message
    message: &'static str,

    /// Domain the error refers to
    domain: Option<String>,

    /// Optional detailed message (heap allocated)
    details: Option<String>,
}

impl PwrdmError {
    /// Create new error with kind and message
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self {
            kind,
            message,
            domain: None,
            details: None,
        }
    }

    /// Create error from kind with default message
    pub const fn from_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind_to_message(kind))
    }

    /// Add the domain name to the error
    pub fn with_domain(mut self, name: &str) -> Self {
        self.domain = Some(String::from(name));
        self
    }

    /// Add details to the error
    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }

    /// Get error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get message
    pub fn message(&self) -> &str {
        self.message
    }

    /// Get domain name
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Get details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Check if recoverable
    pub fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }

    /// Check if the error indicates a caller defect
    pub fn is_defect(&self) -> bool {
        self.kind.is_defect()
    }
}

impl fmt::Display for PwrdmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.category(), self.message)?;

        if let Some(ref domain) = self.domain {
            write!(f, " (domain: {})", domain)?;
        }

        if let Some(ref details) = self.details {
            write!(f, ": {}", details)?;
        }

        Ok(())
    }
}

// =============================================================================
// RESULT TYPE
// =============================================================================

/// Result type for power-domain operations
pub type PwrdmResult<T> = Result<T, PwrdmError>;

// =============================================================================
// ERROR MACROS
// =============================================================================

/// Create a PwrdmError from a kind, with an optional formatted detail
#[macro_export]
macro_rules! pwrdm_error {
    ($kind:expr) => {
        $crate::error::PwrdmError::from_kind($kind)
    };
    ($kind:expr, $($arg:tt)*) => {
        $crate::error::PwrdmError::from_kind($kind)
            .with_details(alloc::format!($($arg)*))
    };
}

/// Return early with an error
#[macro_export]
macro_rules! pwrdm_bail {
    ($kind:expr) => {
        return Err($crate::pwrdm_error!($kind))
    };
    ($kind:expr, $($arg:tt)*) => {
        return Err($crate::pwrdm_error!($kind, $($arg)*))
    };
}

/// Ensure a condition is true, otherwise return error
#[macro_export]
macro_rules! pwrdm_ensure {
    ($cond:expr, $kind:expr) => {
        if !$cond {
            $crate::pwrdm_bail!($kind);
        }
    };
    ($cond:expr, $kind:expr, $($arg:tt)*) => {
        if !$cond {
            $crate::pwrdm_bail!($kind, $($arg)*);
        }
    };
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_categories() {
        assert_eq!(ErrorKind::DuplicateDomain.category(), "Registration");
        assert_eq!(ErrorKind::UnknownDomain.category(), "Lookup");
        assert_eq!(ErrorKind::UnsupportedState.category(), "Validation");
        assert_eq!(ErrorKind::TransitionTimeout.category(), "Transition");
        assert_eq!(ErrorKind::Underflow.category(), "Tracking");
    }

    #[test]
    fn test_error_kind_properties() {
        assert!(ErrorKind::TransitionTimeout.is_recoverable());
        assert!(!ErrorKind::DuplicateDomain.is_recoverable());

        assert!(ErrorKind::Underflow.is_defect());
        assert!(ErrorKind::UnknownDomain.is_defect());
        assert!(!ErrorKind::DomainBusy.is_defect());
    }

    #[test]
    fn test_error_creation() {
        let err = PwrdmError::from_kind(ErrorKind::DomainBusy).with_domain("gfx");

        assert_eq!(err.kind(), ErrorKind::DomainBusy);
        assert_eq!(err.message(), "Domain has active users");
        assert_eq!(err.domain(), Some("gfx"));
    }

    #[test]
    fn test_error_display() {
        let err = PwrdmError::from_kind(ErrorKind::UnsupportedState).with_domain("rtc");
        let rendered = alloc::format!("{}", err);

        assert!(rendered.contains("Validation"));
        assert!(rendered.contains("rtc"));
    }
}
