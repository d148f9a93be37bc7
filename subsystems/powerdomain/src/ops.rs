//! Platform hardware-ops capability.
//!
//! The controller never touches registers directly; everything goes through
//! a [`PrcmOps`] capability supplied at registration time. A platform
//! provides register access, an inter-poll delay, and the register layout
//! describing where the state/status/handshake fields live. [`MmioPrcm`]
//! adapts a mapped [`MmioRegion`] into this capability for real hardware.

use prism_hal::{AccessError, BitField, MmioRegion};

extern crate alloc;
use alloc::boxed::Box;

// =============================================================================
// REGISTER LAYOUT
// =============================================================================

/// Placement of the architecture-defined fields within the control and
/// status registers.
///
/// Per-domain and per-bank masks live in the descriptors; this struct only
/// carries the fields common to every domain of a platform.
#[derive(Debug, Clone, Copy)]
pub struct RegisterLayout {
    /// Requested power state field in PWRSTCTRL
    pub powerstate: BitField,
    /// Current power state field in PWRSTST
    pub powerstatest: BitField,
    /// Logic state readback bit in PWRSTST
    pub logicstatest: BitField,
    /// Low-power state change handshake bit in PWRSTCTRL
    pub lowpowerstatechange: BitField,
    /// Transition-in-progress bit in PWRSTST
    pub intransition: BitField,
}

// =============================================================================
// PRCM OPS CAPABILITY
// =============================================================================

/// Register-access capability for one PRCM register bank.
///
/// Implementations must be callable from multiple contexts concurrently;
/// the framework serializes per-domain register sequences itself.
pub trait PrcmOps: Send + Sync {
    /// Read a 32-bit register at a byte offset from the PRCM base.
    fn read_register(&self, offs: u32) -> Result<u32, AccessError>;

    /// Write a 32-bit register at a byte offset from the PRCM base.
    fn write_register(&self, offs: u32, value: u32) -> Result<(), AccessError>;

    /// Busy-wait for approximately `us` microseconds between poll attempts.
    fn delay_us(&self, us: u32);

    /// Field placement for this platform.
    fn layout(&self) -> &RegisterLayout;

    /// Whether the platform implements the low-power state-change
    /// handshake required by domains flagged `HAS_LOWPOWERSTATECHANGE`.
    fn has_lowpower_handshake(&self) -> bool {
        false
    }
}

// =============================================================================
// MMIO-BACKED OPS
// =============================================================================

/// Platform delay callback used by [`MmioPrcm`].
pub type DelayFn = Box<dyn Fn(u32) + Send + Sync>;

/// [`PrcmOps`] over a mapped PRCM register bank.
pub struct MmioPrcm {
    region: MmioRegion,
    layout: RegisterLayout,
    delay: DelayFn,
    lowpower_handshake: bool,
}

impl MmioPrcm {
    /// Create an ops capability over a mapped region.
    ///
    /// `delay` is the platform's microsecond busy-wait (timer-backed where
    /// available).
    pub fn new(region: MmioRegion, layout: RegisterLayout, delay: DelayFn) -> Self {
        Self {
            region,
            layout,
            delay,
            lowpower_handshake: false,
        }
    }

    /// Enable the low-power state-change handshake capability.
    pub fn with_lowpower_handshake(mut self) -> Self {
        self.lowpower_handshake = true;
        self
    }
}

impl core::fmt::Debug for MmioPrcm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MmioPrcm")
            .field("region", &self.region)
            .field("layout", &self.layout)
            .field("lowpower_handshake", &self.lowpower_handshake)
            .finish_non_exhaustive()
    }
}

impl PrcmOps for MmioPrcm {
    fn read_register(&self, offs: u32) -> Result<u32, AccessError> {
        self.region.read_u32(offs)
    }

    fn write_register(&self, offs: u32, value: u32) -> Result<(), AccessError> {
        self.region.write_u32(offs, value)
    }

    fn delay_us(&self, us: u32) {
        (self.delay)(us)
    }

    fn layout(&self) -> &RegisterLayout {
        &self.layout
    }

    fn has_lowpower_handshake(&self) -> bool {
        self.lowpower_handshake
    }
}
