//! In-memory fake PRCM for tests.
//!
//! [`FakePrcm`] implements [`PrcmOps`] over a register map. Domains can be
//! mirrored so that control-register writes are reflected into the matching
//! status register, simulating hardware that transitions instantly;
//! freezing the status simulates hardware that never confirms, for timeout
//! tests. Write and delay counters back the redundant-write and poll-budget
//! assertions.
//!
//! Available to downstream crates behind the `testing` feature.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use prism_hal::{AccessError, BitField};
use spin::Mutex;

use crate::descriptor::PowerDomainDesc;
use crate::ops::{PrcmOps, RegisterLayout};

extern crate alloc;
use alloc::vec::Vec;
use alloc::collections::BTreeMap;

/// The register layout used by the fake platform (AM33xx-style placement).
pub const FAKE_LAYOUT: RegisterLayout = RegisterLayout {
    powerstate: BitField::new(0x3),
    powerstatest: BitField::new(0x3),
    logicstatest: BitField::new(0x1 << 2),
    lowpowerstatechange: BitField::new(0x1 << 4),
    intransition: BitField::new(0x1 << 20),
};

struct BankMirror {
    on: BitField,
    ret: BitField,
    pwrst: BitField,
    retst: BitField,
}

struct Mirror {
    ctrl: u32,
    stat: u32,
    logicret: BitField,
    banks: Vec<BankMirror>,
}

/// Scriptable in-memory PRCM.
pub struct FakePrcm {
    layout: RegisterLayout,
    registers: Mutex<BTreeMap<u32, u32>>,
    mirrors: Mutex<Vec<Mirror>>,
    frozen: AtomicBool,
    fail_reads: AtomicBool,
    lowpower_handshake: bool,
    write_count: AtomicU32,
    writes: Mutex<Vec<(u32, u32)>>,
    delay_total_us: AtomicU64,
    delay_calls: AtomicU32,
}

impl core::fmt::Debug for FakePrcm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FakePrcm")
            .field("writes", &self.write_count.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl FakePrcm {
    /// Create a fake with the default layout and all capabilities.
    pub fn new() -> Self {
        Self {
            layout: FAKE_LAYOUT,
            registers: Mutex::new(BTreeMap::new()),
            mirrors: Mutex::new(Vec::new()),
            frozen: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            lowpower_handshake: true,
            write_count: AtomicU32::new(0),
            writes: Mutex::new(Vec::new()),
            delay_total_us: AtomicU64::new(0),
            delay_calls: AtomicU32::new(0),
        }
    }

    /// Use a different register layout.
    pub fn with_layout(mut self, layout: RegisterLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Simulate a platform without the low-power handshake.
    pub fn without_lowpower_handshake(mut self) -> Self {
        self.lowpower_handshake = false;
        self
    }

    /// Mirror a domain's control writes into its status register.
    pub fn mirror_domain(&self, desc: &PowerDomainDesc) {
        let mirror = Mirror {
            ctrl: desc.prcm_offs + desc.pwrstctrl_offs,
            stat: desc.prcm_offs + desc.pwrstst_offs,
            logicret: BitField::new(desc.logicretstate_mask),
            banks: desc
                .banks
                .iter()
                .map(|bank| BankMirror {
                    on: BitField::new(bank.on_mask),
                    ret: BitField::new(bank.ret_mask),
                    pwrst: BitField::new(bank.pwrst_mask),
                    retst: BitField::new(bank.retst_mask),
                })
                .collect(),
        };

        self.mirrors.lock().push(mirror);
    }

    /// Preset a register value (e.g. an initial status word).
    pub fn set_register(&self, offs: u32, value: u32) {
        self.registers.lock().insert(offs, value);
    }

    /// Read a register value without going through the ops interface.
    pub fn register(&self, offs: u32) -> u32 {
        *self.registers.lock().get(&offs).unwrap_or(&0)
    }

    /// Stop (or resume) reflecting control writes into status registers.
    pub fn freeze_status(&self, frozen: bool) {
        self.frozen.store(frozen, Ordering::SeqCst);
    }

    /// Make every read fail with a bus fault.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of register writes issued so far.
    pub fn write_count(&self) -> u32 {
        self.write_count.load(Ordering::SeqCst)
    }

    /// Every write issued so far, in order.
    pub fn writes(&self) -> Vec<(u32, u32)> {
        self.writes.lock().clone()
    }

    /// Total microseconds spent in `delay_us`.
    pub fn total_delay_us(&self) -> u64 {
        self.delay_total_us.load(Ordering::SeqCst)
    }

    /// Number of `delay_us` calls.
    pub fn delay_calls(&self) -> u32 {
        self.delay_calls.load(Ordering::SeqCst)
    }

    /// Recompute the status registers of mirrors driven by `ctrl_offs`.
    fn refresh_mirrors(&self, ctrl_offs: u32) {
        if self.frozen.load(Ordering::SeqCst) {
            return;
        }

        let mirrors = self.mirrors.lock();
        let mut registers = self.registers.lock();

        for mirror in mirrors.iter().filter(|m| m.ctrl == ctrl_offs) {
            let ctrl = *registers.get(&mirror.ctrl).unwrap_or(&0);
            let mut stat = *registers.get(&mirror.stat).unwrap_or(&0);

            let state_bits = self.layout.powerstate.get(ctrl);
            stat = self.layout.powerstatest.insert(stat, state_bits);

            if mirror.logicret.is_present() {
                stat = self
                    .layout
                    .logicstatest
                    .insert(stat, mirror.logicret.get(ctrl));
            }

            for bank in &mirror.banks {
                let value = if state_bits >= 2 {
                    bank.on.get(ctrl)
                } else {
                    bank.ret.get(ctrl)
                };
                stat = bank.pwrst.insert(stat, value);
                stat = bank.retst.insert(stat, bank.ret.get(ctrl));
            }

            stat &= !self.layout.intransition.mask();
            registers.insert(mirror.stat, stat);
        }
    }
}

impl Default for FakePrcm {
    fn default() -> Self {
        Self::new()
    }
}

impl PrcmOps for FakePrcm {
    fn read_register(&self, offs: u32) -> Result<u32, AccessError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AccessError::BusFault);
        }
        Ok(self.register(offs))
    }

    fn write_register(&self, offs: u32, value: u32) -> Result<(), AccessError> {
        self.write_count.fetch_add(1, Ordering::SeqCst);
        self.writes.lock().push((offs, value));
        self.registers.lock().insert(offs, value);
        self.refresh_mirrors(offs);
        Ok(())
    }

    fn delay_us(&self, us: u32) {
        self.delay_total_us.fetch_add(us as u64, Ordering::SeqCst);
        self.delay_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn layout(&self) -> &RegisterLayout {
        &self.layout
    }

    fn has_lowpower_handshake(&self) -> bool {
        self.lowpower_handshake
    }
}

// =============================================================================
// TESTS
// =============================================================================
