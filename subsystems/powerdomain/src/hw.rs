//! Hardware register encoding.
//!
//! The only place in the crate where [`PowerState`] meets its numeric
//! register encoding. Everything above this module works with the enum;
//! everything below works with raw words.

use prism_hal::BitField;
use static_assertions::const_assert_eq;

use crate::descriptor::PowerDomainDesc;
use crate::ops::RegisterLayout;
use crate::state::{ConfirmedState, LogicState, PowerState};

extern crate alloc;
use alloc::vec::Vec;

// =============================================================================
// STATE ENCODING
// =============================================================================

/// Encode a power state into its two-bit register value.
pub(crate) const fn pwrst_to_bits(state: PowerState) -> u32 {
    match state {
        PowerState::Off => 0,
        PowerState::Retention => 1,
        PowerState::Inactive => 2,
        PowerState::On => 3,
    }
}

/// Decode a two-bit register value into a power state.
pub(crate) const fn bits_to_pwrst(bits: u32) -> PowerState {
    match bits & 0x3 {
        0 => PowerState::Off,
        1 => PowerState::Retention,
        2 => PowerState::Inactive,
        _ => PowerState::On,
    }
}

// The encoding is a hardware contract; lock it down.
const_assert_eq!(pwrst_to_bits(PowerState::Off), 0);
const_assert_eq!(pwrst_to_bits(PowerState::Retention), 1);
const_assert_eq!(pwrst_to_bits(PowerState::Inactive), 2);
const_assert_eq!(pwrst_to_bits(PowerState::On), 3);

/// Encode a logic sub-state into its one-bit register value.
pub(crate) const fn logic_to_bits(logic: LogicState) -> u32 {
    pwrst_to_bits(logic.as_power_state())
}

// =============================================================================
// CONTROL WORD COMPOSITION
// =============================================================================

/// Compose the new PWRSTCTRL word for a transition.
///
/// Starts from the current register value so unrelated control bits
/// survive the read-modify-write.
pub(crate) fn compose_ctrl(
    current: u32,
    desc: &PowerDomainDesc,
    layout: &RegisterLayout,
    target: PowerState,
    logic: Option<LogicState>,
    bank_targets: &[PowerState],
) -> u32 {
    let mut word = layout.powerstate.insert(current, pwrst_to_bits(target));

    if let Some(logic) = logic {
        let field = BitField::new(desc.logicretstate_mask);
        word = field.insert(word, logic_to_bits(logic));
    }

    for (bank, &state) in desc.banks.iter().zip(bank_targets) {
        let field = match target {
            PowerState::On | PowerState::Inactive => BitField::new(bank.on_mask),
            PowerState::Retention | PowerState::Off => BitField::new(bank.ret_mask),
        };
        word = field.insert(word, pwrst_to_bits(state));
    }

    word
}

// =============================================================================
// STATUS WORD DECODING
// =============================================================================

/// Decoded contents of a PWRSTST word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusReadback {
    /// Current domain power state
    pub state: PowerState,
    /// Logic readback, where the domain has a logic-retention field
    pub logic: Option<LogicState>,
    /// Per-bank current states, in bank order
    pub banks: Vec<ConfirmedState>,
}

/// Decode a PWRSTST word against a domain's descriptor.
pub(crate) fn decode_status(
    word: u32,
    desc: &PowerDomainDesc,
    layout: &RegisterLayout,
) -> StatusReadback {
    let state = bits_to_pwrst(layout.powerstatest.get(word));

    let logic = if desc.logicretstate_mask != 0 && layout.logicstatest.is_present() {
        Some(if layout.logicstatest.is_set(word) {
            LogicState::Retained
        } else {
            LogicState::Lost
        })
    } else {
        None
    };

    let banks = desc
        .banks
        .iter()
        .map(|bank| {
            let field = BitField::new(bank.pwrst_mask);
            if field.is_present() {
                ConfirmedState::Known(bits_to_pwrst(field.get(word)))
            } else {
                ConfirmedState::Unknown
            }
        })
        .collect();

    StatusReadback { state, logic, banks }
}

/// Decode only the domain power-state field of a PWRSTST word.
pub(crate) fn observed_state(word: u32, layout: &RegisterLayout) -> PowerState {
    bits_to_pwrst(layout.powerstatest.get(word))
}

/// Whether an observed status completes a transition to `target`.
///
/// INACTIVE satisfies an ON request: the domain is powered and will leave
/// idle as soon as a clock runs.
pub(crate) fn status_satisfies(target: PowerState, observed: PowerState) -> bool {
    observed == target || (target == PowerState::On && observed == PowerState::Inactive)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{MemBankDesc, PowerDomainDesc};
    use crate::state::PowerStateSet;
    use alloc::vec;

    fn layout() -> RegisterLayout {
        RegisterLayout {
            powerstate: BitField::new(0x3),
            powerstatest: BitField::new(0x3),
            logicstatest: BitField::new(0x1 << 2),
            lowpowerstatechange: BitField::new(0x1 << 4),
            intransition: BitField::new(0x1 << 20),
        }
    }

    fn desc() -> PowerDomainDesc {
        PowerDomainDesc::builder("gfx")
            .voltdm("core")
            .pwrsts(PowerStateSet::OFF_RET_ON)
            .pwrsts_logic_ret(PowerStateSet::OFF_RET)
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

    #[test]
    fn test_encode_decode_roundtrip() {
        for state in [
            PowerState::Off,
            PowerState::Retention,
            PowerState::Inactive,
            PowerState::On,
        ] {
            assert_eq!(bits_to_pwrst(pwrst_to_bits(state)), state);
        }
    }

    #[test]
    fn test_compose_ctrl_on() {
        let word = compose_ctrl(
            0,
            &desc(),
            &layout(),
            PowerState::On,
            None,
            &[PowerState::On],
        );

        assert_eq!(word & 0x3, 3);
        assert_eq!((word >> 17) & 0x3, 3);
        // Retention control bits untouched on an ON request
        assert_eq!((word >> 6) & 0x1, 0);
    }

    #[test]
    fn test_compose_ctrl_retention_with_logic() {
        let word = compose_ctrl(
            0,
            &desc(),
            &layout(),
            PowerState::Retention,
            Some(LogicState::Retained),
            &[PowerState::Retention],
        );

        assert_eq!(word & 0x3, 1);
        assert_eq!((word >> 2) & 0x1, 1);
        assert_eq!((word >> 6) & 0x1, 1);
    }

    #[test]
    fn test_compose_preserves_unrelated_bits() {
        let current = 0x1 << 30;
        let word = compose_ctrl(
            current,
            &desc(),
            &layout(),
            PowerState::On,
            None,
            &[PowerState::On],
        );

        assert_eq!(word & (0x1 << 30), 0x1 << 30);
    }

    #[test]
    fn test_decode_status() {
        // state=ON, logic retained, bank=ON
        let word = 3 | (1 << 2) | (3 << 4);
        let readback = decode_status(word, &desc(), &layout());

        assert_eq!(readback.state, PowerState::On);
        assert_eq!(readback.logic, Some(LogicState::Retained));
        assert_eq!(
            readback.banks,
            vec![ConfirmedState::Known(PowerState::On)]
        );
    }

    #[test]
    fn test_status_satisfies() {
        assert!(status_satisfies(PowerState::On, PowerState::On));
        assert!(status_satisfies(PowerState::On, PowerState::Inactive));
        assert!(!status_satisfies(PowerState::Retention, PowerState::On));
        assert!(!status_satisfies(PowerState::Off, PowerState::Retention));
    }
}
