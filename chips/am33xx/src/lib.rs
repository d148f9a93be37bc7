//! # AM33xx Power Domains
//!
//! The AM33xx (AM335x family) power-domain table for the Prism framework:
//! six domains across the core, mpu, and rtc voltage rails, with memory
//! bank retention controls for the gfx, per, and mpu domains.
//!
//! The table is pure chip data; all transition behavior lives in
//! `prism-powerdomain`. [`am33xx_init`] reproduces the canonical bring-up
//! sequence: build the table, register it with the platform ops, run the
//! initial readback sweep.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod prm;

use alloc::sync::Arc;
use alloc::vec::Vec;

use prism_hal::{BitField, MmioRegion};
use prism_powerdomain::{
    DomainFlags, MemBankDesc, MmioPrcm, PollConfig, PowerDomainDesc, PowerDomainRegistry,
    PowerStateSet, PrcmOps, PwrdmResult, RegisterLayout,
};

use prm::*;

// =============================================================================
// REGISTER LAYOUT
// =============================================================================

/// Field placement shared by every AM33xx power domain.
pub const AM33XX_LAYOUT: RegisterLayout = RegisterLayout {
    powerstate: BitField::new(0x3),
    powerstatest: BitField::new(0x3),
    logicstatest: BitField::new(0x1 << 2),
    lowpowerstatechange: BitField::new(0x1 << 4),
    intransition: BitField::new(0x1 << 20),
};

// =============================================================================
// DOMAIN TABLE
// =============================================================================

fn gfx_pwrdm() -> PowerDomainDesc {
    PowerDomainDesc::builder("gfx_pwrdm")
        .voltdm("core")
        .prcm_offs(AM33XX_PRM_GFX_MOD)
        .ctrl_status_offs(AM33XX_PM_GFX_PWRSTCTRL_OFFSET, AM33XX_PM_GFX_PWRSTST_OFFSET)
        .pwrsts(PowerStateSet::OFF_RET_ON)
        .pwrsts_logic_ret(PowerStateSet::OFF_RET)
        .flags(DomainFlags::HAS_LOWPOWERSTATECHANGE)
        .logicretstate_mask(0x1 << 2)
        .bank(MemBankDesc::new(
            // gfx_mem
            0x3 << 17,
            0x1 << 6,
            0x3 << 4,
            0x1 << 6,
            PowerStateSet::OFF_RET,
            PowerStateSet::ON,
        ))
        .build()
}

fn rtc_pwrdm() -> PowerDomainDesc {
    PowerDomainDesc::builder("rtc_pwrdm")
        .voltdm("rtc")
        .prcm_offs(AM33XX_PRM_RTC_MOD)
        .ctrl_status_offs(AM33XX_PM_RTC_PWRSTCTRL_OFFSET, AM33XX_PM_RTC_PWRSTST_OFFSET)
        .pwrsts(PowerStateSet::ON)
        .logicretstate_mask(0x1 << 2)
        .build()
}

fn wkup_pwrdm() -> PowerDomainDesc {
    PowerDomainDesc::builder("wkup_pwrdm")
        .voltdm("core")
        .prcm_offs(AM33XX_PRM_WKUP_MOD)
        .ctrl_status_offs(
            AM33XX_PM_WKUP_PWRSTCTRL_OFFSET,
            AM33XX_PM_WKUP_PWRSTST_OFFSET,
        )
        .pwrsts(PowerStateSet::ON)
        .logicretstate_mask(0x1 << 3)
        .build()
}

fn per_pwrdm() -> PowerDomainDesc {
    PowerDomainDesc::builder("per_pwrdm")
        .voltdm("core")
        .prcm_offs(AM33XX_PRM_PER_MOD)
        .ctrl_status_offs(AM33XX_PM_PER_PWRSTCTRL_OFFSET, AM33XX_PM_PER_PWRSTST_OFFSET)
        .pwrsts(PowerStateSet::OFF_RET_ON)
        .pwrsts_logic_ret(PowerStateSet::OFF_RET)
        .flags(DomainFlags::HAS_LOWPOWERSTATECHANGE)
        .logicretstate_mask(0x1 << 3)
        .bank(MemBankDesc::new(
            // pruss_mem
            0x3 << 5,
            0x1 << 7,
            0x3 << 23,
            0x1 << 7,
            PowerStateSet::OFF_RET,
            PowerStateSet::ON,
        ))
        .bank(MemBankDesc::new(
            // per_mem
            0x3 << 25,
            0x1 << 29,
            0x3 << 17,
            0x1 << 29,
            PowerStateSet::OFF_RET,
            PowerStateSet::ON,
        ))
        .bank(MemBankDesc::new(
            // ram_mem
            0x3 << 30,
            0x1 << 27,
            0x3 << 21,
            0x1 << 27,
            PowerStateSet::OFF_RET,
            PowerStateSet::ON,
        ))
        .build()
}

fn mpu_pwrdm() -> PowerDomainDesc {
    PowerDomainDesc::builder("mpu_pwrdm")
        .voltdm("mpu")
        .prcm_offs(AM33XX_PRM_MPU_MOD)
        .ctrl_status_offs(AM33XX_PM_MPU_PWRSTCTRL_OFFSET, AM33XX_PM_MPU_PWRSTST_OFFSET)
        .pwrsts(PowerStateSet::OFF_RET_ON)
        .pwrsts_logic_ret(PowerStateSet::OFF_RET)
        .flags(DomainFlags::HAS_LOWPOWERSTATECHANGE)
        .logicretstate_mask(0x1 << 2)
        .bank(MemBankDesc::new(
            // mpu_l1
            0x3 << 18,
            0x1 << 22,
            0x3 << 6,
            0x1 << 22,
            PowerStateSet::OFF_RET,
            PowerStateSet::ON,
        ))
        .bank(MemBankDesc::new(
            // mpu_l2
            0x3 << 20,
            0x1 << 23,
            0x3 << 8,
            0x1 << 23,
            PowerStateSet::OFF_RET,
            PowerStateSet::ON,
        ))
        .bank(MemBankDesc::new(
            // mpu_ram
            0x3 << 16,
            0x1 << 24,
            0x3 << 4,
            0x1 << 24,
            PowerStateSet::OFF_RET,
            PowerStateSet::ON,
        ))
        .build()
}

fn cefuse_pwrdm() -> PowerDomainDesc {
    PowerDomainDesc::builder("cefuse_pwrdm")
        .voltdm("core")
        .prcm_offs(AM33XX_PRM_CEFUSE_MOD)
        .ctrl_status_offs(
            AM33XX_PM_CEFUSE_PWRSTCTRL_OFFSET,
            AM33XX_PM_CEFUSE_PWRSTST_OFFSET,
        )
        .pwrsts(PowerStateSet::OFF_ON)
        .build()
}

/// The AM33xx power-domain table, in canonical registration order.
pub fn powerdomains() -> Vec<PowerDomainDesc> {
    alloc::vec![
        gfx_pwrdm(),
        rtc_pwrdm(),
        wkup_pwrdm(),
        per_pwrdm(),
        mpu_pwrdm(),
        cefuse_pwrdm(),
    ]
}

// =============================================================================
// INITIALIZATION
// =============================================================================

/// Build an ops capability over a mapped AM33xx PRM register bank.
pub fn mmio_ops(region: MmioRegion, delay: prism_powerdomain::ops::DelayFn) -> MmioPrcm {
    MmioPrcm::new(region, AM33XX_LAYOUT, delay).with_lowpower_handshake()
}

/// Register the AM33xx table and run the initial readback sweep.
pub fn am33xx_init(
    ops: Arc<dyn PrcmOps>,
    cfg: PollConfig,
) -> PwrdmResult<PowerDomainRegistry> {
    let registry = PowerDomainRegistry::register(powerdomains(), ops, cfg)?;
    registry.complete_init()?;
    Ok(registry)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use prism_powerdomain::testing::FakePrcm;
    use prism_powerdomain::{ConfirmedState, ErrorKind, PowerState, TransitionRequest};

    #[test]
    fn test_table_shape() {
        let table = powerdomains();

        let names: Vec<_> = table.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "gfx_pwrdm",
                "rtc_pwrdm",
                "wkup_pwrdm",
                "per_pwrdm",
                "mpu_pwrdm",
                "cefuse_pwrdm"
            ]
        );

        for desc in &table {
            desc.validate().unwrap();
        }
    }

    #[test]
    fn test_gfx_masks() {
        let gfx = gfx_pwrdm();

        assert_eq!(gfx.prcm_offs, 0x1100);
        assert_eq!(gfx.pwrstctrl_offs, 0x0000);
        assert_eq!(gfx.pwrstst_offs, 0x0010);
        assert_eq!(gfx.logicretstate_mask, 0x1 << 2);
        assert_eq!(gfx.banks.len(), 1);
        assert_eq!(gfx.banks[0].on_mask, 0x3 << 17);
        assert_eq!(gfx.banks[0].ret_mask, 0x1 << 6);
        assert_eq!(gfx.banks[0].pwrst_mask, 0x3 << 4);
        assert_eq!(gfx.banks[0].retst_mask, 0x1 << 6);
    }

    #[test]
    fn test_per_masks() {
        let per = per_pwrdm();

        assert_eq!(per.prcm_offs, 0x0C00);
        assert_eq!(per.pwrstctrl_offs, 0x000C);
        assert_eq!(per.pwrstst_offs, 0x0008);
        assert_eq!(per.logicretstate_mask, 0x1 << 3);
        assert_eq!(per.banks.len(), 3);

        // pruss_mem, per_mem, ram_mem
        assert_eq!(per.banks[0].on_mask, 0x3 << 5);
        assert_eq!(per.banks[1].on_mask, 0x3 << 25);
        assert_eq!(per.banks[2].on_mask, 0x3 << 30);
        assert_eq!(per.banks[0].pwrst_mask, 0x3 << 23);
        assert_eq!(per.banks[1].pwrst_mask, 0x3 << 17);
        assert_eq!(per.banks[2].pwrst_mask, 0x3 << 21);
    }

    #[test]
    fn test_mpu_masks() {
        let mpu = mpu_pwrdm();

        assert_eq!(mpu.prcm_offs, 0x0E00);
        assert_eq!(mpu.banks.len(), 3);
        assert_eq!(mpu.banks[0].on_mask, 0x3 << 18);
        assert_eq!(mpu.banks[1].on_mask, 0x3 << 20);
        assert_eq!(mpu.banks[2].on_mask, 0x3 << 16);
        assert_eq!(mpu.banks[0].ret_mask, 0x1 << 22);
        assert_eq!(mpu.banks[1].ret_mask, 0x1 << 23);
        assert_eq!(mpu.banks[2].ret_mask, 0x1 << 24);
    }

    fn fake_registry() -> (Arc<FakePrcm>, PowerDomainRegistry) {
        let fake = Arc::new(FakePrcm::new().with_layout(AM33XX_LAYOUT));
        for desc in powerdomains() {
            fake.mirror_domain(&desc);
            // boot firmware leaves every domain powered
            fake.set_register(desc.prcm_offs + desc.pwrstst_offs, 0x3);
        }
        let registry = am33xx_init(fake.clone(), PollConfig::default()).unwrap();
        (fake, registry)
    }

    #[test]
    fn test_init_registers_all_domains() {
        let (_fake, registry) = fake_registry();

        assert_eq!(registry.len(), 6);
        assert!(registry.is_initialized());
        assert!(registry.contains("mpu_pwrdm"));

        // every domain left init with a confirmed state
        for domain in &registry.snapshot().domains {
            assert!(domain.confirmed.is_known());
        }
    }

    #[test]
    fn test_rtc_rejects_low_power() {
        let (_fake, registry) = fake_registry();

        let err = registry
            .request_state("rtc_pwrdm", &TransitionRequest::new(PowerState::Retention))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedState);
    }

    #[test]
    fn test_gfx_retention_roundtrip() {
        let (fake, registry) = fake_registry();

        registry
            .request_state("gfx_pwrdm", &TransitionRequest::new(PowerState::Retention))
            .unwrap();
        assert_eq!(
            registry.current_state("gfx_pwrdm").unwrap().1,
            ConfirmedState::Known(PowerState::Retention)
        );

        // control word: state=RET, logic retained, gfx_mem in retention
        let ctrl = fake.register(AM33XX_PRM_GFX_MOD + AM33XX_PM_GFX_PWRSTCTRL_OFFSET);
        assert_eq!(ctrl & 0x3, 0x1);
        assert_eq!((ctrl >> 2) & 0x1, 0x1);
        assert_eq!((ctrl >> 6) & 0x1, 0x1);

        registry
            .request_state("gfx_pwrdm", &TransitionRequest::new(PowerState::On))
            .unwrap();
        assert_eq!(
            registry.current_state("gfx_pwrdm").unwrap(),
            (PowerState::On, ConfirmedState::Known(PowerState::On))
        );
    }

    #[test]
    fn test_suspend_resume_sweep() {
        let (_fake, registry) = fake_registry();

        registry.acquire("per_pwrdm").unwrap();
        registry.prepare_suspend().unwrap();

        // idle deep-capable domains drop
        assert_eq!(
            registry.current_state("gfx_pwrdm").unwrap().1,
            ConfirmedState::Known(PowerState::Off)
        );
        assert_eq!(
            registry.current_state("cefuse_pwrdm").unwrap().1,
            ConfirmedState::Known(PowerState::Off)
        );
        // busy and ON-only domains stay up
        assert_eq!(
            registry.current_state("per_pwrdm").unwrap(),
            (PowerState::On, ConfirmedState::Known(PowerState::On))
        );
        assert_eq!(
            registry.current_state("rtc_pwrdm").unwrap().0,
            PowerState::On
        );

        registry.resume().unwrap();
        assert_eq!(
            registry.current_state("gfx_pwrdm").unwrap(),
            (PowerState::On, ConfirmedState::Known(PowerState::On))
        );
        assert_eq!(registry.domain("per_pwrdm").unwrap().usecount(), 1);
    }
}
