//! # Prism Power-Domain Controller
//!
//! Generic state controller for SoC power domains. A chip supplies a table
//! of domain descriptors (register offsets, supported-state bitmaps, memory
//! bank masks) and a register-access capability; this crate validates and
//! executes state transitions, tracks per-domain users, and exposes
//! consistent snapshots for diagnostics.
//!
//! ## Components
//!
//! | Component | Module | Responsibility |
//! |-----------------------|--------------|----------------------------------------|
//! | Domain Registry | `registry` | descriptor tables, lookup, init sweep |
//! | Transition Controller | `controller` | validate/program/poll/commit |
//! | Use-Count Tracker | `tracker` | acquire/release active users |
//! | Snapshots | `snapshot` | diagnostics listings |
//! | Suspend Orchestration | `suspend` | bulk suspend/resume sweeps |
//! | Hardware Boundary | `ops` | platform register-access capability |
//!
//! ## Lifecycle
//!
//! ```text
//!   chip table ──▶ register() ──▶ [add_domains()] ──▶ complete_init()
//!                                                          │
//!                        ┌─────────────────────────────────┤
//!                        ▼                                 ▼
//!                 request_state()                     snapshot()
//!                 acquire()/release()                 current_state()
//!                 prepare_suspend()/resume()
//! ```
//!
//! The registry is an explicitly-owned object created by the hosting
//! platform; there is no global singleton. Descriptors are immutable after
//! registration and only the transition controller mutates runtime state.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

pub mod config;
pub mod controller;
pub mod descriptor;
pub mod domain;
pub mod error;
pub mod ops;
pub mod registry;
pub mod snapshot;
pub mod state;

mod hw;
mod suspend;
mod tracker;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::PollConfig;
pub use controller::TransitionRequest;
pub use descriptor::{DescBuilder, MemBankDesc, PowerDomainDesc, MAX_MEM_BANKS};
pub use domain::{Domain, TransitionStats};
pub use error::{ErrorKind, PwrdmError, PwrdmResult};
pub use ops::{MmioPrcm, PrcmOps, RegisterLayout};
pub use registry::PowerDomainRegistry;
pub use snapshot::{DomainSnapshot, RegistrySnapshot};
pub use state::{ConfirmedState, DomainFlags, LogicState, PowerState, PowerStateSet};
