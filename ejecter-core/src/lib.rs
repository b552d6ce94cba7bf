// SPDX-License-Identifier: GPL-3.0-only

//! Drive lifecycle and eject-notification tracking
//!
//! `Ejecter` owns two pieces of bookkeeping:
//!
//! - the [`DriveRegistry`] of drives believed mounted
//! - the [`EjectTracker`] of drives with an eject expected
//!
//! and decides, when a drive disappears, whether the user pulled it without
//! ejecting. All state is touched from one task; events are handled strictly
//! one at a time through [`Ejecter::handle`].

pub mod coordinator;
pub mod orchestrator;
pub mod registry;
pub mod tracker;

pub use coordinator::Ejecter;
pub use registry::DriveRegistry;
pub use tracker::{EjectRecord, EjectTracker};
