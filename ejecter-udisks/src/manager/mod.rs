// SPDX-License-Identifier: GPL-3.0-only

pub mod disk_manager;
pub mod translator;

pub use disk_manager::{DiskManager, UDisks2ManagerProxy, VolumeEventStream};
pub use translator::{BlockState, EventTranslator};
