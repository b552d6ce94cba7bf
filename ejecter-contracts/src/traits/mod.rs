// SPDX-License-Identifier: GPL-3.0-only

pub mod monitor;
pub mod notifier;

pub use monitor::{LifecycleEventStream, VolumeMonitor};
pub use notifier::Notifier;
