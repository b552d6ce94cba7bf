// SPDX-License-Identifier: GPL-3.0-only

pub mod notifications;
pub mod udisks;

pub use notifications::DesktopNotifier;
pub use udisks::UdisksVolumeMonitor;
