// SPDX-License-Identifier: GPL-3.0-only

pub mod client;
pub mod protocol;
pub mod traits;

pub use protocol::{
    DriveRef, LifecycleEvent, MountRef, StorageError, StorageErrorKind, VolumeRef,
};
pub use traits::{LifecycleEventStream, Notifier, VolumeMonitor};
