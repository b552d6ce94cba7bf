// SPDX-License-Identifier: GPL-3.0-only

pub mod errors;
pub mod events;

pub use errors::{StorageError, StorageErrorKind};
pub use events::{DriveRef, LifecycleEvent, MountRef, VolumeRef};
