// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use ejecter_types::{DriveInfo, DriveKey, MountInfo};

use crate::{LifecycleEvent, StorageError};

/// Volume-monitor signals, already translated into lifecycle events.
pub type LifecycleEventStream = BoxStream<'static, LifecycleEvent>;

/// Device enumeration, change notification and the eject primitive.
#[async_trait]
pub trait VolumeMonitor: Send + Sync {
    /// Drives currently connected, with their volumes and mount points
    async fn connected_drives(&self) -> Result<Vec<DriveInfo>, StorageError>;

    /// Every live mount and its owning drive
    async fn mounts(&self) -> Result<Vec<MountInfo>, StorageError>;

    /// Start receiving change events. Never yields `EjectCompleted`.
    async fn subscribe(&self) -> Result<LifecycleEventStream, StorageError>;

    /// Unmount and eject `drive`; resolves once the OS reports the outcome.
    async fn eject(&self, drive: &DriveKey) -> Result<(), StorageError>;
}
