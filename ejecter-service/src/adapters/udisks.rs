// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;
use futures_util::StreamExt;

use ejecter_contracts::traits::{LifecycleEventStream, VolumeMonitor};
use ejecter_contracts::{StorageError, StorageErrorKind};
use ejecter_types::{DriveInfo, DriveKey, MountInfo};
use ejecter_udisks::{DiskError, DiskManager};

#[derive(Clone)]
pub struct UdisksVolumeMonitor {
    manager: DiskManager,
}

impl UdisksVolumeMonitor {
    pub async fn new() -> anyhow::Result<Self> {
        Ok(Self {
            manager: DiskManager::new().await?,
        })
    }
}

/// Map a backend failure onto the contract error, keeping its message intact
/// for the user-facing notification.
fn map_disk_error(e: anyhow::Error, context: &str) -> StorageError {
    let kind = match e.downcast_ref::<DiskError>() {
        Some(DiskError::NotSupported) => StorageErrorKind::Unsupported,
        Some(DiskError::DeviceBusy) => StorageErrorKind::Busy,
        Some(DiskError::NotFound(_)) => StorageErrorKind::NotFound,
        Some(DiskError::ConnectionFailed(_)) => StorageErrorKind::Unavailable,
        _ if e.to_string().contains("NotAuthorized") => StorageErrorKind::PermissionDenied,
        _ => StorageErrorKind::Internal,
    };

    let message = if context.is_empty() {
        e.to_string()
    } else {
        format!("{context}: {e}")
    };
    StorageError::new(kind, message)
}

#[async_trait]
impl VolumeMonitor for UdisksVolumeMonitor {
    async fn connected_drives(&self) -> Result<Vec<DriveInfo>, StorageError> {
        self.manager
            .drives()
            .await
            .map_err(|e| map_disk_error(e, "Failed to enumerate drives via UDisks adapter"))
    }

    async fn mounts(&self) -> Result<Vec<MountInfo>, StorageError> {
        self.manager
            .mounts()
            .await
            .map_err(|e| map_disk_error(e, "Failed to enumerate mounts via UDisks adapter"))
    }

    async fn subscribe(&self) -> Result<LifecycleEventStream, StorageError> {
        let stream = self
            .manager
            .volume_event_stream()
            .await
            .map_err(|e| map_disk_error(e, "Failed to subscribe to UDisks signals"))?;
        Ok(stream.boxed())
    }

    async fn eject(&self, drive: &DriveKey) -> Result<(), StorageError> {
        // The message becomes the body of the failure notification.
        self.manager
            .eject(drive)
            .await
            .map_err(|e| map_disk_error(e, ""))
    }
}
