// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashSet;

use ejecter_contracts::{StorageError, VolumeMonitor};
use ejecter_types::DriveKey;
use tracing::debug;

/// Drives the ejecter currently believes are mounted.
///
/// A drive with several mounted volumes is recorded once.
#[derive(Debug, Default)]
pub struct DriveRegistry {
    mounted: HashSet<DriveKey>,
}

impl DriveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember that `drive` has a mounted volume.
    ///
    /// Mounts without an owning drive are ignored. Returns true if the drive
    /// was not already recorded.
    pub fn record_mount(&mut self, drive: Option<&DriveKey>) -> bool {
        let Some(drive) = drive else {
            return false;
        };

        let inserted = self.mounted.insert(drive.clone());
        if inserted {
            debug!("Mounted drive {drive}");
        }
        inserted
    }

    /// Forget `drive`, reporting whether it had been recorded.
    ///
    /// The answer is only meaningful once, when the drive goes away, so the
    /// query consumes the entry.
    pub fn was_mounted(&mut self, drive: &DriveKey) -> bool {
        self.mounted.remove(drive)
    }

    /// Seed the registry from the mounts that exist at startup.
    ///
    /// Returns the number of distinct drives recorded.
    pub async fn init_from_current_mounts(
        &mut self,
        monitor: &dyn VolumeMonitor,
    ) -> Result<usize, StorageError> {
        let mounts = monitor.mounts().await?;
        for mount in &mounts {
            self.record_mount(mount.drive.as_ref());
        }
        Ok(self.mounted.len())
    }

    pub fn contains(&self, drive: &DriveKey) -> bool {
        self.mounted.contains(drive)
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    pub fn clear(&mut self) {
        self.mounted.clear();
    }
}
