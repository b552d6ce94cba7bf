// SPDX-License-Identifier: GPL-3.0-only

//! Eject requests and their completions

use std::sync::Arc;

use ejecter_contracts::{DriveRef, LifecycleEvent, StorageError};
use ejecter_types::{DriveInfo, Notice};
use tracing::{debug, info, warn};

use crate::coordinator::Ejecter;

impl Ejecter {
    /// Start ejecting `drive` and return immediately.
    ///
    /// The outcome comes back later as `LifecycleEvent::EjectCompleted` on the
    /// ejecter's event channel. Repeated requests are passed straight through.
    pub fn request_eject(&self, drive: DriveRef) {
        info!("Ejecting {} ({})", drive.name, drive.key);

        let monitor = Arc::clone(&self.monitor);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = monitor.eject(&drive.key).await;
            if events
                .send(LifecycleEvent::EjectCompleted { drive, result })
                .is_err()
            {
                warn!("Eject finished after the ejecter shut down");
            }
        });
    }

    /// Eject the connected drive whose device node is `device`.
    ///
    /// Returns false if no such drive is connected any more.
    pub async fn request_eject_by_device(&self, device: &str) -> Result<bool, StorageError> {
        let drives = self.monitor.connected_drives().await?;
        let Some(drive) = drives.into_iter().find(|d| d.has_identifier(device)) else {
            debug!("Eject requested for {device}, which is not connected");
            return Ok(false);
        };

        self.request_eject(DriveRef::new(drive.key, drive.name));
        Ok(true)
    }

    /// Report an eject outcome to the user.
    ///
    /// On success the notification is attached to the drive's eject record so
    /// it can be retracted when the drive is pulled. A failure leaves tracking
    /// untouched.
    pub(crate) async fn on_eject_complete(
        &mut self,
        drive: DriveRef,
        result: Result<(), StorageError>,
    ) {
        match result {
            Ok(()) => {
                info!("Eject of {} complete", drive.name);
                match self.notifier.notify(&Notice::ejected(&drive.name)).await {
                    Ok(handle) => {
                        self.tracker.attach_notification(&drive.key, handle);
                    }
                    Err(e) => warn!("Failed to show eject notification: {e}"),
                }
            }
            Err(error) => {
                warn!("Eject of {} failed: {error}", drive.name);
                let notice = Notice::eject_failed(&drive.name, &error.message);
                if let Err(e) = self.notifier.notify(&notice).await {
                    warn!("Failed to show eject failure: {e}");
                }
            }
        }
    }

    /// Mark every connected drive with device node `identifier` as being
    /// ejected by someone else. The eject primitive is not invoked.
    ///
    /// Returns the number of drives matched.
    pub async fn request_eject_by_identifier(&mut self, identifier: &str) -> usize {
        let drives = match self.monitor.connected_drives().await {
            Ok(drives) => drives,
            Err(e) => {
                warn!("Could not enumerate drives for external eject of {identifier}: {e}");
                return 0;
            }
        };

        let mut matched = 0;
        for drive in drives.into_iter().filter(|d| d.has_identifier(identifier)) {
            info!("External eject of {} ({identifier})", drive.name);
            self.tracker.begin_tracked_eject(drive.key);
            matched += 1;
        }
        matched
    }

    /// Control-message entry point for an external eject. Always accepted.
    pub async fn on_command(&mut self, identifier: &str) -> bool {
        self.request_eject_by_identifier(identifier).await;
        true
    }

    /// Connected drives with at least one mounted volume.
    ///
    /// Read-only: queries the monitor and never touches tracking state.
    pub async fn ejectable_drives(&self) -> Result<Vec<DriveInfo>, StorageError> {
        let drives = self.monitor.connected_drives().await?;
        Ok(drives.into_iter().filter(DriveInfo::is_mounted).collect())
    }
}
