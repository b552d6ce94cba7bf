// SPDX-License-Identifier: GPL-3.0-only

use ejecter_contracts::Notifier;
use ejecter_types::{DriveKey, NotificationHandle};
use tracing::{debug, warn};

/// An eject the ejecter expects to see finish with the drive disappearing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EjectRecord {
    pub drive: DriveKey,
    /// "Safe to remove" notification to retract once the drive is gone
    pub notification: Option<NotificationHandle>,
}

/// Drives with an eject in flight, whoever started it.
///
/// Records are drained when their drive is removed; a removed record is never
/// looked at again.
#[derive(Debug, Default)]
pub struct EjectTracker {
    records: Vec<EjectRecord>,
}

impl EjectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expect `drive` to be ejected.
    pub fn begin_tracked_eject(&mut self, drive: DriveKey) {
        debug!("Tracking eject of {drive}");
        self.records.push(EjectRecord {
            drive,
            notification: None,
        });
    }

    /// Attach the success notification to the first record for `drive`.
    ///
    /// Returns false when the drive is not tracked, which happens when the
    /// drive was already removed before the eject reported back.
    pub fn attach_notification(&mut self, drive: &DriveKey, handle: NotificationHandle) -> bool {
        match self.records.iter_mut().find(|r| &r.drive == drive) {
            Some(record) => {
                record.notification = Some(handle);
                true
            }
            None => {
                debug!("No tracked eject for {drive}; notification {handle} left as is");
                false
            }
        }
    }

    /// Stop tracking `drive`, retracting any notifications attached to it.
    ///
    /// Returns true if an eject was expected. All matching records are removed
    /// before any notification is cleared, so a second call sees nothing.
    pub async fn consume_if_tracked(&mut self, drive: &DriveKey, notifier: &dyn Notifier) -> bool {
        let (matched, kept): (Vec<EjectRecord>, Vec<EjectRecord>) = self
            .records
            .drain(..)
            .partition(|r| &r.drive == drive);
        self.records = kept;

        for handle in matched.iter().filter_map(|r| r.notification) {
            if let Err(e) = notifier.clear(handle).await {
                warn!("Failed to clear notification {handle} for {drive}: {e}");
            }
        }

        !matched.is_empty()
    }

    pub fn is_tracked(&self, drive: &DriveKey) -> bool {
        self.records.iter().any(|r| &r.drive == drive)
    }

    pub fn records(&self) -> &[EjectRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
