// SPDX-License-Identifier: GPL-3.0-only

use async_trait::async_trait;

use ejecter_types::{Notice, NotificationHandle};

use crate::StorageError;

/// Desktop notification surface.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Show `notice`, returning a handle that can retract it.
    async fn notify(&self, notice: &Notice) -> Result<NotificationHandle, StorageError>;

    /// Retract a notification. Clearing one the user already dismissed is not an error.
    async fn clear(&self, handle: NotificationHandle) -> Result<(), StorageError>;
}
