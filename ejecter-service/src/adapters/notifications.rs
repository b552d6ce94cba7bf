// SPDX-License-Identifier: GPL-3.0-only

//! Desktop notifications over `org.freedesktop.Notifications`.

use std::collections::HashMap;

use async_trait::async_trait;
use zbus::{Connection, proxy, zvariant::Value};

use ejecter_contracts::traits::Notifier;
use ejecter_contracts::{StorageError, StorageErrorKind};
use ejecter_types::{Notice, NotificationHandle};

use crate::config::NotificationConfig;

const NOTICE_ICON: &str = "media-eject";
const URGENCY_NORMAL: u8 = 1;
const URGENCY_CRITICAL: u8 = 2;

#[proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications"
)]
pub trait Notifications {
    #[allow(clippy::too_many_arguments)]
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: HashMap<&str, Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;

    fn close_notification(&self, id: u32) -> zbus::Result<()>;
}

pub struct DesktopNotifier {
    proxy: NotificationsProxy<'static>,
    config: NotificationConfig,
}

impl DesktopNotifier {
    pub async fn new(connection: &Connection, config: NotificationConfig) -> anyhow::Result<Self> {
        Ok(Self {
            proxy: NotificationsProxy::new(connection).await?,
            config,
        })
    }
}

fn urgency(notice: &Notice) -> u8 {
    if notice.is_warning() {
        URGENCY_CRITICAL
    } else {
        URGENCY_NORMAL
    }
}

fn unavailable(e: zbus::Error) -> StorageError {
    StorageError::new(
        StorageErrorKind::Unavailable,
        format!("Notification server error: {e}"),
    )
}

#[async_trait]
impl Notifier for DesktopNotifier {
    async fn notify(&self, notice: &Notice) -> Result<NotificationHandle, StorageError> {
        let mut hints: HashMap<&str, Value<'_>> = HashMap::new();
        hints.insert("urgency", Value::from(urgency(notice)));

        let id = self
            .proxy
            .notify(
                &self.config.app_name,
                0,
                NOTICE_ICON,
                notice.summary(),
                notice.body(),
                &[],
                hints,
                self.config.expire_timeout_ms,
            )
            .await
            .map_err(unavailable)?;

        tracing::debug!("Showing notification {id}: {}", notice.summary());
        Ok(NotificationHandle(id))
    }

    async fn clear(&self, handle: NotificationHandle) -> Result<(), StorageError> {
        tracing::debug!("Closing notification {handle}");
        self.proxy
            .close_notification(handle.0)
            .await
            .map_err(unavailable)
    }
}
