// SPDX-License-Identifier: GPL-3.0-only

//! The service event loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use ejecter_contracts::LifecycleEvent;
use ejecter_contracts::client::CONTROL_PATH;
use ejecter_core::Ejecter;
use ejecter_types::DriveInfo;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use zbus::Connection;

use crate::control::{ControlHandler, ControlRequest};
use crate::error::ServiceError;

/// The icon is shown unless auto-hide is on and nothing can be ejected.
pub fn icon_visible(autohide: bool, ejectable: &[DriveInfo]) -> bool {
    !autohide || !ejectable.is_empty()
}

/// One `ListEjectable` entry: the drive plus the text the panel shows for it.
#[derive(Debug, Serialize)]
pub struct MenuEntry<'a> {
    pub label: String,
    #[serde(flatten)]
    pub drive: &'a DriveInfo,
}

pub fn menu_json(drives: &[DriveInfo]) -> serde_json::Result<String> {
    let entries: Vec<MenuEntry<'_>> = drives
        .iter()
        .map(|drive| MenuEntry {
            label: drive.menu_label(),
            drive,
        })
        .collect();
    serde_json::to_string(&entries)
}

pub struct Runtime {
    ejecter: Ejecter,
    events: mpsc::UnboundedReceiver<LifecycleEvent>,
    requests: mpsc::UnboundedReceiver<ControlRequest>,
    connection: Connection,
    autohide: bool,
    icon_visible: Arc<AtomicBool>,
}

impl Runtime {
    pub fn new(
        ejecter: Ejecter,
        events: mpsc::UnboundedReceiver<LifecycleEvent>,
        requests: mpsc::UnboundedReceiver<ControlRequest>,
        connection: Connection,
        autohide: bool,
        icon_visible: Arc<AtomicBool>,
    ) -> Self {
        Self {
            ejecter,
            events,
            requests,
            connection,
            autohide,
            icon_visible,
        }
    }

    /// Run until ctrl-c, then tear the ejecter down.
    pub async fn run(mut self) -> Result<()> {
        self.ejecter.initialize().await?;
        self.refresh().await;

        info!("Ejecter ready, waiting for drives...");
        loop {
            tokio::select! {
                Some(event) = self.events.recv() => {
                    if self.ejecter.handle(event).await {
                        self.refresh().await;
                    }
                }
                Some(request) = self.requests.recv() => {
                    self.on_request(request).await;
                }
                result = tokio::signal::ctrl_c() => {
                    result?;
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.ejecter.shutdown();
        Ok(())
    }

    async fn on_request(&mut self, request: ControlRequest) {
        match request {
            ControlRequest::MarkEjecting { identifier, reply } => {
                let accepted = self.ejecter.on_command(&identifier).await;
                let _ = reply.send(accepted);
            }
            ControlRequest::Eject { device, reply } => {
                let started = self
                    .ejecter
                    .request_eject_by_device(&device)
                    .await
                    .map_err(ServiceError::from);
                let _ = reply.send(started);
            }
            ControlRequest::ListEjectable { reply } => {
                let listing = match self.ejecter.ejectable_drives().await {
                    Ok(drives) => menu_json(&drives).map_err(ServiceError::from),
                    Err(e) => Err(e.into()),
                };
                let _ = reply.send(listing);
            }
        }
    }

    /// Tell the panel the drive list changed and update icon visibility.
    async fn refresh(&self) {
        let ejectable = match self.ejecter.ejectable_drives().await {
            Ok(drives) => drives,
            Err(e) => {
                warn!("Could not list ejectable drives: {e}");
                Vec::new()
            }
        };
        let visible = icon_visible(self.autohide, &ejectable);
        debug!("{} ejectable drive(s), icon visible: {visible}", ejectable.len());

        if let Err(e) = self.emit(visible).await {
            warn!("Failed to notify the panel: {e}");
        }
    }

    async fn emit(&self, visible: bool) -> zbus::Result<()> {
        let iface_ref = self
            .connection
            .object_server()
            .interface::<_, ControlHandler>(CONTROL_PATH)
            .await?;
        let emitter = iface_ref.signal_emitter();

        ControlHandler::drives_changed(emitter).await?;
        if self.icon_visible.swap(visible, Ordering::Relaxed) != visible {
            iface_ref.get().await.icon_visible_changed(emitter).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ejecter_types::{DriveKey, VolumeInfo};

    fn stick() -> DriveInfo {
        DriveInfo {
            key: DriveKey::from("/org/freedesktop/UDisks2/drives/Stick"),
            name: "Cruzer Blade".to_string(),
            icon: "drive-removable-media".to_string(),
            device: Some("/dev/sdb".to_string()),
            volumes: vec![VolumeInfo {
                object_path: "/org/freedesktop/UDisks2/block_devices/sdb1".to_string(),
                device: "/dev/sdb1".to_string(),
                name: Some("BOOT".to_string()),
                mount_points: vec!["/media/user/BOOT".to_string()],
            }],
        }
    }

    #[test]
    fn autohide_hides_icon_only_without_drives() {
        assert!(!icon_visible(true, &[]));
        assert!(icon_visible(true, &[stick()]));
        assert!(icon_visible(false, &[]));
    }

    #[test]
    fn menu_json_carries_label_and_drive() {
        let json = menu_json(&[stick()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value[0]["label"], "Cruzer Blade (BOOT)");
        assert_eq!(value[0]["device"], "/dev/sdb");
        assert_eq!(value[0]["key"], "/org/freedesktop/UDisks2/drives/Stick");

        // Clients that only know DriveInfo can still read the listing.
        let drives: Vec<DriveInfo> = serde_json::from_str(&json).unwrap();
        assert_eq!(drives, vec![stick()]);
    }
}
