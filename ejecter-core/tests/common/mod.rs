// SPDX-License-Identifier: GPL-3.0-only

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use ejecter_contracts::{
    DriveRef, LifecycleEvent, LifecycleEventStream, MountRef, Notifier, StorageError,
    StorageErrorKind, VolumeMonitor,
};
use ejecter_types::{DriveInfo, DriveKey, MountInfo, Notice, NoticeKind, NotificationHandle, VolumeInfo};
use futures::StreamExt;
use futures::stream;
use tokio::sync::mpsc;

pub fn key(name: &str) -> DriveKey {
    DriveKey::new(format!("/org/freedesktop/UDisks2/drives/{name}"))
}

pub fn drive_ref(name: &str) -> DriveRef {
    DriveRef::new(key(name), name)
}

pub fn mount_of(name: &str) -> MountRef {
    MountRef {
        volume: format!("/org/freedesktop/UDisks2/block_devices/{name}1"),
        mount_point: Some(format!("/media/user/{name}")),
        drive: Some(key(name)),
    }
}

pub fn mount_added(name: &str) -> LifecycleEvent {
    LifecycleEvent::MountAdded(mount_of(name))
}

pub fn pre_unmount(name: &str) -> LifecycleEvent {
    LifecycleEvent::PreUnmount(mount_of(name))
}

pub fn drive_removed(name: &str) -> LifecycleEvent {
    LifecycleEvent::DriveRemoved(drive_ref(name))
}

pub fn drive_info(name: &str, device: &str, mounted: bool) -> DriveInfo {
    DriveInfo {
        key: key(name),
        name: name.to_string(),
        icon: "drive-removable-media".to_string(),
        device: Some(device.to_string()),
        volumes: vec![VolumeInfo {
            object_path: format!("/org/freedesktop/UDisks2/block_devices/{name}1"),
            device: format!("{device}1"),
            name: Some(name.to_uppercase()),
            mount_points: if mounted {
                vec![format!("/media/user/{name}")]
            } else {
                Vec::new()
            },
        }],
    }
}

/// In-memory volume monitor.
pub struct FakeMonitor {
    drives: Mutex<Vec<DriveInfo>>,
    mounts: Mutex<Vec<MountInfo>>,
    failures: Mutex<HashMap<DriveKey, String>>,
    ejected: Mutex<Vec<DriveKey>>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<LifecycleEvent>>>,
    sender: mpsc::UnboundedSender<LifecycleEvent>,
}

impl FakeMonitor {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            drives: Mutex::new(Vec::new()),
            mounts: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            ejected: Mutex::new(Vec::new()),
            receiver: Mutex::new(Some(receiver)),
            sender,
        }
    }

    pub fn with_drives(self, drives: Vec<DriveInfo>) -> Self {
        *self.drives.lock().unwrap() = drives;
        self
    }

    pub fn with_mounts(self, mounts: Vec<MountInfo>) -> Self {
        *self.mounts.lock().unwrap() = mounts;
        self
    }

    pub fn fail_eject(&self, name: &str, detail: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(key(name), detail.to_string());
    }

    pub fn emit(&self, event: LifecycleEvent) {
        self.sender.send(event).unwrap();
    }

    pub fn ejected(&self) -> Vec<DriveKey> {
        self.ejected.lock().unwrap().clone()
    }
}

#[async_trait]
impl VolumeMonitor for FakeMonitor {
    async fn connected_drives(&self) -> Result<Vec<DriveInfo>, StorageError> {
        Ok(self.drives.lock().unwrap().clone())
    }

    async fn mounts(&self) -> Result<Vec<MountInfo>, StorageError> {
        Ok(self.mounts.lock().unwrap().clone())
    }

    async fn subscribe(&self) -> Result<LifecycleEventStream, StorageError> {
        let receiver = self.receiver.lock().unwrap().take().ok_or_else(|| {
            StorageError::new(StorageErrorKind::Unavailable, "already subscribed")
        })?;
        Ok(stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        })
        .boxed())
    }

    async fn eject(&self, drive: &DriveKey) -> Result<(), StorageError> {
        self.ejected.lock().unwrap().push(drive.clone());
        match self.failures.lock().unwrap().get(drive) {
            Some(detail) => Err(StorageError::new(StorageErrorKind::Busy, detail.clone())),
            None => Ok(()),
        }
    }
}

/// Notifier that records everything shown and cleared.
#[derive(Default)]
pub struct RecordingNotifier {
    shown: Mutex<Vec<(NotificationHandle, Notice)>>,
    cleared: Mutex<Vec<NotificationHandle>>,
}

impl RecordingNotifier {
    pub fn shown(&self) -> Vec<Notice> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.shown().iter().filter(|n| n.kind == kind).count()
    }

    pub fn handle_of(&self, kind: NoticeKind) -> Option<NotificationHandle> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .find(|(_, n)| n.kind == kind)
            .map(|(h, _)| *h)
    }

    pub fn cleared(&self) -> Vec<NotificationHandle> {
        self.cleared.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notice: &Notice) -> Result<NotificationHandle, StorageError> {
        let mut shown = self.shown.lock().unwrap();
        let handle = NotificationHandle(shown.len() as u32 + 100);
        shown.push((handle, notice.clone()));
        Ok(handle)
    }

    async fn clear(&self, handle: NotificationHandle) -> Result<(), StorageError> {
        self.cleared.lock().unwrap().push(handle);
        Ok(())
    }
}
