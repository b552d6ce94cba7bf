// SPDX-License-Identifier: GPL-3.0-only

//! Drive, volume and mount models
//!
//! A `DriveInfo` is a snapshot taken from the volume monitor. Only its `key`
//! is used for lifecycle bookkeeping; everything else is display data.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, comparable identity of a drive (the UDisks2 drive object path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriveKey(String);

impl DriveKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DriveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DriveKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for DriveKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A connected drive and its volumes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DriveInfo {
    /// Lifecycle identity
    pub key: DriveKey,

    /// Human-readable name (e.g., "SanDisk Cruzer Blade")
    pub name: String,

    /// Themed icon name
    pub icon: String,

    /// Whole-disk device node used for external command matching (e.g., "/dev/sdb")
    pub device: Option<String>,

    /// Volumes in device order
    pub volumes: Vec<VolumeInfo>,
}

impl DriveInfo {
    /// A drive is mounted when at least one of its volumes is.
    pub fn is_mounted(&self) -> bool {
        self.volumes.iter().any(VolumeInfo::is_mounted)
    }

    /// True when `identifier` names this drive's device node.
    pub fn has_identifier(&self, identifier: &str) -> bool {
        self.device.as_deref() == Some(identifier)
    }

    /// Menu text: the drive name followed by the names of its volumes,
    /// e.g. "Cruzer Blade (BOOT, rootfs)".
    pub fn menu_label(&self) -> String {
        let names: Vec<&str> = self
            .volumes
            .iter()
            .filter_map(|v| v.name.as_deref())
            .filter(|n| !n.is_empty())
            .collect();
        format!("{} ({})", self.name, names.join(", "))
    }
}

/// A mountable unit belonging to a drive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VolumeInfo {
    /// UDisks2 block object path
    pub object_path: String,

    /// Device node (e.g., "/dev/sdb1")
    pub device: String,

    /// Filesystem label or presentation hint, if any
    pub name: Option<String>,

    /// Current mount points; empty when unmounted
    pub mount_points: Vec<String>,
}

impl VolumeInfo {
    pub fn is_mounted(&self) -> bool {
        !self.mount_points.is_empty()
    }
}

/// A live mount as reported at enumeration time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MountInfo {
    /// UDisks2 block object path of the mounted volume
    pub volume: String,

    /// Where the volume is attached
    pub mount_point: String,

    /// Owning drive; `None` for loop devices and other drive-less volumes
    pub drive: Option<DriveKey>,
}
