// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle event protocol
//!
//! Everything the core reacts to arrives as one `LifecycleEvent`: the seven
//! volume-monitor signals plus the completion of an eject it requested.

use std::fmt;

use ejecter_types::DriveKey;

use super::errors::StorageError;

/// A drive as named in an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveRef {
    pub key: DriveKey,
    pub name: String,
}

impl DriveRef {
    pub fn new(key: impl Into<DriveKey>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// A volume as named in an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRef {
    pub object_path: String,
    pub name: String,
    /// Owning drive, if the volume has one
    pub drive: Option<DriveKey>,
}

/// A mount as named in an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRef {
    /// Block object path of the mounted volume
    pub volume: String,
    /// Mount point, when still known
    pub mount_point: Option<String>,
    /// Owning drive, if the volume has one
    pub drive: Option<DriveKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    VolumeAdded(VolumeRef),
    VolumeRemoved(VolumeRef),
    MountAdded(MountRef),
    MountRemoved(MountRef),
    /// An unmount or eject has started for this mount
    PreUnmount(MountRef),
    DriveConnected(DriveRef),
    DriveRemoved(DriveRef),
    /// Result of an eject issued by the orchestrator
    EjectCompleted {
        drive: DriveRef,
        result: Result<(), StorageError>,
    },
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::VolumeAdded(_) => "volume-added",
            Self::VolumeRemoved(_) => "volume-removed",
            Self::MountAdded(_) => "mount-added",
            Self::MountRemoved(_) => "mount-removed",
            Self::PreUnmount(_) => "mount-pre-unmount",
            Self::DriveConnected(_) => "drive-connected",
            Self::DriveRemoved(_) => "drive-removed",
            Self::EjectCompleted { .. } => "eject-completed",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VolumeAdded(v) | Self::VolumeRemoved(v) => {
                write!(f, "{} {} ({})", self.name(), v.name, v.object_path)
            }
            Self::MountAdded(m) | Self::MountRemoved(m) | Self::PreUnmount(m) => {
                write!(
                    f,
                    "{} {} at {}",
                    self.name(),
                    m.volume,
                    m.mount_point.as_deref().unwrap_or("<unknown>")
                )
            }
            Self::DriveConnected(d) | Self::DriveRemoved(d) => {
                write!(f, "{} {} ({})", self.name(), d.name, d.key)
            }
            Self::EjectCompleted { drive, result } => write!(
                f,
                "{} {} ({})",
                self.name(),
                drive.name,
                if result.is_ok() { "ok" } else { "failed" }
            ),
        }
    }
}
