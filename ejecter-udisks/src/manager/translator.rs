// SPDX-License-Identifier: GPL-3.0-only

//! Turns UDisks2 object changes into lifecycle events.
//!
//! UDisks2 only tells us which interfaces appeared or vanished and which
//! properties changed. The translator keeps just enough of the previous state
//! (which filesystem lives on which drive, and whether it is mounted) to emit
//! removal and unmount events after the objects themselves are gone.

use std::collections::HashMap;

use ejecter_contracts::{DriveRef, LifecycleEvent, MountRef, VolumeRef};
use ejecter_types::DriveKey;

/// UDisks2 job operations that unmount the objects they act on.
pub const UNMOUNTING_JOBS: [&str; 3] = ["filesystem-unmount", "drive-eject", "drive-power-off"];

/// Cached view of one filesystem block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockState {
    pub drive: Option<DriveKey>,
    pub name: String,
    pub mount_point: Option<String>,
}

#[derive(Debug, Default)]
pub struct EventTranslator {
    blocks: HashMap<String, BlockState>,
    drives: HashMap<String, String>,
}

impl EventTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a drive that already exists, without emitting anything.
    pub fn seed_drive(&mut self, path: &str, name: String) {
        self.drives.insert(path.to_string(), name);
    }

    /// Record a filesystem block that already exists, without emitting anything.
    pub fn seed_block(&mut self, path: &str, state: BlockState) {
        self.blocks.insert(path.to_string(), state);
    }

    pub fn knows_block(&self, path: &str) -> bool {
        self.blocks.contains_key(path)
    }

    pub fn drive_added(&mut self, path: &str, name: String) -> Vec<LifecycleEvent> {
        self.drives.insert(path.to_string(), name.clone());
        vec![LifecycleEvent::DriveConnected(DriveRef::new(path, name))]
    }

    pub fn drive_removed(&mut self, path: &str) -> Vec<LifecycleEvent> {
        let name = self
            .drives
            .remove(path)
            .unwrap_or_else(|| object_basename(path).to_string());
        vec![LifecycleEvent::DriveRemoved(DriveRef::new(path, name))]
    }

    pub fn block_added(&mut self, path: &str, state: BlockState) -> Vec<LifecycleEvent> {
        let mut events = vec![LifecycleEvent::VolumeAdded(volume_ref(path, &state))];
        if state.mount_point.is_some() {
            events.push(LifecycleEvent::MountAdded(mount_ref(path, &state)));
        }
        self.blocks.insert(path.to_string(), state);
        events
    }

    pub fn block_removed(&mut self, path: &str) -> Vec<LifecycleEvent> {
        let Some(state) = self.blocks.remove(path) else {
            return Vec::new();
        };

        let mut events = Vec::new();
        if state.mount_point.is_some() {
            events.push(LifecycleEvent::MountRemoved(mount_ref(path, &state)));
        }
        events.push(LifecycleEvent::VolumeRemoved(volume_ref(path, &state)));
        events
    }

    /// Apply a new mount point (or none) for a known block.
    ///
    /// Only mounted/unmounted transitions produce events. A change between two
    /// mount points is reported as an unmount followed by a mount.
    pub fn mount_point_changed(
        &mut self,
        path: &str,
        mount_point: Option<String>,
    ) -> Vec<LifecycleEvent> {
        let Some(state) = self.blocks.get_mut(path) else {
            return Vec::new();
        };
        if state.mount_point == mount_point {
            return Vec::new();
        }

        let mut events = Vec::new();
        if state.mount_point.is_some() {
            events.push(LifecycleEvent::MountRemoved(mount_ref(path, state)));
        }
        state.mount_point = mount_point;
        if state.mount_point.is_some() {
            events.push(LifecycleEvent::MountAdded(mount_ref(path, state)));
        }
        events
    }

    /// A UDisks2 job started on `objects`.
    ///
    /// Unmounting jobs produce one pre-unmount per filesystem they touch.
    /// A job naming a filesystem block always covers it, even if its mount
    /// point is already gone from our view. A job naming a drive covers the
    /// drive's mounted filesystems, or all of its filesystems when none is
    /// mounted any more.
    pub fn job_started(&self, operation: &str, objects: &[String]) -> Vec<LifecycleEvent> {
        if !UNMOUNTING_JOBS.contains(&operation) {
            return Vec::new();
        }

        let mut paths: Vec<&String> = Vec::new();
        for object in objects {
            if let Some((path, _)) = self.blocks.get_key_value(object) {
                paths.push(path);
                continue;
            }

            let on_drive: Vec<(&String, &BlockState)> = self
                .blocks
                .iter()
                .filter(|(_, state)| {
                    state
                        .drive
                        .as_ref()
                        .is_some_and(|d| d.as_str() == object.as_str())
                })
                .collect();
            let any_mounted = on_drive.iter().any(|(_, state)| state.mount_point.is_some());
            paths.extend(
                on_drive
                    .into_iter()
                    .filter(|(_, state)| !any_mounted || state.mount_point.is_some())
                    .map(|(path, _)| path),
            );
        }
        paths.sort();
        paths.dedup();

        paths
            .into_iter()
            .map(|path| LifecycleEvent::PreUnmount(mount_ref(path, &self.blocks[path])))
            .collect()
    }
}

fn volume_ref(path: &str, state: &BlockState) -> VolumeRef {
    VolumeRef {
        object_path: path.to_string(),
        name: state.name.clone(),
        drive: state.drive.clone(),
    }
}

fn mount_ref(path: &str, state: &BlockState) -> MountRef {
    MountRef {
        volume: path.to_string(),
        mount_point: state.mount_point.clone(),
        drive: state.drive.clone(),
    }
}

pub(crate) fn object_basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
