// SPDX-License-Identifier: GPL-3.0-only

//! Drive and mount discovery - builds ejecter_types::DriveInfo and MountInfo directly from UDisks2.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use ejecter_types::{DriveInfo, DriveKey, MountInfo, VolumeInfo};
use udisks2::{
    block::BlockProxy, drive::DriveProxy, filesystem::FilesystemProxy, partition::PartitionProxy,
};
use zbus::Connection;
use zbus::zvariant::OwnedObjectPath;

use crate::dbus::bytestring as bs;
use crate::manager::UDisks2ManagerProxy;
use crate::manager::translator::{BlockState, object_basename};

/// Everything the ejecter needs to know about one block object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockProbe {
    pub object_path: String,
    pub device: String,
    pub drive: Option<DriveKey>,
    pub label: Option<String>,
    pub icon: Option<String>,
    pub hint_ignore: bool,
    pub is_partition: bool,
    pub has_filesystem: bool,
    pub mount_points: Vec<String>,
}

impl BlockProbe {
    /// Name shown for the volume: label, then the hinted name, then the device node.
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| object_basename(&self.device).to_string())
    }

    pub fn is_mounted(&self) -> bool {
        !self.mount_points.is_empty()
    }

    pub fn to_block_state(&self) -> BlockState {
        BlockState {
            drive: self.drive.clone(),
            name: self.display_name(),
            mount_point: self.mount_points.first().cloned(),
        }
    }

    fn to_volume(&self) -> VolumeInfo {
        VolumeInfo {
            object_path: self.object_path.clone(),
            device: self.device.clone(),
            name: self.label.clone(),
            mount_points: self.mount_points.clone(),
        }
    }
}

/// Drive properties relevant to ejecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveProbe {
    pub object_path: String,
    pub vendor: String,
    pub model: String,
    pub removable: bool,
    pub media_removable: bool,
    pub ejectable: bool,
    pub can_power_off: bool,
    pub optical: bool,
}

impl DriveProbe {
    /// Only drives the user can physically take away are tracked.
    pub fn is_removable(&self) -> bool {
        self.removable || self.media_removable || self.ejectable
    }

    pub fn display_name(&self, fallback_device: Option<&str>) -> String {
        let name = format!("{} {}", self.vendor.trim(), self.model.trim());
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }

        match fallback_device {
            Some(device) => object_basename(device).to_string(),
            None => object_basename(&self.object_path).to_string(),
        }
    }

    pub fn fallback_icon(&self) -> &'static str {
        if self.optical {
            "media-optical"
        } else if self.is_removable() {
            "drive-removable-media"
        } else {
            "drive-harddisk"
        }
    }
}

async fn block_device_path(block_proxy: &BlockProxy<'_>, block_path: &str) -> Result<String> {
    let preferred = bs::decode_c_string_bytes(
        &block_proxy
            .preferred_device()
            .await
            .map_err(anyhow::Error::msg)?,
    );
    let device = if preferred.is_empty() {
        bs::decode_c_string_bytes(&block_proxy.device().await.map_err(anyhow::Error::msg)?)
    } else {
        preferred
    };
    Ok(if device.is_empty() {
        block_path.to_string()
    } else {
        device
    })
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim().to_string();
    if value.is_empty() { None } else { Some(value) }
}

fn drive_key(path: &OwnedObjectPath) -> Option<DriveKey> {
    (path.as_str() != "/").then(|| DriveKey::new(path.as_str()))
}

/// Resolve the drive a block belongs to.
///
/// Unlocked LUKS cleartext devices are not linked to a drive, so their
/// backing device is followed instead.
async fn owning_drive(connection: &Connection, block_proxy: &BlockProxy<'_>) -> Option<DriveKey> {
    if let Some(drive) = block_proxy.drive().await.ok().as_ref().and_then(drive_key) {
        return Some(drive);
    }

    let backing = block_proxy.crypto_backing_device().await.ok()?;
    if backing.as_str() == "/" {
        return None;
    }
    let backing_proxy = BlockProxy::builder(connection)
        .path(backing)
        .ok()?
        .build()
        .await
        .ok()?;
    backing_proxy.drive().await.ok().as_ref().and_then(drive_key)
}

/// Read one block object.
pub async fn probe_block(connection: &Connection, path: &OwnedObjectPath) -> Result<BlockProbe> {
    let block_proxy = BlockProxy::builder(connection).path(path)?.build().await?;

    let device = block_device_path(&block_proxy, path.as_str()).await?;
    let drive = owning_drive(connection, &block_proxy).await;

    let id_label = block_proxy.id_label().await.unwrap_or_default();
    let hint_name = block_proxy.hint_name().await.unwrap_or_default();
    let label = non_empty(id_label).or_else(|| non_empty(hint_name));
    let icon = non_empty(block_proxy.hint_icon_name().await.unwrap_or_default());
    let hint_ignore = block_proxy.hint_ignore().await.unwrap_or(false);

    let is_partition = match PartitionProxy::builder(connection).path(path)?.build().await {
        Ok(partition_proxy) => partition_proxy.table().await.is_ok(),
        Err(_) => false,
    };

    let (has_filesystem, mount_points) =
        match FilesystemProxy::builder(connection).path(path)?.build().await {
            Ok(fs_proxy) => match fs_proxy.mount_points().await {
                Ok(raw) => (true, bs::decode_mount_points(raw)),
                Err(_) => (false, Vec::new()),
            },
            Err(_) => (false, Vec::new()),
        };

    Ok(BlockProbe {
        object_path: path.to_string(),
        device,
        drive,
        label,
        icon,
        hint_ignore,
        is_partition,
        has_filesystem,
        mount_points,
    })
}

/// Read the current mount points of a filesystem block.
pub async fn mount_points(connection: &Connection, path: &str) -> Result<Vec<String>> {
    let fs_proxy = FilesystemProxy::builder(connection).path(path)?.build().await?;
    Ok(bs::decode_mount_points(fs_proxy.mount_points().await?))
}

pub async fn probe_drive(connection: &Connection, path: &str) -> Result<DriveProbe> {
    let drive_proxy = DriveProxy::builder(connection).path(path)?.build().await?;

    Ok(DriveProbe {
        object_path: path.to_string(),
        vendor: drive_proxy.vendor().await.unwrap_or_default(),
        model: drive_proxy.model().await.unwrap_or_default(),
        removable: drive_proxy.removable().await?,
        media_removable: drive_proxy.media_removable().await?,
        ejectable: drive_proxy.ejectable().await?,
        can_power_off: drive_proxy.can_power_off().await.unwrap_or(false),
        optical: drive_proxy.optical().await.unwrap_or(false),
    })
}

/// Probe every block UDisks2 knows about. Blocks that vanish mid-scan are skipped.
pub async fn probe_all_blocks(connection: &Connection) -> Result<Vec<BlockProbe>> {
    let manager_proxy = UDisks2ManagerProxy::new(connection).await?;
    let block_paths = manager_proxy.get_block_devices(HashMap::new()).await?;

    let mut probes = Vec::with_capacity(block_paths.len());
    for path in block_paths {
        match probe_block(connection, &path).await {
            Ok(probe) => probes.push(probe),
            Err(e) => tracing::info!("Could not probe block device {}: {}", path.as_str(), e),
        }
    }

    Ok(probes)
}

/// Group probed blocks into removable drives.
pub fn assemble_drives(
    blocks: Vec<BlockProbe>,
    drives: &HashMap<String, DriveProbe>,
) -> Vec<DriveInfo> {
    let mut by_drive: BTreeMap<DriveKey, Vec<BlockProbe>> = BTreeMap::new();
    for block in blocks {
        if block.hint_ignore {
            continue;
        }
        if let Some(key) = block.drive.clone() {
            by_drive.entry(key).or_default().push(block);
        }
    }

    let mut result = Vec::new();
    for (key, mut blocks) in by_drive {
        let Some(drive) = drives.get(key.as_str()) else {
            continue;
        };
        if !drive.is_removable() {
            continue;
        }

        blocks.sort_by(|a, b| a.device.cmp(&b.device));
        let whole_disk = blocks.iter().find(|b| !b.is_partition);
        let device = whole_disk.map(|b| b.device.clone());
        let icon = blocks
            .iter()
            .find_map(|b| b.icon.clone())
            .unwrap_or_else(|| drive.fallback_icon().to_string());

        result.push(DriveInfo {
            name: drive.display_name(device.as_deref()),
            key,
            icon,
            device,
            volumes: blocks
                .iter()
                .filter(|b| b.has_filesystem)
                .map(BlockProbe::to_volume)
                .collect(),
        });
    }

    result
}

/// Connected removable drives with their volumes.
pub async fn get_drives(connection: &Connection) -> Result<Vec<DriveInfo>> {
    let blocks = probe_all_blocks(connection).await?;

    let mut drives = HashMap::new();
    for key in blocks.iter().filter_map(|b| b.drive.as_ref()) {
        if drives.contains_key(key.as_str()) {
            continue;
        }
        match probe_drive(connection, key.as_str()).await {
            Ok(probe) => {
                drives.insert(key.as_str().to_string(), probe);
            }
            Err(e) => tracing::info!("Could not probe drive {key}: {e}"),
        }
    }

    Ok(assemble_drives(blocks, &drives))
}

/// Every mounted filesystem, one entry per mount point.
pub async fn get_mounts(connection: &Connection) -> Result<Vec<MountInfo>> {
    let blocks = probe_all_blocks(connection).await?;

    Ok(blocks
        .into_iter()
        .flat_map(|block| {
            let drive = block.drive.clone();
            let volume = block.object_path.clone();
            block
                .mount_points
                .into_iter()
                .map(move |mount_point| MountInfo {
                    volume: volume.clone(),
                    mount_point,
                    drive: drive.clone(),
                })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DRIVE: &str = "/org/freedesktop/UDisks2/drives/Kingston_DataTraveler_3_0_1";

    fn block(name: &str, partition: bool, mount: Option<&str>) -> BlockProbe {
        BlockProbe {
            object_path: format!("/org/freedesktop/UDisks2/block_devices/{name}"),
            device: format!("/dev/{name}"),
            drive: Some(DriveKey::from(DRIVE)),
            label: None,
            icon: None,
            hint_ignore: false,
            is_partition: partition,
            has_filesystem: partition,
            mount_points: mount.map(|m| vec![m.to_string()]).unwrap_or_default(),
        }
    }

    fn drive(removable: bool) -> DriveProbe {
        DriveProbe {
            object_path: DRIVE.to_string(),
            vendor: "Kingston".to_string(),
            model: "DataTraveler 3.0".to_string(),
            removable,
            media_removable: false,
            ejectable: false,
            can_power_off: true,
            optical: false,
        }
    }

    #[test]
    fn assembles_removable_drive_with_whole_disk_device() {
        let blocks = vec![
            block("sdb1", true, Some("/media/user/KINGSTON")),
            block("sdb", false, None),
        ];
        let drives = HashMap::from([(DRIVE.to_string(), drive(true))]);

        let assembled = assemble_drives(blocks, &drives);
        assert_eq!(assembled.len(), 1);

        let info = &assembled[0];
        assert_eq!(info.name, "Kingston DataTraveler 3.0");
        assert_eq!(info.device.as_deref(), Some("/dev/sdb"));
        assert_eq!(info.icon, "drive-removable-media");
        assert_eq!(info.volumes.len(), 1);
        assert!(info.is_mounted());
    }

    #[test]
    fn fixed_and_ignored_drives_are_skipped() {
        let drives = HashMap::from([(DRIVE.to_string(), drive(false))]);
        assert!(assemble_drives(vec![block("sda", false, None)], &drives).is_empty());

        let drives = HashMap::from([(DRIVE.to_string(), drive(true))]);
        let mut ignored = block("sdb", false, None);
        ignored.hint_ignore = true;
        assert!(assemble_drives(vec![ignored], &drives).is_empty());
    }

    #[test]
    fn display_name_falls_back_to_device() {
        let mut probe = drive(true);
        probe.vendor = " ".to_string();
        probe.model = String::new();

        assert_eq!(probe.display_name(Some("/dev/sdb")), "sdb");
        assert_eq!(probe.display_name(None), "Kingston_DataTraveler_3_0_1");
    }

    #[test]
    fn block_state_uses_first_mount_point() {
        let mut probe = block("sdb1", true, Some("/mnt/a"));
        probe.mount_points.push("/mnt/b".to_string());
        probe.label = Some("DATA".to_string());

        let state = probe.to_block_state();
        assert_eq!(state.name, "DATA");
        assert_eq!(state.mount_point.as_deref(), Some("/mnt/a"));
    }
}
