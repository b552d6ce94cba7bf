// SPDX-License-Identifier: GPL-3.0-only

//! Drive eject: unmount everything, then eject the media, then power the drive down.

use std::collections::HashMap;

use anyhow::Result;
use udisks2::{drive::DriveProxy, filesystem::FilesystemProxy};
use zbus::{Connection, zvariant::Value};

use super::discovery;
use crate::error::DiskError;

/// Helper to check if error indicates "not supported"
fn is_not_supported(msg: &str) -> bool {
    msg.contains("NotSupported") || msg.contains("not supported") || msg.contains("No such interface")
}

/// Helper to check if error indicates device is busy
fn is_device_busy(msg: &str) -> bool {
    msg.contains("DeviceBusy") || msg.contains("Device or resource busy") || msg.contains("target is busy")
}

/// Map a failed UDisks2 call to the message the user will see.
fn classify(operation: &str, err: udisks2::Error) -> DiskError {
    match err {
        udisks2::Error::DeviceBusy => DiskError::DeviceBusy,
        udisks2::Error::NotSupported => DiskError::NotSupported,
        other => {
            let msg = other.to_string();
            if is_device_busy(&msg) {
                DiskError::DeviceBusy
            } else if is_not_supported(&msg) {
                DiskError::NotSupported
            } else {
                DiskError::OperationFailed(format!("{operation} failed: {msg}"))
            }
        }
    }
}

async fn unmount_filesystem(connection: &Connection, block_path: &str) -> Result<(), DiskError> {
    let fs_proxy = FilesystemProxy::builder(connection)
        .path(block_path)
        .map_err(|e| DiskError::DBusError(e.to_string()))?
        .build()
        .await
        .map_err(|e| DiskError::DBusError(e.to_string()))?;

    let opts: HashMap<&str, Value<'_>> = HashMap::new();
    fs_proxy
        .unmount(opts)
        .await
        .map_err(|e| classify("Unmount", e))
}

/// Eject the drive at `drive_path`.
///
/// Every mounted filesystem on the drive is unmounted first. Media is then
/// ejected if the drive supports it, and the drive is powered off if it can
/// be. Drives that support neither are done once unmounted.
pub async fn eject_drive(connection: &Connection, drive_path: &str) -> Result<()> {
    let drive = discovery::probe_drive(connection, drive_path)
        .await
        .map_err(|_| DiskError::NotFound(drive_path.to_string()))?;
    let proxy = DriveProxy::builder(connection)
        .path(drive_path)?
        .build()
        .await?;

    let blocks = discovery::probe_all_blocks(connection).await?;
    for block in blocks
        .iter()
        .filter(|b| b.is_mounted() && b.drive.as_ref().is_some_and(|d| d.as_str() == drive_path))
    {
        tracing::debug!("Unmounting {} before eject", block.device);
        unmount_filesystem(connection, &block.object_path).await?;
    }

    if drive.ejectable {
        match proxy.eject(HashMap::new()).await.map_err(|e| classify("Eject", e)) {
            Ok(()) => {}
            // Some card readers report ejectable but refuse the call.
            Err(DiskError::NotSupported) if drive.can_power_off => {
                tracing::debug!("Eject not supported for {drive_path}, powering off instead");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if drive.can_power_off {
        proxy
            .power_off(HashMap::new())
            .await
            .map_err(|e| classify("Power off", e))?;
    }

    Ok(())
}
