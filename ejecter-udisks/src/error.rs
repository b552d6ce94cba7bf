// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiskError {
    #[error("Failed to connect to system bus: {0}")]
    ConnectionFailed(String),

    #[error("D-Bus error: {0}")]
    DBusError(String),

    #[error("Not supported by this drive")]
    NotSupported,

    #[error("Device is busy. Unmount any volumes on it and try again.")]
    DeviceBusy,

    #[error("Drive not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    OperationFailed(String),
}
