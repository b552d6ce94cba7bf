// SPDX-License-Identifier: GPL-3.0-only

use ejecter_contracts::{StorageError, StorageErrorKind};
use thiserror::Error;
use zbus::fdo;

/// Service-specific errors
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Ejecter is shutting down")]
    ShuttingDown,
}

impl From<ServiceError> for fdo::Error {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(msg) => fdo::Error::InvalidArgs(msg),
            ServiceError::DeviceNotFound(msg) => {
                fdo::Error::Failed(format!("Device not found: {msg}"))
            }
            ServiceError::NotSupported(msg) => fdo::Error::NotSupported(msg),
            _ => fdo::Error::Failed(err.to_string()),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err.kind {
            StorageErrorKind::InvalidInput => ServiceError::InvalidArgument(err.message),
            StorageErrorKind::NotFound => ServiceError::DeviceNotFound(err.message),
            StorageErrorKind::Unsupported => ServiceError::NotSupported(err.message),
            _ => ServiceError::OperationFailed(err.message),
        }
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ServiceError>;
