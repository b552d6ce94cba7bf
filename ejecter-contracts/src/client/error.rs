// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("D-Bus error: {0}")]
    DBus(#[from] zbus::Error),

    #[error("Parse error: {0}")]
    ParseError(String),
}
