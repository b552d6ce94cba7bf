// SPDX-License-Identifier: GPL-3.0-only

//! Shared D-Bus session bus connection
//!
//! The ejecter service lives on the user's session bus next to the panel, so
//! clients connect there rather than to the system bus.

use std::sync::OnceLock;

use zbus::Connection;

use super::error::ClientError;

static SESSION_CONNECTION: OnceLock<Connection> = OnceLock::new();

/// Get or create the shared session bus connection
pub async fn shared_connection() -> Result<&'static Connection, ClientError> {
    if let Some(conn) = SESSION_CONNECTION.get() {
        return Ok(conn);
    }

    let conn = Connection::session()
        .await
        .map_err(|e| ClientError::Connection(format!("Failed to connect to session bus: {}", e)))?;

    // Another task may have won the race; either connection is fine.
    let _ = SESSION_CONNECTION.set(conn);

    SESSION_CONNECTION.get().ok_or_else(|| {
        ClientError::Connection("Failed to initialize shared session bus connection".to_string())
    })
}
