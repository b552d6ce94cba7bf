// SPDX-License-Identifier: GPL-3.0-only

use ejecter_types::DriveInfo;
use zbus::proxy;

use crate::client::connection::shared_connection;
use crate::client::error::ClientError;

pub const SERVICE_NAME: &str = "org.cosmic.ext.Ejecter";
pub const CONTROL_PATH: &str = "/org/cosmic/ext/Ejecter";

/// D-Bus proxy for the ejecter control interface
#[proxy(
    interface = "org.cosmic.ext.Ejecter.Control",
    default_service = "org.cosmic.ext.Ejecter",
    default_path = "/org/cosmic/ext/Ejecter"
)]
pub trait ControlInterface {
    /// Declare that `identifier` (e.g. "/dev/sdb") is being ejected by someone else
    async fn mark_ejecting(&self, identifier: &str) -> zbus::Result<bool>;

    /// Eject the connected drive whose device node is `device`
    async fn eject(&self, device: &str) -> zbus::Result<bool>;

    /// JSON array of drives with at least one mounted volume
    async fn list_ejectable(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn icon_visible(&self) -> zbus::Result<bool>;

    /// Emitted whenever the set of ejectable drives may have changed
    #[zbus(signal)]
    async fn drives_changed(&self) -> zbus::Result<()>;
}

/// Client for the ejecter control interface
pub struct ControlClient {
    proxy: ControlInterfaceProxy<'static>,
}

impl ControlClient {
    /// Connect to the running ejecter service
    pub async fn new() -> Result<Self, ClientError> {
        let conn = shared_connection().await?;

        let proxy = ControlInterfaceProxy::new(conn).await.map_err(|e| {
            ClientError::Connection(format!("Failed to create control proxy: {}", e))
        })?;

        Ok(Self { proxy })
    }

    pub async fn mark_ejecting(&self, identifier: &str) -> Result<bool, ClientError> {
        Ok(self.proxy.mark_ejecting(identifier).await?)
    }

    pub async fn eject(&self, device: &str) -> Result<bool, ClientError> {
        Ok(self.proxy.eject(device).await?)
    }

    pub async fn list_ejectable(&self) -> Result<Vec<DriveInfo>, ClientError> {
        let json = self.proxy.list_ejectable().await?;
        serde_json::from_str(&json).map_err(|e| {
            ClientError::ParseError(format!("Failed to parse ejectable drives: {}", e))
        })
    }

    pub async fn icon_visible(&self) -> Result<bool, ClientError> {
        Ok(self.proxy.icon_visible().await?)
    }
}
