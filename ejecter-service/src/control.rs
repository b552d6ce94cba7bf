// SPDX-License-Identifier: GPL-3.0-only

//! `org.cosmic.ext.Ejecter.Control`: the panel-facing control interface.
//!
//! Calls are forwarded to the event loop that owns the ejecter and answered
//! through a oneshot channel, so all tracking state stays on one task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use zbus::interface;
use zbus::object_server::SignalEmitter;

use crate::error::{Result, ServiceError};

pub enum ControlRequest {
    MarkEjecting {
        identifier: String,
        reply: oneshot::Sender<bool>,
    },
    Eject {
        device: String,
        reply: oneshot::Sender<Result<bool>>,
    },
    ListEjectable {
        reply: oneshot::Sender<Result<String>>,
    },
}

pub struct ControlHandler {
    requests: mpsc::UnboundedSender<ControlRequest>,
    icon_visible: Arc<AtomicBool>,
}

impl ControlHandler {
    pub fn new(
        requests: mpsc::UnboundedSender<ControlRequest>,
        icon_visible: Arc<AtomicBool>,
    ) -> Self {
        Self {
            requests,
            icon_visible,
        }
    }

    async fn ask<T>(
        &self,
        request: impl FnOnce(oneshot::Sender<T>) -> ControlRequest,
    ) -> Result<T> {
        let (reply, answer) = oneshot::channel();
        self.requests
            .send(request(reply))
            .map_err(|_| ServiceError::ShuttingDown)?;
        answer.await.map_err(|_| ServiceError::ShuttingDown)
    }
}

#[interface(name = "org.cosmic.ext.Ejecter.Control")]
impl ControlHandler {
    /// Emitted whenever the set of ejectable drives may have changed
    #[zbus(signal)]
    pub(crate) async fn drives_changed(signal_ctxt: &SignalEmitter<'_>) -> zbus::Result<()>;

    /// Declare that `identifier` (e.g. "/dev/sdb") is being ejected by someone
    /// else, so its removal is not reported as unsafe. Always accepted.
    async fn mark_ejecting(&self, identifier: String) -> zbus::fdo::Result<bool> {
        tracing::debug!("MarkEjecting({identifier})");
        Ok(self
            .ask(|reply| ControlRequest::MarkEjecting { identifier, reply })
            .await?)
    }

    /// Eject the connected drive whose device node is `device`.
    ///
    /// Returns as soon as the eject has started; the outcome is reported as a
    /// desktop notification.
    async fn eject(&self, device: String) -> zbus::fdo::Result<bool> {
        tracing::debug!("Eject({device})");
        Ok(self
            .ask(|reply| ControlRequest::Eject { device, reply })
            .await??)
    }

    /// JSON array of drives with at least one mounted volume
    async fn list_ejectable(&self) -> zbus::fdo::Result<String> {
        Ok(self
            .ask(|reply| ControlRequest::ListEjectable { reply })
            .await??)
    }

    #[zbus(property)]
    async fn icon_visible(&self) -> bool {
        self.icon_visible.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn requests_are_forwarded_and_answered() {
        let (sender, mut requests) = mpsc::unbounded_channel();
        let handler = ControlHandler::new(sender, Arc::new(AtomicBool::new(false)));

        let serve = tokio::spawn(async move {
            if let Some(ControlRequest::MarkEjecting { identifier, reply }) = requests.recv().await {
                assert_eq!(identifier, "/dev/sdb");
                let _ = reply.send(true);
            }
        });

        assert!(handler.mark_ejecting("/dev/sdb".to_string()).await.unwrap());
        serve.await.unwrap();
    }

    #[tokio::test]
    async fn closed_loop_reports_shutdown() {
        let (sender, requests) = mpsc::unbounded_channel();
        drop(requests);
        let handler = ControlHandler::new(sender, Arc::new(AtomicBool::new(true)));

        let err = handler.list_ejectable().await.unwrap_err();
        assert!(matches!(err, zbus::fdo::Error::Failed(ref m) if m.contains("shutting down")));
        assert!(handler.icon_visible().await);
    }
}
