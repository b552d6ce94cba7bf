// SPDX-License-Identifier: GPL-3.0-only

//! Lifecycle event dispatch

use std::sync::Arc;

use ejecter_contracts::{LifecycleEvent, Notifier, StorageError, VolumeMonitor};
use ejecter_types::Notice;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::DriveRegistry;
use crate::tracker::EjectTracker;

/// Process-wide eject bookkeeping and the handlers that drive it.
///
/// Create it with [`Ejecter::new`], feed every event from the returned
/// receiver into [`Ejecter::handle`], and call [`Ejecter::shutdown`] on exit.
pub struct Ejecter {
    pub(crate) monitor: Arc<dyn VolumeMonitor>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) events: mpsc::UnboundedSender<LifecycleEvent>,
    pub(crate) registry: DriveRegistry,
    pub(crate) tracker: EjectTracker,
    subscription: Option<JoinHandle<()>>,
}

impl Ejecter {
    /// Build an ejecter and the receiving end of its event channel.
    ///
    /// Volume-monitor events (once [`initialize`](Self::initialize)d) and eject
    /// completions are both delivered on the returned receiver.
    pub fn new(
        monitor: Arc<dyn VolumeMonitor>,
        notifier: Arc<dyn Notifier>,
    ) -> (Self, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        (
            Self {
                monitor,
                notifier,
                events,
                registry: DriveRegistry::new(),
                tracker: EjectTracker::new(),
                subscription: None,
            },
            receiver,
        )
    }

    /// Subscribe to the volume monitor and record the drives mounted right now.
    ///
    /// The subscription is set up first so no mount is missed between the
    /// snapshot and the first event.
    pub async fn initialize(&mut self) -> Result<(), StorageError> {
        let mut stream = self.monitor.subscribe().await?;
        let sender = self.events.clone();
        self.subscription = Some(tokio::spawn(async move {
            while let Some(event) = stream.next().await {
                if sender.send(event).is_err() {
                    break;
                }
            }
            debug!("Volume monitor event stream ended");
        }));

        let mounted = self.registry.init_from_current_mounts(&*self.monitor).await?;
        info!("Ejecter initialized with {mounted} mounted drive(s)");
        Ok(())
    }

    /// Stop listening and drop all tracking state.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.subscription.take() {
            task.abort();
        }
        info!(
            "Ejecter shutting down ({} mounted, {} pending eject(s))",
            self.registry.len(),
            self.tracker.len()
        );
        self.registry.clear();
        self.tracker.clear();
    }

    /// Apply one event. Returns true when the set of ejectable drives may have
    /// changed and the panel should refresh.
    pub async fn handle(&mut self, event: LifecycleEvent) -> bool {
        debug!("{event}");

        match event {
            LifecycleEvent::MountAdded(mount) => {
                self.registry.record_mount(mount.drive.as_ref());
                true
            }
            LifecycleEvent::PreUnmount(mount) => {
                if let Some(drive) = mount.drive {
                    self.tracker.begin_tracked_eject(drive);
                }
                false
            }
            LifecycleEvent::DriveRemoved(drive) => {
                // Both reads are destructive and must run before deciding.
                let was_mounted = self.registry.was_mounted(&drive.key);
                let was_ejected = self
                    .tracker
                    .consume_if_tracked(&drive.key, &*self.notifier)
                    .await;

                if was_mounted && !was_ejected {
                    info!("{} was removed without ejecting", drive.name);
                    if let Err(e) = self.notifier.notify(&Notice::removed_unsafely()).await {
                        warn!("Failed to show unsafe removal warning: {e}");
                    }
                }
                true
            }
            LifecycleEvent::EjectCompleted { drive, result } => {
                self.on_eject_complete(drive, result).await;
                false
            }
            LifecycleEvent::MountRemoved(_)
            | LifecycleEvent::VolumeAdded(_)
            | LifecycleEvent::VolumeRemoved(_)
            | LifecycleEvent::DriveConnected(_) => true,
        }
    }

    pub fn registry(&self) -> &DriveRegistry {
        &self.registry
    }

    pub fn tracker(&self) -> &EjectTracker {
        &self.tracker
    }
}

impl Drop for Ejecter {
    fn drop(&mut self) {
        if let Some(task) = self.subscription.take() {
            task.abort();
        }
    }
}
