// SPDX-License-Identifier: GPL-3.0-only

use anyhow::Result;
use ejecter_contracts::LifecycleEvent;
use ejecter_types::{DriveInfo, DriveKey, MountInfo};
use futures::StreamExt;
use futures::stream::Stream;
use futures::task::{Context, Poll};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use zbus::{
    Connection, MatchRule, Message, MessageStream,
    message::Type as MessageType,
    zvariant::{self, OwnedObjectPath, OwnedValue, Value},
};
use zbus_macros::proxy;

use super::translator::EventTranslator;
use crate::disk::{discovery, power};
use crate::error::DiskError;

const UDISKS2_SERVICE: &str = "org.freedesktop.UDisks2";
const UDISKS2_ROOT: &str = "/org/freedesktop/UDisks2";
const OBJECT_MANAGER_IFACE: &str = "org.freedesktop.DBus.ObjectManager";
const PROPERTIES_IFACE: &str = "org.freedesktop.DBus.Properties";
const BLOCK_IFACE: &str = "org.freedesktop.UDisks2.Block";
const FILESYSTEM_IFACE: &str = "org.freedesktop.UDisks2.Filesystem";
const DRIVE_IFACE: &str = "org.freedesktop.UDisks2.Drive";
const JOB_IFACE: &str = "org.freedesktop.UDisks2.Job";

#[proxy(
    default_service = "org.freedesktop.UDisks2",
    default_path = "/org/freedesktop/UDisks2/Manager",
    interface = "org.freedesktop.UDisks2.Manager"
)]
pub trait UDisks2Manager {
    fn get_block_devices(
        &self,
        options: HashMap<String, Value<'_>>,
    ) -> zbus::Result<Vec<zvariant::OwnedObjectPath>>;
}

/// Entry point to the UDisks2 daemon on the system bus.
#[derive(Clone)]
pub struct DiskManager {
    connection: Connection,
}

/// Lifecycle events translated from UDisks2 signals.
pub struct VolumeEventStream {
    receiver: mpsc::Receiver<LifecycleEvent>,
}

/// The UDisks2 signals the translator cares about, decoded from the wire.
#[derive(Debug)]
pub(crate) enum UdisksSignal {
    InterfacesAdded {
        object_path: OwnedObjectPath,
        interfaces: HashMap<String, HashMap<String, OwnedValue>>,
    },
    InterfacesRemoved {
        object_path: String,
        interfaces: Vec<String>,
    },
    /// `Filesystem.MountPoints` changed on this block object
    MountPointsChanged { object_path: String },
}

impl DiskManager {
    pub async fn new() -> Result<Self> {
        let connection = Connection::system()
            .await
            .map_err(|e| DiskError::ConnectionFailed(e.to_string()))?;
        Ok(Self { connection })
    }

    pub async fn drives(&self) -> Result<Vec<DriveInfo>> {
        discovery::get_drives(&self.connection).await
    }

    pub async fn mounts(&self) -> Result<Vec<MountInfo>> {
        discovery::get_mounts(&self.connection).await
    }

    pub async fn eject(&self, drive: &DriveKey) -> Result<()> {
        power::eject_drive(&self.connection, drive.as_str()).await
    }

    /// A signal-based stream of lifecycle events.
    ///
    /// One match rule covers every UDisks2 signal: `InterfacesAdded` /
    /// `InterfacesRemoved` for drives, filesystems and jobs, and
    /// `PropertiesChanged` for mount points. Signals are handled one at a time
    /// in the order the daemon sent them, so an unmount job is translated
    /// before the mount point change that follows it.
    ///
    /// The stream's view is seeded from the current state before any signal
    /// is processed, so removals of pre-existing objects are reported too.
    pub async fn volume_event_stream(&self) -> Result<VolumeEventStream> {
        let (sender, receiver) = mpsc::channel(64);
        let connection = self.connection.clone();

        let rule = MatchRule::builder()
            .msg_type(MessageType::Signal)
            .sender(UDISKS2_SERVICE)?
            .path_namespace(UDISKS2_ROOT)?
            .build();
        let mut signals = MessageStream::for_match_rule(rule, &connection, None).await?;

        let mut translator = EventTranslator::new();
        seed_translator(&connection, &mut translator).await?;

        tokio::spawn(async move {
            while let Some(message) = signals.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        warn!("Failed to read UDisks2 signal: {e}");
                        continue;
                    }
                };
                let Some(signal) = decode_signal(&message) else {
                    continue;
                };

                for event in on_signal(&connection, &mut translator, signal).await {
                    if let Err(e) = sender.send(event).await {
                        warn!("Volume event receiver dropped: {e}");
                        return;
                    }
                }
            }
            debug!("UDisks2 signal stream closed");
        });

        Ok(VolumeEventStream { receiver })
    }
}

/// Decode the signals we act on; everything else yields `None`.
pub(crate) fn decode_signal(message: &Message) -> Option<UdisksSignal> {
    let header = message.header();
    let interface = header.interface()?.to_string();
    let member = header.member()?.to_string();
    let path = header.path()?.to_string();
    let body = message.body();

    match (interface.as_str(), member.as_str()) {
        (OBJECT_MANAGER_IFACE, "InterfacesAdded") => {
            match body.deserialize::<(OwnedObjectPath, HashMap<String, HashMap<String, OwnedValue>>)>() {
                Ok((object_path, interfaces)) => Some(UdisksSignal::InterfacesAdded {
                    object_path,
                    interfaces,
                }),
                Err(e) => {
                    warn!("Failed to parse InterfacesAdded signal args: {e}");
                    None
                }
            }
        }
        (OBJECT_MANAGER_IFACE, "InterfacesRemoved") => {
            match body.deserialize::<(OwnedObjectPath, Vec<String>)>() {
                Ok((object_path, interfaces)) => Some(UdisksSignal::InterfacesRemoved {
                    object_path: object_path.to_string(),
                    interfaces,
                }),
                Err(e) => {
                    warn!("Failed to parse InterfacesRemoved signal args: {e}");
                    None
                }
            }
        }
        (PROPERTIES_IFACE, "PropertiesChanged") => {
            let (changed_interface, changed, _invalidated) = body
                .deserialize::<(String, HashMap<String, OwnedValue>, Vec<String>)>()
                .ok()?;
            (changed_interface == FILESYSTEM_IFACE && changed.contains_key("MountPoints"))
                .then_some(UdisksSignal::MountPointsChanged { object_path: path })
        }
        _ => None,
    }
}

async fn on_signal(
    connection: &Connection,
    translator: &mut EventTranslator,
    signal: UdisksSignal,
) -> Vec<LifecycleEvent> {
    match signal {
        UdisksSignal::InterfacesAdded {
            object_path,
            interfaces,
        } => on_interfaces_added(connection, translator, &object_path, &interfaces).await,
        UdisksSignal::InterfacesRemoved {
            object_path,
            interfaces,
        } => on_interfaces_removed(translator, &object_path, &interfaces),
        UdisksSignal::MountPointsChanged { object_path } => {
            on_mount_points_changed(connection, translator, &object_path).await
        }
    }
}

async fn seed_translator(connection: &Connection, translator: &mut EventTranslator) -> Result<()> {
    for block in discovery::probe_all_blocks(connection).await? {
        if block.has_filesystem {
            translator.seed_block(&block.object_path, block.to_block_state());
        }
    }
    for drive in discovery::get_drives(connection).await? {
        translator.seed_drive(drive.key.as_str(), drive.name);
    }
    Ok(())
}

async fn on_interfaces_added(
    connection: &Connection,
    translator: &mut EventTranslator,
    object_path: &OwnedObjectPath,
    interfaces: &HashMap<String, HashMap<String, OwnedValue>>,
) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();

    if interfaces.contains_key(DRIVE_IFACE) {
        let name = match discovery::probe_drive(connection, object_path.as_str()).await {
            Ok(probe) => probe.display_name(None),
            Err(e) => {
                debug!("Could not probe new drive {}: {e}", object_path.as_str());
                super::translator::object_basename(object_path.as_str()).to_string()
            }
        };
        events.extend(translator.drive_added(object_path.as_str(), name));
    }

    if (interfaces.contains_key(FILESYSTEM_IFACE) || interfaces.contains_key(BLOCK_IFACE))
        && !translator.knows_block(object_path.as_str())
    {
        match discovery::probe_block(connection, object_path).await {
            Ok(probe) if probe.has_filesystem => {
                events.extend(translator.block_added(&probe.object_path, probe.to_block_state()));
            }
            Ok(_) => {}
            Err(e) => debug!("Could not probe new block {}: {e}", object_path.as_str()),
        }
    }

    if let Some(job) = interfaces.get(JOB_IFACE)
        && let Some((operation, objects)) = parse_job(job)
    {
        debug!("UDisks2 job {operation} started on {objects:?}");
        events.extend(translator.job_started(&operation, &objects));
    }

    events
}

fn on_interfaces_removed(
    translator: &mut EventTranslator,
    object_path: &str,
    interfaces: &[String],
) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();

    if interfaces
        .iter()
        .any(|i| i == FILESYSTEM_IFACE || i == BLOCK_IFACE)
    {
        events.extend(translator.block_removed(object_path));
    }
    if interfaces.iter().any(|i| i == DRIVE_IFACE) {
        events.extend(translator.drive_removed(object_path));
    }

    events
}

async fn on_mount_points_changed(
    connection: &Connection,
    translator: &mut EventTranslator,
    path: &str,
) -> Vec<LifecycleEvent> {
    if !translator.knows_block(path) {
        let Ok(object_path) = OwnedObjectPath::try_from(path) else {
            return Vec::new();
        };
        return match discovery::probe_block(connection, &object_path).await {
            Ok(probe) if probe.has_filesystem => {
                translator.block_added(&probe.object_path, probe.to_block_state())
            }
            _ => Vec::new(),
        };
    }

    match discovery::mount_points(connection, path).await {
        Ok(mount_points) => translator.mount_point_changed(path, mount_points.into_iter().next()),
        Err(e) => {
            debug!("Could not read mount points of {path}: {e}");
            Vec::new()
        }
    }
}

/// Pull the operation and target objects out of a Job's initial properties.
pub(crate) fn parse_job(properties: &HashMap<String, OwnedValue>) -> Option<(String, Vec<String>)> {
    let operation = match &**properties.get("Operation")? {
        Value::Str(s) => s.to_string(),
        _ => return None,
    };

    let objects = match properties.get("Objects").map(|v| &**v) {
        Some(Value::Array(array)) => array
            .iter()
            .filter_map(|item| match item {
                Value::ObjectPath(path) => Some(path.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    };

    Some((operation, objects))
}

impl Stream for VolumeEventStream {
    type Item = LifecycleEvent;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}
