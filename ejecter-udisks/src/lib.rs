// SPDX-License-Identifier: GPL-3.0-only

mod dbus;

// Error types
pub mod error;

pub mod disk;
pub mod manager;

// Re-export key types
pub use manager::{DiskManager, EventTranslator, VolumeEventStream};

pub use error::DiskError;

pub use disk::{
    discovery::{BlockProbe, DriveProbe, get_drives, get_mounts, probe_all_blocks, probe_block},
    power::eject_drive,
};

// Explicit exports from dbus module (DBus byte string decoding)
pub use dbus::bytestring::{decode_c_string_bytes, decode_mount_points};
