// SPDX-License-Identifier: GPL-3.0-only

//! D-Bus client for a running ejecter service

pub mod connection;
pub mod control;
pub mod error;

pub use control::{CONTROL_PATH, ControlClient, SERVICE_NAME};
pub use error::ClientError;
