// SPDX-License-Identifier: GPL-3.0-only

//! Canonical domain models for COSMIC Ext Ejecter
//!
//! These types are shared across the stack:
//!
//! - **ejecter-udisks**: builds `DriveInfo` and `MountInfo` from UDisks2
//! - **ejecter-core**: keys its lifecycle bookkeeping on `DriveKey`
//! - **ejecter-service**: serializes `DriveInfo` for the panel and renders `Notice`s

pub mod drive;
pub mod notice;

pub use drive::{DriveInfo, DriveKey, MountInfo, VolumeInfo};
pub use notice::{Notice, NoticeKind, NotificationHandle};
