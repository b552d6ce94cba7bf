// SPDX-License-Identifier: GPL-3.0-only

//! User-facing notices
//!
//! The ejecter only ever says three things to the user. Each notice is a
//! short first line (the summary) followed by an explanatory body.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque id of a notification shown by the desktop, used to retract it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationHandle(pub u32);

impl fmt::Display for NotificationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Eject finished; the device can be pulled
    Ejected,
    /// Eject was refused or failed
    EjectFailed,
    /// A mounted drive disappeared without an eject
    RemovedUnsafely,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn ejected(drive_name: &str) -> Self {
        Self {
            kind: NoticeKind::Ejected,
            text: format!("{drive_name} has been ejected\nIt is now safe to remove the device"),
        }
    }

    pub fn eject_failed(drive_name: &str, detail: &str) -> Self {
        Self {
            kind: NoticeKind::EjectFailed,
            text: format!("Failed to eject {drive_name}\n{detail}"),
        }
    }

    pub fn removed_unsafely() -> Self {
        Self {
            kind: NoticeKind::RemovedUnsafely,
            text: "Drive was removed without ejecting\nPlease use menu to eject before removal"
                .to_string(),
        }
    }

    /// First line of the text
    pub fn summary(&self) -> &str {
        self.text.split('\n').next().unwrap_or_default()
    }

    /// Everything after the first line, or an empty string
    pub fn body(&self) -> &str {
        self.text
            .split_once('\n')
            .map(|(_, rest)| rest)
            .unwrap_or_default()
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.kind, NoticeKind::RemovedUnsafely)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ejected_notice_names_the_drive() {
        let notice = Notice::ejected("Cruzer Blade");
        assert_eq!(notice.kind, NoticeKind::Ejected);
        assert_eq!(notice.summary(), "Cruzer Blade has been ejected");
        assert_eq!(notice.body(), "It is now safe to remove the device");
        assert!(!notice.is_warning());
    }

    #[test]
    fn failure_notice_carries_detail() {
        let notice = Notice::eject_failed("Cruzer Blade", "Device is busy");
        assert_eq!(notice.summary(), "Failed to eject Cruzer Blade");
        assert_eq!(notice.body(), "Device is busy");
    }

    #[test]
    fn unsafe_removal_is_a_warning() {
        let notice = Notice::removed_unsafely();
        assert!(notice.is_warning());
        assert_eq!(notice.summary(), "Drive was removed without ejecting");
    }

    #[test]
    fn single_line_text_has_empty_body() {
        let notice = Notice {
            kind: NoticeKind::EjectFailed,
            text: "one line".to_string(),
        };
        assert_eq!(notice.summary(), "one line");
        assert_eq!(notice.body(), "");
    }
}
