// SPDX-License-Identifier: GPL-3.0-only

mod common;

use std::sync::Arc;

use common::*;
use ejecter_contracts::LifecycleEvent;
use ejecter_core::Ejecter;
use ejecter_types::NoticeKind;

#[tokio::test]
async fn requested_eject_completes_through_the_event_channel() {
    let monitor = Arc::new(FakeMonitor::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let (mut ejecter, mut events) = Ejecter::new(monitor.clone(), notifier.clone());

    ejecter.handle(mount_added("stick")).await;
    ejecter.request_eject(drive_ref("stick"));
    // The OS starts unmounting before the eject call returns.
    ejecter.handle(pre_unmount("stick")).await;

    let completion = events.recv().await.unwrap();
    assert!(matches!(
        &completion,
        LifecycleEvent::EjectCompleted { result: Ok(()), .. }
    ));
    ejecter.handle(completion).await;

    assert_eq!(monitor.ejected(), vec![key("stick")]);
    assert_eq!(notifier.shown()[0].text, "stick has been ejected\nIt is now safe to remove the device");

    ejecter.handle(drive_removed("stick")).await;
    assert_eq!(notifier.cleared().len(), 1);
    assert_eq!(notifier.count(NoticeKind::RemovedUnsafely), 0);
}

#[tokio::test]
async fn failed_request_reports_failure() {
    let monitor = Arc::new(FakeMonitor::new());
    monitor.fail_eject("stick", "Device is busy. Unmount any volumes on it and try again.");
    let notifier = Arc::new(RecordingNotifier::default());
    let (mut ejecter, mut events) = Ejecter::new(monitor.clone(), notifier.clone());

    ejecter.request_eject(drive_ref("stick"));
    let completion = events.recv().await.unwrap();
    ejecter.handle(completion).await;

    assert_eq!(notifier.count(NoticeKind::EjectFailed), 1);
    assert!(notifier.shown()[0].text.ends_with("try again."));
    assert!(ejecter.tracker().is_empty());
}

#[tokio::test]
async fn eject_by_device_finds_the_connected_drive() {
    let monitor = Arc::new(FakeMonitor::new().with_drives(vec![
        drive_info("stick", "/dev/sdb", true),
        drive_info("card", "/dev/mmcblk0", true),
    ]));
    let notifier = Arc::new(RecordingNotifier::default());
    let (ejecter, mut events) = Ejecter::new(monitor.clone(), notifier);

    assert!(ejecter.request_eject_by_device("/dev/mmcblk0").await.unwrap());
    assert!(!ejecter.request_eject_by_device("/dev/sdz").await.unwrap());

    let LifecycleEvent::EjectCompleted { drive, .. } = events.recv().await.unwrap() else {
        panic!("expected an eject completion");
    };
    assert_eq!(drive.key, key("card"));
    assert_eq!(monitor.ejected(), vec![key("card")]);
}

#[tokio::test]
async fn external_eject_suppresses_warning_without_ejecting() {
    let monitor = Arc::new(FakeMonitor::new().with_drives(vec![drive_info("stick", "/dev/sdb", true)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let (mut ejecter, _events) = Ejecter::new(monitor.clone(), notifier.clone());

    ejecter.handle(mount_added("stick")).await;
    assert_eq!(ejecter.request_eject_by_identifier("/dev/sdb").await, 1);
    ejecter.handle(drive_removed("stick")).await;

    assert!(monitor.ejected().is_empty());
    assert!(notifier.shown().is_empty());
}

#[tokio::test]
async fn unmatched_command_is_accepted_without_mutation() {
    let monitor = Arc::new(FakeMonitor::new().with_drives(vec![drive_info("stick", "/dev/sdb", true)]));
    let notifier = Arc::new(RecordingNotifier::default());
    let (mut ejecter, _events) = Ejecter::new(monitor, notifier);

    assert!(ejecter.on_command("/dev/sdq").await);
    assert!(ejecter.tracker().is_empty());
    assert!(ejecter.registry().is_empty());

    // Partition nodes do not name the drive.
    assert_eq!(ejecter.request_eject_by_identifier("/dev/sdb1").await, 0);
}

#[tokio::test]
async fn ejectable_drives_lists_mounted_drives_only() {
    let monitor = Arc::new(FakeMonitor::new().with_drives(vec![
        drive_info("stick", "/dev/sdb", true),
        drive_info("empty-reader", "/dev/sdc", false),
    ]));
    let notifier = Arc::new(RecordingNotifier::default());
    let (ejecter, _events) = Ejecter::new(monitor, notifier);

    let drives = ejecter.ejectable_drives().await.unwrap();
    assert_eq!(drives.len(), 1);
    assert_eq!(drives[0].key, key("stick"));
    assert!(ejecter.registry().is_empty());
    assert!(ejecter.tracker().is_empty());
}

#[tokio::test]
async fn monitor_events_are_forwarded_after_initialize() {
    let monitor = Arc::new(FakeMonitor::new());
    let notifier = Arc::new(RecordingNotifier::default());
    let (mut ejecter, mut events) = Ejecter::new(monitor.clone(), notifier.clone());

    ejecter.initialize().await.unwrap();
    monitor.emit(mount_added("stick"));
    monitor.emit(drive_removed("stick"));

    for _ in 0..2 {
        let event = events.recv().await.unwrap();
        ejecter.handle(event).await;
    }
    assert_eq!(notifier.count(NoticeKind::RemovedUnsafely), 1);

    ejecter.shutdown();
    assert!(ejecter.registry().is_empty());
}
