#![cfg(feature = "storage-rocksdb")]

mod common;

use common::{MockGateway, PIDX, RecordingOpener, RecordingUpdater, VerifyReply};
use donation_flow::application::coordinator::DonationCoordinator;
use donation_flow::infrastructure::rocksdb::RocksDbCorrelationStore;
use rust_decimal_macros::dec;
use tempfile::tempdir;

fn open_coordinator(
    gateway: &MockGateway,
    updater: &RecordingUpdater,
    path: &std::path::Path,
) -> DonationCoordinator {
    DonationCoordinator::new(
        Box::new(gateway.clone()),
        Box::new(RocksDbCorrelationStore::open(path).unwrap()),
        Box::new(updater.clone()),
        Box::new(RecordingOpener::default()),
    )
}

#[tokio::test]
async fn test_pending_donation_resumes_after_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let gateway = MockGateway::new();
    let updater = RecordingUpdater::default();

    // 1. First run: initiate and leave for the payment page.
    {
        let coordinator = open_coordinator(&gateway, &updater, &db_path);
        coordinator
            .initiate("camp-1", dec!(100), "go team")
            .await
            .unwrap();
    }

    // 2. Second run: the persisted identifier is picked up and verified.
    gateway.push_verify(VerifyReply::success("camp-1", dec!(100)));
    let coordinator = open_coordinator(&gateway, &updater, &db_path);
    let record = coordinator.pending_payment().await.unwrap().unwrap();
    assert_eq!(record.pidx, PIDX);

    let summary = coordinator.check_pending_donation().await.unwrap().unwrap();
    assert_eq!(summary.campaign_id.as_deref(), Some("camp-1"));
    assert_eq!(summary.amount, Some(dec!(100)));
    assert_eq!(updater.calls(), vec![("camp-1".to_string(), dec!(100))]);
    drop(coordinator);

    // 3. Third run: nothing left to resume.
    let coordinator = open_coordinator(&gateway, &updater, &db_path);
    assert!(coordinator.pending_payment().await.unwrap().is_none());
    assert!(coordinator.check_pending_donation().await.unwrap().is_none());
    assert_eq!(gateway.verify_calls(), 1);
}
