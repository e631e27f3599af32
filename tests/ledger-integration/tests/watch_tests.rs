use std::time::Duration;

use chemtrade_common::request::RequestStatus;
use chemtrade_common::watch::{ChangeFeed, LedgerChange};

use chemtrade_ledger_integration::harness::TestHarness;
use chemtrade_ledger_integration::make_dummy_request;

const TICK: Duration = Duration::from_millis(20);

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("chemtrade_common=debug")
        .with_test_writer()
        .try_init()
        .ok();
}

/// Poll until at least one change arrives or the attempts run out.
async fn next_changes<F: ChangeFeed>(feed: &mut F) -> Vec<LedgerChange> {
    let mut ticker = tokio::time::interval(feed.poll_interval());
    for _ in 0..50 {
        ticker.tick().await;
        let changes = feed.poll_changes().expect("poll succeeds");
        if !changes.is_empty() {
            return changes;
        }
    }
    Vec::new()
}

#[tokio::test]
async fn watcher_sees_request_from_another_session() {
    init_tracing();
    let harness = TestHarness::new();
    let mut feed = harness.watcher().with_interval(TICK);
    assert!(feed.poll_changes().unwrap().is_empty());

    let buyer = harness.session();
    let writer = tokio::spawn(async move {
        let mut buyer = buyer;
        tokio::time::sleep(TICK * 2).await;
        buyer.create_request(make_dummy_request("10")).unwrap()
    });

    let changes = next_changes(&mut feed).await;
    let created = writer.await.unwrap();
    assert_eq!(changes, vec![LedgerChange::Created(created)]);
    assert_eq!(feed.snapshot().len(), 1);
}

#[tokio::test]
async fn watcher_sees_resolution_from_another_session() {
    init_tracing();
    let harness = TestHarness::new();
    let req = harness
        .session()
        .create_request(make_dummy_request("5"))
        .unwrap();

    let mut feed = harness.watcher().with_interval(TICK);
    assert_eq!(feed.snapshot().len(), 1);

    harness.session().reject(&req.id).unwrap();

    let changes = next_changes(&mut feed).await;
    assert_eq!(changes.len(), 1);
    match &changes[0] {
        LedgerChange::Resolved(r) => {
            assert_eq!(r.id, req.id);
            assert_eq!(r.status, RequestStatus::Rejected);
        }
        other => panic!("expected a resolution, got {other:?}"),
    }
    assert!(feed.poll_changes().unwrap().is_empty());
}

#[tokio::test]
async fn watcher_keeps_resolution_when_writer_is_stale() {
    init_tracing();
    let harness = TestHarness::new();
    let mut stale = harness.session();
    let req = stale.create_request(make_dummy_request("1")).unwrap();

    let mut feed = harness.watcher().with_interval(TICK);
    feed.ledger_mut().accept(&req.id).unwrap();
    assert_eq!(next_changes(&mut feed).await.len(), 1);

    // The stale session still holds the request as pending in memory.
    stale.create_request(make_dummy_request("2")).unwrap();

    let changes = next_changes(&mut feed).await;
    assert_eq!(changes.len(), 1);
    assert!(matches!(&changes[0], LedgerChange::Created(r) if r.quantity.as_str() == "2"));
    let accepted = feed
        .snapshot()
        .iter()
        .find(|r| r.id == req.id)
        .unwrap();
    assert_eq!(accepted.status, RequestStatus::Accepted);
}
