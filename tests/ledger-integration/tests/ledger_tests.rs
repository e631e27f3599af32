//! Purchase-request lifecycle over file-backed storage.

use std::collections::HashSet;
use std::fs;

use chemtrade_common::error::{LedgerError, StorageError, TransitionError};
use chemtrade_common::identity::IndustryId;
use chemtrade_common::request::{PurchaseRequest, RequestAction, RequestStatus};
use chemtrade_common::storage::LedgerSlot;

use chemtrade_ledger_integration::harness::TestHarness;
use chemtrade_ledger_integration::{
    demo_directory, make_catalog_request, make_dummy_request, open_file_ledger,
    open_file_ledger_at,
};

#[test]
fn empty_ledger_lists_nothing() {
    let harness = TestHarness::new();
    let ledger = harness.session();
    assert!(ledger.list_requests().is_empty());
    assert!(!harness.slot_file().exists());
}

#[test]
fn ids_are_pairwise_distinct() {
    let harness = TestHarness::new();
    let mut ledger = harness.session();
    let ids: HashSet<_> = (0..50)
        .map(|_| ledger.create_request(make_dummy_request("1")).unwrap().id)
        .collect();
    assert_eq!(ids.len(), 50);
}

#[test]
fn created_requests_start_pending() {
    let harness = TestHarness::new();
    let mut ledger = harness.session();
    for qty in ["1", "5", "2.75"] {
        let req = ledger.create_request(make_dummy_request(qty)).unwrap();
        assert_eq!(req.status, RequestStatus::Pending);
    }
}

#[test]
fn create_then_accept_exposes_contact() {
    let harness = TestHarness::new();
    let mut ledger = harness.session();

    let req = ledger.create_request(make_dummy_request("10")).unwrap();
    assert_eq!(req.product_name, "Sulfuric Acid");
    assert_eq!(req.quantity.as_str(), "10");
    assert_eq!(req.unit.as_str(), "Tons");
    assert_eq!(req.status, RequestStatus::Pending);

    let accepted = ledger.accept(&req.id).unwrap();
    assert_eq!(accepted.status, RequestStatus::Accepted);
    assert_eq!(
        accepted.available_actions(),
        vec![RequestAction::CallBuyer("tel:+919876543210".into())]
    );

    // A new session reading the same file sees the resolution.
    let reread = harness.session();
    assert_eq!(reread.get(&req.id).unwrap().status, RequestStatus::Accepted);
}

#[test]
fn rejected_request_cannot_be_accepted() {
    let harness = TestHarness::new();
    let mut ledger = harness.session();
    let req = ledger.create_request(make_dummy_request("3")).unwrap();
    ledger.reject(&req.id).unwrap();

    let err = ledger.accept(&req.id).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InvalidTransition(TransitionError::AlreadyResolved {
            status: RequestStatus::Rejected,
            ..
        })
    ));
    assert_eq!(ledger.get(&req.id).unwrap().status, RequestStatus::Rejected);
    assert_eq!(
        harness.session().get(&req.id).unwrap().status,
        RequestStatus::Rejected
    );
}

#[test]
fn listing_is_complete_after_creates_and_transitions() {
    let harness = TestHarness::new();
    let directory = demo_directory();
    let mut ledger = harness.session();

    let created: Vec<PurchaseRequest> = [("1", "p1"), ("2", "p4"), ("3", "p6"), ("5", "p9")]
        .into_iter()
        .map(|(i, p)| {
            ledger
                .create_request(make_catalog_request(&directory, i, p, "7"))
                .unwrap()
        })
        .collect();
    ledger.accept(&created[1].id).unwrap();
    ledger.reject(&created[3].id).unwrap();

    let listed = open_file_ledger(harness.root());
    let statuses: Vec<_> = listed.list_requests().iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Pending,
            RequestStatus::Rejected,
        ]
    );
    assert_eq!(listed.list_requests()[1].unit.as_str(), "KL");
}

#[test]
fn stored_file_matches_browser_layout() {
    let harness = TestHarness::new();
    let mut ledger = harness.session();
    let req = ledger.create_request(make_dummy_request("10")).unwrap();

    let raw = fs::read_to_string(harness.slot_file()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &json.as_array().unwrap()[0];
    assert_eq!(record["id"], req.id.0.as_str());
    assert_eq!(record["industryId"], "1");
    assert_eq!(record["industryName"], "Bharat Chemicals Ltd");
    assert_eq!(record["productId"], "p1");
    assert_eq!(record["status"], "pending");
    assert_eq!(record["buyerPhone"], "+91 9876543210");
    assert!(record["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn reads_records_written_by_the_browser_build() {
    let harness = TestHarness::new();
    fs::write(
        harness.slot_file(),
        r#"[{"id":"1718000000000","industryId":"2","industryName":"Gujarat Solvents Pvt Ltd",
            "productId":"p3","productName":"Ethanol","quantity":"25","unit":"Tons",
            "status":"pending","timestamp":"2024-06-10T06:13:20.000Z","buyerPhone":"+91 9876543210"}]"#,
    )
    .unwrap();

    let mut ledger = harness.session();
    assert_eq!(ledger.len(), 1);
    let next = ledger.create_request(make_dummy_request("1")).unwrap();
    assert!(next.id.millis().unwrap() > 1_718_000_000_000);
    ledger.reject(&"1718000000000".into()).unwrap();
}

#[test]
fn corrupt_file_is_reported_not_overwritten() {
    let harness = TestHarness::new();
    fs::write(harness.slot_file(), "not a ledger").unwrap();

    let storage = chemtrade_common::FileStorage::open(harness.root()).unwrap();
    let err = chemtrade_common::RequestLedger::open(storage, &LedgerSlot::Shared)
        .err()
        .unwrap();
    assert!(matches!(
        err,
        LedgerError::Persistence(StorageError::Corrupt { .. })
    ));
    assert_eq!(fs::read_to_string(harness.slot_file()).unwrap(), "not a ledger");
}

#[test]
fn business_ledgers_are_isolated() {
    let seller_a = LedgerSlot::Business(IndustryId::from("1"));
    let harness = TestHarness::with_slot(seller_a);
    let mut a = harness.session();
    a.create_request(make_dummy_request("4")).unwrap();

    let shared = open_file_ledger(harness.root());
    assert!(shared.is_empty());
    assert!(harness.slot_file().ends_with("purchaseRequests/1.json"));
}

#[test]
fn request_lands_in_the_receiving_sellers_ledger() {
    let sender = LedgerSlot::Business(IndustryId::from("1"));
    let harness = TestHarness::with_slot(sender.clone());
    let directory = demo_directory();

    let new = make_catalog_request(&directory, "2", "p3", "5");
    let target = sender.for_owner(&new.industry_id);
    let created = open_file_ledger_at(harness.root(), &target)
        .create_request(new)
        .unwrap();

    let receiver_slot = LedgerSlot::Business(IndustryId::from("2"));
    let receiver = open_file_ledger_at(harness.root(), &receiver_slot);
    assert_eq!(receiver.get(&created.id).unwrap().product_name, "Ethanol");
    assert!(harness.session().is_empty());
    assert!(!harness.slot_file().exists());
}

#[test]
fn concurrent_sessions_do_not_lose_requests() {
    let harness = TestHarness::new();
    let mut buyer = harness.session();
    let mut seller = harness.session();

    let first = buyer.create_request(make_dummy_request("1")).unwrap();
    // The seller session was opened before the buyer wrote, yet resolving
    // the new request works because every mutation re-reads the slot.
    seller.accept(&first.id).unwrap();

    // The buyer's stale in-memory copy must not reopen it.
    let second = buyer.create_request(make_dummy_request("2")).unwrap();

    let fresh = harness.session();
    assert_eq!(fresh.len(), 2);
    assert_eq!(fresh.get(&first.id).unwrap().status, RequestStatus::Accepted);
    assert_eq!(fresh.get(&second.id).unwrap().status, RequestStatus::Pending);
}

#[test]
fn both_sessions_resolving_keeps_the_first_resolution() {
    let harness = TestHarness::new();
    let mut one = harness.session();
    let req = one.create_request(make_dummy_request("9")).unwrap();
    let mut two = harness.session();

    one.accept(&req.id).unwrap();
    let err = two.reject(&req.id).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidTransition(_)));
    assert_eq!(
        harness.session().get(&req.id).unwrap().status,
        RequestStatus::Accepted
    );
}
