use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::ledger::{LedgerSummary, RequestLedger};
use crate::request::PurchaseRequest;
use crate::storage::LedgerStorage;

/// How often a listing view re-reads the ledger.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// A change observed since the previous poll.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerChange {
    /// A request not seen before.
    Created(PurchaseRequest),
    /// A request seen as pending that has since been accepted or rejected.
    Resolved(PurchaseRequest),
}

impl LedgerChange {
    pub fn request(&self) -> &PurchaseRequest {
        match self {
            LedgerChange::Created(r) | LedgerChange::Resolved(r) => r,
        }
    }
}

/// Source of ledger freshness for a display.
///
/// Polling is the only mechanism here; a push-based source can implement the
/// same trait and the display does not need to know which one it has.
pub trait ChangeFeed {
    /// Changes since the last call. Empty when nothing moved.
    fn poll_changes(&mut self) -> Result<Vec<LedgerChange>>;

    /// Current contents after the most recent poll.
    fn snapshot(&self) -> &[PurchaseRequest];

    /// How long a display should wait between polls.
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }
}

/// Poll-based feed: refreshes the ledger from storage and diffs it against
/// the previous summary.
pub struct PollingFeed<S> {
    ledger: RequestLedger<S>,
    seen: LedgerSummary,
    interval: Duration,
}

impl<S: LedgerStorage> PollingFeed<S> {
    /// Everything already in the ledger counts as seen.
    pub fn new(ledger: RequestLedger<S>) -> Self {
        let seen = ledger.summarize();
        Self {
            ledger,
            seen,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Report every existing request as `Created` on the first poll.
    pub fn from_start(ledger: RequestLedger<S>) -> Self {
        Self {
            ledger,
            seen: LedgerSummary::default(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn ledger(&self) -> &RequestLedger<S> {
        &self.ledger
    }

    /// Resolutions made through this handle show up on the next poll.
    pub fn ledger_mut(&mut self) -> &mut RequestLedger<S> {
        &mut self.ledger
    }

    pub fn into_ledger(self) -> RequestLedger<S> {
        self.ledger
    }
}

impl<S: LedgerStorage> ChangeFeed for PollingFeed<S> {
    fn poll_changes(&mut self) -> Result<Vec<LedgerChange>> {
        self.ledger.refresh()?;
        let changes: Vec<LedgerChange> = self
            .ledger
            .changes_since(&self.seen)
            .into_iter()
            .map(|r| {
                if self.seen.statuses.contains_key(&r.id) {
                    LedgerChange::Resolved(r.clone())
                } else {
                    LedgerChange::Created(r.clone())
                }
            })
            .collect();
        if !changes.is_empty() {
            debug!(count = changes.len(), slot = self.ledger.slot(), "Ledger changes observed");
            self.seen = self.ledger.summarize();
        }
        Ok(changes)
    }

    fn snapshot(&self) -> &[PurchaseRequest] {
        self.ledger.list_requests()
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{BuyerContact, IndustryId};
    use crate::ledger::NewRequest;
    use crate::product::ProductId;
    use crate::request::RequestStatus;
    use crate::storage::{LedgerSlot, MemoryStorage};

    fn ethanol() -> NewRequest {
        NewRequest {
            industry_id: IndustryId::from("2"),
            industry_name: "Gujarat Solvents Pvt Ltd".into(),
            product_id: ProductId::from("p3"),
            product_name: "Ethanol".into(),
            quantity: "25".into(),
            unit: "KL".into(),
            buyer: BuyerContact::placeholder(),
            terms: None,
        }
    }

    #[test]
    fn from_start_reports_existing_requests() {
        let mut ledger = RequestLedger::open(MemoryStorage::new(), &LedgerSlot::Shared).unwrap();
        let req = ledger.create_request(ethanol()).unwrap();

        let mut feed = PollingFeed::from_start(ledger);
        assert_eq!(feed.poll_changes().unwrap(), vec![LedgerChange::Created(req)]);
        assert!(feed.poll_changes().unwrap().is_empty());
    }

    #[test]
    fn sees_writes_from_another_session() {
        let mut storage = MemoryStorage::new();
        let mut feed = PollingFeed::new(
            RequestLedger::open(storage.clone(), &LedgerSlot::Shared).unwrap(),
        );
        assert!(feed.poll_changes().unwrap().is_empty());

        // A second session writes to the same slot; copy its value across.
        let mut buyer = RequestLedger::open(&mut storage, &LedgerSlot::Shared).unwrap();
        let req = buyer.create_request(ethanol()).unwrap();
        let raw = storage.load("purchaseRequests").unwrap().unwrap();
        feed.ledger_mut()
            .storage_mut()
            .store("purchaseRequests", &raw)
            .unwrap();

        let changes = feed.poll_changes().unwrap();
        assert_eq!(changes.len(), 1);
        assert!(matches!(&changes[0], LedgerChange::Created(r) if r.id == req.id));
        assert_eq!(feed.snapshot().len(), 1);
    }

    #[test]
    fn own_resolution_is_reported_once() {
        let mut ledger = RequestLedger::open(MemoryStorage::new(), &LedgerSlot::Shared).unwrap();
        let req = ledger.create_request(ethanol()).unwrap();
        let mut feed = PollingFeed::new(ledger);

        feed.ledger_mut().accept(&req.id).unwrap();
        let changes = feed.poll_changes().unwrap();
        assert_eq!(changes.len(), 1);
        assert!(matches!(
            &changes[0],
            LedgerChange::Resolved(r) if r.status == RequestStatus::Accepted
        ));
        assert_eq!(changes[0].request().id, req.id);
        assert!(feed.poll_changes().unwrap().is_empty());
    }

    #[test]
    fn interval_defaults_to_five_seconds() {
        let ledger = RequestLedger::open(MemoryStorage::new(), &LedgerSlot::Shared).unwrap();
        let feed = PollingFeed::new(ledger);
        assert_eq!(feed.poll_interval(), Duration::from_secs(5));
        let feed = feed.with_interval(Duration::from_millis(50));
        assert_eq!(feed.poll_interval(), Duration::from_millis(50));
    }
}
