use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::directory::Listing;
use crate::error::{Result, StorageError, TransitionError};
use crate::identity::{BuyerContact, IndustryId};
use crate::product::ProductId;
use crate::request::{
    InquiryTerms, PurchaseRequest, Quantity, RequestId, RequestStatus, Unit,
};
use crate::storage::{LedgerSlot, LedgerStorage};

/// Buyer input for a new purchase request, before validation.
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub industry_id: IndustryId,
    pub industry_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: String,
    pub unit: String,
    pub buyer: BuyerContact,
    pub terms: Option<InquiryTerms>,
}

impl NewRequest {
    /// Request for a catalog listing, copying its names for display.
    pub fn for_listing(
        listing: Listing<'_>,
        quantity: impl Into<String>,
        unit: impl Into<String>,
        buyer: BuyerContact,
    ) -> Self {
        Self {
            industry_id: listing.industry.id.clone(),
            industry_name: listing.industry.name.clone(),
            product_id: listing.product.id.clone(),
            product_name: listing.product.name.clone(),
            quantity: quantity.into(),
            unit: unit.into(),
            buyer,
            terms: None,
        }
    }

    pub fn with_terms(mut self, terms: InquiryTerms) -> Self {
        self.terms = Some(terms);
        self
    }
}

/// Summary of a ledger: request id -> status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub statuses: BTreeMap<RequestId, RequestStatus>,
}

/// Per-status counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.accepted + self.rejected
    }
}

/// The purchase-request ledger: an ordered list of requests backed by one storage slot.
///
/// Every mutation reads the slot, merges it with what is held in memory,
/// applies the change to a copy and writes the whole list back. Memory is
/// only updated once the write succeeds.
pub struct RequestLedger<S> {
    storage: S,
    slot: String,
    requests: Vec<PurchaseRequest>,
}

impl<S: LedgerStorage> RequestLedger<S> {
    /// Load the ledger from `slot`. An absent slot is an empty ledger.
    pub fn open(storage: S, slot: &LedgerSlot) -> Result<Self> {
        Self::open_key(storage, slot.key())
    }

    pub fn open_key(storage: S, slot: impl Into<String>) -> Result<Self> {
        let slot = slot.into();
        let requests = read_slot(&storage, &slot)?;
        debug!(
            slot = %slot,
            backend = storage.backend_name(),
            count = requests.len(),
            "Opened request ledger"
        );
        Ok(Self {
            storage,
            slot,
            requests,
        })
    }

    pub fn slot(&self) -> &str {
        &self.slot
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Validate and append a new pending request stamped with the current time.
    pub fn create_request(&mut self, new: NewRequest) -> Result<PurchaseRequest> {
        self.create_request_at(new, Utc::now())
    }

    /// As [`create_request`](Self::create_request) with an explicit clock reading.
    pub fn create_request_at(
        &mut self,
        new: NewRequest,
        now: DateTime<Utc>,
    ) -> Result<PurchaseRequest> {
        let quantity = Quantity::parse(&new.quantity)?;
        let unit = Unit::parse(&new.unit)?;
        if let Some(terms) = &new.terms {
            terms.validate()?;
        }

        let mut next = self.merged_with_storage()?;
        let request = PurchaseRequest {
            id: next_request_id(&next, now, &self.slot)?,
            industry_id: new.industry_id,
            industry_name: new.industry_name,
            product_id: new.product_id,
            product_name: new.product_name,
            quantity,
            unit,
            status: RequestStatus::Pending,
            timestamp: now,
            buyer_phone: new.buyer,
            terms: new.terms,
        };
        next.push(request.clone());
        self.commit(next)?;

        info!(
            id = %request.id,
            industry = %request.industry_id,
            product = %request.product_name,
            quantity = %request.quantity,
            unit = %request.unit,
            "Purchase request created"
        );
        Ok(request)
    }

    /// All requests, oldest first.
    pub fn list_requests(&self) -> &[PurchaseRequest] {
        &self.requests
    }

    pub fn list_newest_first(&self) -> Vec<&PurchaseRequest> {
        self.requests.iter().rev().collect()
    }

    pub fn get(&self, id: &RequestId) -> Option<&PurchaseRequest> {
        self.requests.iter().find(|r| &r.id == id)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Requests addressed to one seller, oldest first.
    pub fn for_industry<'a>(
        &'a self,
        industry: &'a IndustryId,
    ) -> impl Iterator<Item = &'a PurchaseRequest> + 'a {
        self.requests.iter().filter(move |r| &r.industry_id == industry)
    }

    /// Pending requests addressed to one seller.
    pub fn pending_for<'a>(
        &'a self,
        industry: &'a IndustryId,
    ) -> impl Iterator<Item = &'a PurchaseRequest> + 'a {
        self.for_industry(industry)
            .filter(|r| r.status == RequestStatus::Pending)
    }

    pub fn counts(&self) -> StatusCounts {
        count_statuses(self.requests.iter())
    }

    /// Resolve a pending request.
    ///
    /// Fails for unknown ids, for requests that are already resolved and for
    /// a `Pending` target. The ledger is left untouched on failure.
    pub fn transition(&mut self, id: &RequestId, status: RequestStatus) -> Result<PurchaseRequest> {
        if !status.is_resolved() {
            warn!(%id, %status, "Refused transition to a non-resolution status");
            return Err(TransitionError::NotAResolution(status).into());
        }

        let mut next = self.merged_with_storage()?;
        let Some(record) = next.iter_mut().find(|r| &r.id == id) else {
            warn!(%id, "Refused transition of unknown request");
            return Err(TransitionError::UnknownRequest(id.clone()).into());
        };
        if !record.status.can_transition_to(status) {
            warn!(%id, current = %record.status, requested = %status, "Refused transition of resolved request");
            return Err(TransitionError::AlreadyResolved {
                id: id.clone(),
                status: record.status,
            }
            .into());
        }
        record.status = status;
        let updated = record.clone();
        self.commit(next)?;

        info!(%id, %status, "Purchase request resolved");
        Ok(updated)
    }

    pub fn accept(&mut self, id: &RequestId) -> Result<PurchaseRequest> {
        self.transition(id, RequestStatus::Accepted)
    }

    pub fn reject(&mut self, id: &RequestId) -> Result<PurchaseRequest> {
        self.transition(id, RequestStatus::Rejected)
    }

    /// Pick up writes made by other sessions. Returns `true` if anything changed.
    pub fn refresh(&mut self) -> Result<bool> {
        let merged = self.merged_with_storage()?;
        let changed = merged != self.requests;
        if changed {
            debug!(slot = %self.slot, count = merged.len(), "Ledger refreshed from storage");
        }
        self.requests = merged;
        Ok(changed)
    }

    pub fn summarize(&self) -> LedgerSummary {
        LedgerSummary {
            statuses: self
                .requests
                .iter()
                .map(|r| (r.id.clone(), r.status))
                .collect(),
        }
    }

    /// Requests missing from `summary` or whose status has advanced since.
    pub fn changes_since(&self, summary: &LedgerSummary) -> Vec<&PurchaseRequest> {
        self.requests
            .iter()
            .filter(|r| {
                summary
                    .statuses
                    .get(&r.id)
                    .is_none_or(|s| r.status.ordinal() > s.ordinal())
            })
            .collect()
    }

    fn merged_with_storage(&self) -> Result<Vec<PurchaseRequest>> {
        let stored = read_slot(&self.storage, &self.slot)?;
        let mut merged = self.requests.clone();
        merge_requests(&mut merged, stored);
        Ok(merged)
    }

    fn commit(&mut self, next: Vec<PurchaseRequest>) -> Result<()> {
        let json = serde_json::to_string(&next).expect("serialization should not fail");
        if let Err(e) = self.storage.store(&self.slot, &json) {
            warn!(slot = %self.slot, error = %e, "Failed to persist request ledger");
            return Err(e.into());
        }
        self.requests = next;
        Ok(())
    }
}

fn read_slot<S: LedgerStorage>(storage: &S, slot: &str) -> Result<Vec<PurchaseRequest>> {
    let Some(raw) = storage.load(slot)? else {
        return Ok(Vec::new());
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let requests = serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
        slot: slot.to_string(),
        source,
    })?;
    Ok(requests)
}

/// Merge `incoming` into `base`.
///
/// - Records: set-union by id, new ones appended in their incoming order
/// - Status: monotonic, a resolved copy replaces a pending one
pub fn merge_requests(base: &mut Vec<PurchaseRequest>, incoming: Vec<PurchaseRequest>) {
    for request in incoming {
        match base.iter_mut().find(|r| r.id == request.id) {
            Some(existing) if existing.status.ordinal() >= request.status.ordinal() => {
                // Keep existing (higher or equal status)
            }
            Some(existing) => *existing = request,
            None => base.push(request),
        }
    }
}

pub fn count_statuses<'a>(requests: impl Iterator<Item = &'a PurchaseRequest>) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for request in requests {
        match request.status {
            RequestStatus::Pending => counts.pending += 1,
            RequestStatus::Accepted => counts.accepted += 1,
            RequestStatus::Rejected => counts.rejected += 1,
        }
    }
    counts
}

/// Millisecond id for `now`, bumped past every id already in the ledger.
///
/// Stored ids come from other sessions and may sit at `i64::MAX`; that is
/// reported instead of wrapping.
fn next_request_id(
    existing: &[PurchaseRequest],
    now: DateTime<Utc>,
    slot: &str,
) -> std::result::Result<RequestId, StorageError> {
    let exhausted = || StorageError::IdsExhausted {
        slot: slot.to_string(),
    };
    let latest = existing.iter().filter_map(|r| r.id.millis()).max();
    let mut millis = match latest {
        Some(latest) if latest >= now.timestamp_millis() => {
            latest.checked_add(1).ok_or_else(exhausted)?
        }
        _ => now.timestamp_millis(),
    };
    while existing.iter().any(|r| r.id.0 == millis.to_string()) {
        millis = millis.checked_add(1).ok_or_else(exhausted)?;
    }
    Ok(RequestId::from_millis(millis))
}
