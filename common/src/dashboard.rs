use std::collections::BTreeMap;

use crate::directory::Directory;
use crate::identity::IndustryId;
use crate::ledger::{count_statuses, StatusCounts};
use crate::request::{PurchaseRequest, RequestStatus};

/// Requested volume for one product, grouped by unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDemand {
    pub product_name: String,
    pub unit: String,
    pub requests: usize,
    pub total_quantity: f64,
}

/// Seller dashboard figures, computed from the catalog and the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardStats {
    pub active_listings: usize,
    pub total_inquiries: usize,
    pub statuses: StatusCounts,
    /// Sorted by product name, then unit.
    pub demand: Vec<ProductDemand>,
}

impl DashboardStats {
    /// `industry` narrows everything to one seller; `None` covers the whole marketplace.
    pub fn compute(
        directory: &Directory,
        requests: &[PurchaseRequest],
        industry: Option<&IndustryId>,
    ) -> Self {
        let in_scope = |id: &IndustryId| industry.is_none_or(|wanted| wanted == id);

        let active_listings = directory
            .listings()
            .filter(|l| in_scope(&l.industry.id))
            .count();

        let scoped: Vec<&PurchaseRequest> =
            requests.iter().filter(|r| in_scope(&r.industry_id)).collect();

        let mut demand: BTreeMap<(String, String), ProductDemand> = BTreeMap::new();
        for request in scoped.iter().filter(|r| r.status != RequestStatus::Rejected) {
            let key = (request.product_name.clone(), request.unit.to_string());
            let entry = demand.entry(key).or_insert_with(|| ProductDemand {
                product_name: request.product_name.clone(),
                unit: request.unit.to_string(),
                requests: 0,
                total_quantity: 0.0,
            });
            entry.requests += 1;
            entry.total_quantity += request.quantity.value();
        }

        Self {
            active_listings,
            total_inquiries: scoped.len(),
            statuses: count_statuses(scoped.iter().copied()),
            demand: demand.into_values().collect(),
        }
    }

    /// Share of resolved requests that were accepted, in percent.
    pub fn acceptance_rate(&self) -> Option<f64> {
        let resolved = self.statuses.accepted + self.statuses.rejected;
        (resolved > 0).then(|| self.statuses.accepted as f64 / resolved as f64 * 100.0)
    }
}
