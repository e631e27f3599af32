use std::path::Path;

use chemtrade_common::directory::Directory;
use chemtrade_common::identity::{BuyerContact, IndustryId};
use chemtrade_common::ledger::{NewRequest, RequestLedger};
use chemtrade_common::product::ProductId;
use chemtrade_common::storage::{FileStorage, LedgerSlot};

pub mod harness;

/// The bundled demo catalog.
pub fn demo_directory() -> Directory {
    Directory::demo().expect("bundled catalog parses")
}

/// Open a file-backed ledger on the shared slot under `root`.
pub fn open_file_ledger(root: &Path) -> RequestLedger<FileStorage> {
    open_file_ledger_at(root, &LedgerSlot::Shared)
}

pub fn open_file_ledger_at(root: &Path, slot: &LedgerSlot) -> RequestLedger<FileStorage> {
    let storage = FileStorage::open(root).expect("data dir is writable");
    RequestLedger::open(storage, slot).expect("ledger slot is readable")
}

/// A request for a catalog product, with the product's own unit.
pub fn make_catalog_request(
    directory: &Directory,
    industry: &str,
    product: &str,
    quantity: &str,
) -> NewRequest {
    let listing = directory
        .product(&IndustryId::from(industry), &ProductId::from(product))
        .unwrap_or_else(|| panic!("catalog lists {product} under industry {industry}"));
    let unit = listing.product.unit.clone();
    NewRequest::for_listing(listing, quantity, unit, BuyerContact::placeholder())
}

/// The quick-order request from the product page: Sulfuric Acid from
/// Bharat Chemicals, measured in Tons.
pub fn make_dummy_request(quantity: &str) -> NewRequest {
    let directory = demo_directory();
    let listing = directory
        .product(&IndustryId::from("1"), &ProductId::from("p1"))
        .expect("p1 is listed");
    NewRequest::for_listing(listing, quantity, "Tons", BuyerContact::placeholder())
}
