pub mod currency;
pub mod dashboard;
pub mod directory;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod product;
pub mod profile;
pub mod request;
pub mod storage;
pub mod watch;

pub use error::{LedgerError, Result};
pub use ledger::{NewRequest, RequestLedger};
pub use request::{PurchaseRequest, RequestId, RequestStatus};
pub use storage::{FileStorage, LedgerSlot, LedgerStorage, MemoryStorage};
