use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Args;

use chemtrade_common::identity::{BuyerContact, IndustryId};
use chemtrade_common::storage::{FileStorage, LedgerSlot};

/// Settings shared by every command. Each flag falls back to an environment variable.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding the ledger and profile slots
    /// (default: the platform data directory + `chemtrade`).
    #[arg(long, global = true, env = "CHEMTRADE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep a separate ledger for this business id instead of the shared one.
    #[arg(long, global = true, env = "CHEMTRADE_BUSINESS")]
    pub business: Option<String>,

    /// Contact number attached to new requests.
    #[arg(long, global = true, env = "CHEMTRADE_BUYER_PHONE")]
    pub buyer_phone: Option<String>,

    /// Seconds between ledger polls in `watch`.
    #[arg(long, global = true, env = "CHEMTRADE_POLL_SECS", default_value_t = 5)]
    pub poll_secs: u64,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub slot: LedgerSlot,
    pub buyer: BuyerContact,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_args(args: &GlobalArgs) -> anyhow::Result<Self> {
        let data_dir = match &args.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir(),
        };

        let slot = match args.business.as_deref().map(str::trim) {
            None | Some("") => LedgerSlot::Shared,
            Some(id) => LedgerSlot::Business(IndustryId::from(id)),
        };

        let buyer = match &args.buyer_phone {
            Some(phone) => BuyerContact::new(phone.as_str()).context("invalid --buyer-phone")?,
            None => BuyerContact::placeholder(),
        };

        if args.poll_secs == 0 {
            bail!("--poll-secs must be at least 1");
        }

        Ok(Self {
            data_dir,
            slot,
            buyer,
            poll_interval: Duration::from_secs(args.poll_secs),
        })
    }

    pub fn open_storage(&self) -> anyhow::Result<FileStorage> {
        FileStorage::open(&self.data_dir)
            .with_context(|| format!("cannot open data directory {}", self.data_dir.display()))
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("chemtrade"))
        .unwrap_or_else(|| PathBuf::from(".chemtrade"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> GlobalArgs {
        GlobalArgs {
            data_dir: Some(PathBuf::from("/tmp/chemtrade-test")),
            business: None,
            buyer_phone: None,
            poll_secs: 5,
        }
    }

    #[test]
    fn defaults() {
        let config = Config::from_args(&args()).unwrap();
        assert_eq!(config.slot, LedgerSlot::Shared);
        assert_eq!(config.buyer, BuyerContact::placeholder());
        assert_eq!(config.poll_interval, Duration::from_secs(5));
    }

    #[test]
    fn business_selects_its_own_slot() {
        let mut a = args();
        a.business = Some(" 4 ".into());
        let config = Config::from_args(&a).unwrap();
        assert_eq!(config.slot, LedgerSlot::Business(IndustryId::from("4")));

        a.business = Some("".into());
        assert_eq!(Config::from_args(&a).unwrap().slot, LedgerSlot::Shared);
    }

    #[test]
    fn rejects_bad_values() {
        let mut a = args();
        a.buyer_phone = Some("nobody".into());
        assert!(Config::from_args(&a).is_err());

        let mut a = args();
        a.poll_secs = 0;
        assert!(Config::from_args(&a).is_err());
    }
}
