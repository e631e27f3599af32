//! Command-line host for the chemical marketplace.
//!
//! Browses the bundled supplier catalog, places purchase requests against it
//! and lets a seller accept or reject them. Requests live in a JSON ledger
//! under the data directory; `watch` polls it so that writes from another
//! terminal show up within one poll interval.

mod config;
mod render;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use chemtrade_common::dashboard::DashboardStats;
use chemtrade_common::directory::Directory;
use chemtrade_common::identity::IndustryId;
use chemtrade_common::ledger::{NewRequest, RequestLedger};
use chemtrade_common::product::{ProductCategory, ProductId};
use chemtrade_common::profile::{self, ProfileWizard};
use chemtrade_common::request::{InquiryTerms, QuantityPreset, RequestId, RequestStatus};
use chemtrade_common::storage::{FileStorage, LedgerSlot};
use chemtrade_common::watch::{ChangeFeed, PollingFeed};

use crate::config::{Config, GlobalArgs};

#[derive(Parser)]
#[command(name = "chemtrade", about = "B2B chemical marketplace: catalog and purchase requests")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supplier businesses.
    Industries,

    /// Show one supplier with its products and price trends.
    Industry { id: String },

    /// Search products by name or category.
    Search {
        query: String,

        /// Restrict to one category (e.g. Acids, Alcohols).
        #[arg(long)]
        category: Option<String>,
    },

    /// Send a purchase request for a supplier's product.
    Request {
        industry: String,
        product: String,

        /// Amount to request. Omit to use --preset.
        #[arg(long)]
        quantity: Option<String>,

        /// Quick-pick amount in tons (1, 5, 10, 25, 50, 100).
        #[arg(long)]
        preset: Option<u32>,

        /// Unit of measure (MT, KG, L, KL, DRUM, Tons).
        #[arg(long, default_value = "Tons")]
        unit: String,

        /// Payment terms: advance, lc, net15, net30, cod.
        #[arg(long)]
        payment: Option<String>,

        /// Delivery terms: exw, fob, cif, door.
        #[arg(long)]
        delivery: Option<String>,

        /// Date needed by, YYYY-MM-DD.
        #[arg(long)]
        required_by: Option<String>,

        /// Target price per unit in rupees.
        #[arg(long)]
        target_price: Option<u64>,

        /// Free-form note to the supplier.
        #[arg(long)]
        message: Option<String>,
    },

    /// List purchase requests.
    Requests {
        /// Only requests addressed to this supplier.
        #[arg(long)]
        industry: Option<String>,

        /// Only pending requests.
        #[arg(long)]
        pending: bool,

        /// Oldest first instead of newest first.
        #[arg(long)]
        oldest_first: bool,

        /// Print the raw records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Accept a pending request.
    Accept { id: String },

    /// Reject a pending request.
    Reject { id: String },

    /// Print the dial URI for an accepted request's buyer.
    Call { id: String },

    /// Poll the ledger and print changes as they appear.
    Watch {
        /// Print existing requests on the first poll.
        #[arg(long)]
        from_start: bool,
    },

    /// Show or build the business profile.
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Marketplace or per-supplier statistics.
    Dashboard {
        #[arg(long)]
        industry: Option<String>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Set {
        /// Chemicals you sell, comma-separated.
        #[arg(long, default_value = "")]
        sell: String,
        /// Chemicals you buy, comma-separated.
        #[arg(long, default_value = "")]
        buy: String,
        #[arg(long, default_value = "")]
        factory_license: String,
        #[arg(long, default_value = "")]
        gst: String,
        #[arg(long, default_value = "")]
        trade_license: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_args(&cli.global)?;
    let directory = Directory::demo().context("bundled catalog is malformed")?;

    match cli.command {
        Command::Industries => {
            for industry in directory.industries() {
                println!("{}", render::industry_line(industry));
            }
        }
        Command::Industry { id } => {
            let industry = directory
                .industry(&IndustryId(id.clone()))
                .with_context(|| format!("no industry with id {id}"))?;
            print!("{}", render::industry_detail(industry));
        }
        Command::Search { query, category } => {
            let hits = match category {
                Some(name) => {
                    let category = parse_category(&name);
                    directory
                        .by_category(&category)
                        .into_iter()
                        .filter(|l| l.product.matches(&query))
                        .collect()
                }
                None => directory.search(&query),
            };
            if hits.is_empty() {
                println!("No products match \"{query}\"");
            }
            for listing in &hits {
                println!("{}", render::listing_line(listing));
            }
        }
        Command::Request {
            industry,
            product,
            quantity,
            preset,
            unit,
            payment,
            delivery,
            required_by,
            target_price,
            message,
        } => {
            let listing = directory
                .product(&IndustryId(industry.clone()), &ProductId(product.clone()))
                .with_context(|| format!("industry {industry} does not list product {product}"))?;

            let quantity = match (quantity, preset) {
                (Some(q), _) => q,
                (None, Some(tons)) => QuantityPreset::from_tons(tons)?.resolve("")?.to_string(),
                (None, None) => String::new(),
            };

            let mut new = NewRequest::for_listing(listing, quantity, unit, config.buyer.clone());
            if let Some(terms) =
                inquiry_terms(payment, delivery, required_by, target_price, message)?
            {
                new = new.with_terms(terms);
            }

            // Per-business ledgers belong to the seller the request is for.
            let slot = config.slot.for_owner(&listing.industry.id);
            let mut ledger = open_ledger_at(&config, &slot)?;
            let request = ledger.create_request(new)?;
            println!(
                "Request sent: {} {} of {} to {} (#{})",
                request.quantity,
                request.unit,
                request.product_name,
                request.industry_name,
                request.id
            );
        }
        Command::Requests {
            industry,
            pending,
            oldest_first,
            json,
        } => {
            let ledger = open_ledger(&config)?;
            let industry = industry.map(IndustryId);
            let mut requests: Vec<_> = ledger
                .list_requests()
                .iter()
                .filter(|r| industry.as_ref().is_none_or(|id| &r.industry_id == id))
                .filter(|r| !pending || r.status == RequestStatus::Pending)
                .collect();
            if !oldest_first {
                requests.reverse();
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&requests)?);
            } else {
                print!("{}", render::request_list(&requests, Utc::now()));
            }
        }
        Command::Accept { id } => resolve(&config, &id, RequestStatus::Accepted)?,
        Command::Reject { id } => resolve(&config, &id, RequestStatus::Rejected)?,
        Command::Call { id } => {
            let ledger = open_ledger(&config)?;
            let request = ledger
                .get(&RequestId(id.clone()))
                .with_context(|| format!("no purchase request with id {id}"))?;
            match request.contact_uri() {
                Some(uri) => println!("{uri}"),
                None => bail!(
                    "request {id} is {}; the buyer can be called once it is accepted",
                    request.status
                ),
            }
        }
        Command::Watch { from_start } => {
            let ledger = open_ledger(&config)?;
            let feed = if from_start {
                PollingFeed::from_start(ledger)
            } else {
                PollingFeed::new(ledger)
            };
            watch(feed.with_interval(config.poll_interval)).await;
        }
        Command::Profile { action } => {
            let mut storage = config.open_storage()?;
            match action {
                ProfileAction::Show => match profile::load_profile(&storage)? {
                    Some(p) => print!(
                        "{}",
                        render::profile(&p, profile::is_profile_complete(&storage)?)
                    ),
                    None => println!("No profile yet. Build one with `chemtrade profile set`."),
                },
                ProfileAction::Set {
                    sell,
                    buy,
                    factory_license,
                    gst,
                    trade_license,
                } => {
                    let mut wizard = ProfileWizard::new();
                    wizard.profile.chemicals_sell = sell;
                    wizard.profile.chemicals_buy = buy;
                    wizard.next()?;
                    wizard.profile.factory_license = factory_license;
                    wizard.profile.gst_number = gst;
                    wizard.profile.trade_license = trade_license;
                    wizard.next()?;
                    let saved = wizard.submit(&mut storage)?;
                    print!("{}", render::profile(&saved, true));
                }
            }
        }
        Command::Dashboard { industry } => {
            let ledger = open_ledger(&config)?;
            let industry = industry.map(IndustryId);
            let stats = DashboardStats::compute(&directory, ledger.list_requests(), industry.as_ref());
            print!("{}", render::dashboard(&stats));

            let requested_value: f64 = ledger
                .list_requests()
                .iter()
                .filter(|r| r.status != RequestStatus::Rejected)
                .filter(|r| industry.as_ref().is_none_or(|id| &r.industry_id == id))
                .filter_map(|r| {
                    let listing = directory.product(&r.industry_id, &r.product_id)?;
                    Some(listing.product.price as f64 * r.quantity.value())
                })
                .sum();
            println!(
                "{}",
                render::market_summary(
                    stats.active_listings,
                    directory.verified_count(),
                    requested_value.round() as u64
                )
            );
        }
    }

    Ok(())
}

fn open_ledger(config: &Config) -> anyhow::Result<RequestLedger<FileStorage>> {
    open_ledger_at(config, &config.slot)
}

fn open_ledger_at(config: &Config, slot: &LedgerSlot) -> anyhow::Result<RequestLedger<FileStorage>> {
    let storage = config.open_storage()?;
    RequestLedger::open(storage, slot)
        .with_context(|| format!("cannot read request ledger from {}", config.data_dir.display()))
}

/// Terms for a detailed inquiry. Any term flag makes the whole set required,
/// so a lone `--target-price` or `--message` is refused rather than dropped.
fn inquiry_terms(
    payment: Option<String>,
    delivery: Option<String>,
    required_by: Option<String>,
    target_price: Option<u64>,
    message: Option<String>,
) -> anyhow::Result<Option<InquiryTerms>> {
    let any_given = payment.is_some()
        || delivery.is_some()
        || required_by.is_some()
        || target_price.is_some()
        || message.is_some();
    if !any_given {
        return Ok(None);
    }
    let terms = InquiryTerms {
        target_price,
        payment_terms: payment.as_deref().unwrap_or("").parse()?,
        delivery_terms: delivery.as_deref().unwrap_or("").parse()?,
        required_by: required_by.unwrap_or_default(),
        message,
    };
    terms.validate()?;
    Ok(Some(terms))
}

fn resolve(config: &Config, id: &str, status: RequestStatus) -> anyhow::Result<()> {
    let mut ledger = open_ledger(config)?;
    let request = ledger.transition(&RequestId(id.to_string()), status)?;
    match request.contact_uri() {
        Some(_) => println!(
            "Request Accepted. You can now contact the buyer: {}",
            request.buyer_phone
        ),
        None => println!("Request Rejected. The request has been declined."),
    }
    Ok(())
}

fn parse_category(name: &str) -> ProductCategory {
    match name.trim().to_lowercase().as_str() {
        "acids" => ProductCategory::Acids,
        "alcohols" => ProductCategory::Alcohols,
        "bases" => ProductCategory::Bases,
        "salts" => ProductCategory::Salts,
        "solvents" => ProductCategory::Solvents,
        "polymers" => ProductCategory::Polymers,
        "petrochemicals" => ProductCategory::Petrochemicals,
        _ => ProductCategory::Other(name.trim().to_string()),
    }
}

async fn watch<F: ChangeFeed>(mut feed: F) {
    let every = feed.poll_interval();
    let mut ticker = tokio::time::interval(every);
    println!("Watching purchase requests (every {}s, Ctrl-C to stop)", every.as_secs());
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match feed.poll_changes() {
                    Ok(changes) => {
                        for change in &changes {
                            println!("{}", render::change_line(change));
                        }
                    }
                    // Storage hiccups are retried on the next tick.
                    Err(e) => warn!(error = %e, "Poll failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped watching; {} requests in ledger", feed.snapshot().len());
                break;
            }
        }
    }
}
