//! Plain-text rendering of catalog entries, requests and dashboard figures.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use chemtrade_common::currency::{format_inr, format_inr_compact};
use chemtrade_common::dashboard::DashboardStats;
use chemtrade_common::directory::{Industry, Listing};
use chemtrade_common::product::PriceTrend;
use chemtrade_common::profile::BusinessProfile;
use chemtrade_common::request::{PurchaseRequest, RequestAction};
use chemtrade_common::watch::LedgerChange;

pub const EMPTY_LEDGER: &str =
    "No purchase requests yet\nRequests from buyers will appear here";

pub fn industry_line(industry: &Industry) -> String {
    let badge = if industry.verified { " ✓" } else { "" };
    format!(
        "[{}] {}{badge}  {}  ★{:.1}  {} products",
        industry.id,
        industry.name,
        industry.location,
        industry.rating,
        industry.products.len()
    )
}

pub fn industry_detail(industry: &Industry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", industry.name, industry.logo);
    let _ = writeln!(out, "  Location:        {}", industry.location);
    let _ = writeln!(out, "  Phone:           {}", industry.phone);
    let _ = writeln!(out, "  Email:           {}", industry.email);
    let _ = writeln!(out, "  GST:             {}", industry.licenses.gst_number);
    let _ = writeln!(out, "  Factory license: {}", industry.licenses.factory_license);
    let _ = writeln!(out, "  Trade license:   {}", industry.licenses.trade_license);
    let _ = writeln!(
        out,
        "  Verified:        {}",
        if industry.verified { "yes" } else { "no" }
    );
    let _ = writeln!(out, "  Products:");
    for product in &industry.products {
        let _ = writeln!(
            out,
            "    [{}] {} ({}, {})  {}/{}{}",
            product.id,
            product.name,
            product.grade,
            product.category,
            format_inr(product.price),
            product.unit,
            trend_suffix(product.price_change().map(|c| (c.trend, c.percent)))
        );
    }
    out
}

pub fn listing_line(listing: &Listing<'_>) -> String {
    let product = listing.product;
    format!(
        "{} [{}] {}  {}/{}  from {} [{}]",
        product.name,
        product.id,
        product.category,
        format_inr(product.price),
        product.unit,
        listing.industry.name,
        listing.industry.id
    )
}

fn trend_suffix(change: Option<(PriceTrend, f64)>) -> String {
    match change {
        Some((PriceTrend::Up, pct)) => format!("  ▲ {pct:.1}%"),
        Some((PriceTrend::Down, pct)) => format!("  ▼ {:.1}%", pct.abs()),
        Some((PriceTrend::Flat, _)) => "  ▬ 0.0%".to_string(),
        None => String::new(),
    }
}

pub fn request_block(request: &PurchaseRequest, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "#{}  {}  {} {}  [{}]",
        request.id,
        request.product_name,
        request.quantity,
        request.unit,
        request.status.label()
    );
    let _ = writeln!(
        out,
        "    to {}  ·  {}",
        request.industry_name,
        request.age(now)
    );
    if let Some(terms) = &request.terms {
        let _ = write!(
            out,
            "    {} · {} · by {}",
            terms.payment_terms.label(),
            terms.delivery_terms.label(),
            terms.required_by
        );
        if let Some(price) = terms.target_price {
            let _ = write!(out, " · target {}/{}", format_inr(price), request.unit);
        }
        out.push('\n');
        if let Some(message) = &terms.message {
            let _ = writeln!(out, "    \"{message}\"");
        }
    }
    let actions: Vec<String> = request
        .available_actions()
        .into_iter()
        .map(|a| match a {
            RequestAction::Accept => format!("chemtrade accept {}", request.id),
            RequestAction::Reject => format!("chemtrade reject {}", request.id),
            RequestAction::CallBuyer(_) => format!("Call Buyer ({})", request.buyer_phone),
        })
        .collect();
    if !actions.is_empty() {
        let _ = writeln!(out, "    → {}", actions.join("  |  "));
    }
    out
}

pub fn request_list(requests: &[&PurchaseRequest], now: DateTime<Utc>) -> String {
    if requests.is_empty() {
        return format!("{EMPTY_LEDGER}\n");
    }
    let mut out = format!("Purchase Requests ({} requests)\n", requests.len());
    for request in requests {
        out.push_str(&request_block(request, now));
    }
    out
}

pub fn change_line(change: &LedgerChange) -> String {
    let request = change.request();
    match change {
        LedgerChange::Created(_) => format!(
            "new request #{}: {} {} of {} for {}",
            request.id, request.quantity, request.unit, request.product_name, request.industry_name
        ),
        LedgerChange::Resolved(_) => format!(
            "request #{} {}",
            request.id,
            request.status.label().to_lowercase()
        ),
    }
}

pub fn dashboard(stats: &DashboardStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Active Listings:  {}", stats.active_listings);
    let _ = writeln!(out, "Total Inquiries:  {}", stats.total_inquiries);
    let _ = writeln!(
        out,
        "  pending {}  ·  accepted {}  ·  rejected {}",
        stats.statuses.pending, stats.statuses.accepted, stats.statuses.rejected
    );
    if let Some(rate) = stats.acceptance_rate() {
        let _ = writeln!(out, "Acceptance rate:  {rate:.0}%");
    }
    if !stats.demand.is_empty() {
        let _ = writeln!(out, "Open demand:");
        for d in &stats.demand {
            let _ = writeln!(
                out,
                "  {:<24} {:>10} {:<5} ({} requests)",
                d.product_name, d.total_quantity, d.unit, d.requests
            );
        }
    }
    out
}

pub fn profile(profile: &BusinessProfile, complete: bool) -> String {
    let mut out = String::new();
    let role = profile
        .role()
        .map(|r| format!("{r:?}"))
        .unwrap_or_else(|| "none".to_string());
    let _ = writeln!(out, "Role:            {role}");
    let _ = writeln!(out, "Sells:           {}", profile.sells().join(", "));
    let _ = writeln!(out, "Buys:            {}", profile.buys().join(", "));
    let _ = writeln!(out, "Factory license: {}", profile.factory_license);
    let _ = writeln!(out, "GST number:      {}", profile.gst_number);
    let _ = writeln!(out, "Trade license:   {}", profile.trade_license);
    let _ = writeln!(
        out,
        "Status:          {}",
        if complete { "complete" } else { "incomplete" }
    );
    out
}

pub fn market_summary(listings: usize, verified: usize, volume: u64) -> String {
    format!(
        "{listings} active listings · {verified} verified suppliers · {} requested",
        format_inr_compact(volume)
    )
}
