use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::identity::{BuyerContact, IndustryId};
use crate::product::ProductId;

/// Unique request identifier (timestamp-based, monotonically increasing).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis.to_string())
    }

    /// Millisecond value the id was derived from, if it was.
    pub fn millis(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Request status. Starts `Pending` and resolves at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    /// Ordinal for merging two copies of a record. Higher always wins.
    pub fn ordinal(self) -> u8 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::Accepted | RequestStatus::Rejected => 1,
        }
    }

    pub fn is_resolved(self) -> bool {
        self != RequestStatus::Pending
    }

    /// Returns true if transitioning from self to `next` is valid.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted)
                | (RequestStatus::Pending, RequestStatus::Rejected)
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::Accepted => "Accepted",
            RequestStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        })
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" | "accept" => Ok(RequestStatus::Accepted),
            "rejected" | "reject" => Ok(RequestStatus::Rejected),
            other => Err(ValidationError::new(
                "status",
                format!("unknown status `{other}`"),
            )),
        }
    }
}

/// Requested amount as the buyer typed it. Always a positive number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(String);

impl Quantity {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("quantity", "Quantity is required"));
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Ok(Self(trimmed.to_string())),
            Ok(_) => Err(ValidationError::new(
                "quantity",
                "Quantity must be greater than zero",
            )),
            Err(_) => Err(ValidationError::new(
                "quantity",
                format!("`{trimmed}` is not a number"),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn value(&self) -> f64 {
        // Parsed once in `parse`; records loaded from storage may hold anything.
        self.0.parse().unwrap_or(0.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unit label the quick-order path uses.
pub const DEFAULT_UNIT: &str = "Tons";

/// Units offered by the inquiry form, with their display names.
pub const KNOWN_UNITS: &[(&str, &str)] = &[
    ("MT", "Metric Ton (MT)"),
    ("KG", "Kilogram (KG)"),
    ("L", "Liter (L)"),
    ("KL", "Kilolitre (KL)"),
    ("DRUM", "Drum"),
    ("Tons", "Tons"),
];

/// Unit of measure for a requested quantity. Any non-empty label is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unit(String);

impl Unit {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new("unit", "Unit is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_known(&self) -> bool {
        KNOWN_UNITS.iter().any(|(code, _)| *code == self.0)
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self(DEFAULT_UNIT.to_string())
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quick-pick quantities on the product page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityPreset {
    Tons(u32),
    Custom,
}

impl QuantityPreset {
    pub const ALL: [QuantityPreset; 7] = [
        QuantityPreset::Tons(1),
        QuantityPreset::Tons(5),
        QuantityPreset::Tons(10),
        QuantityPreset::Tons(25),
        QuantityPreset::Tons(50),
        QuantityPreset::Tons(100),
        QuantityPreset::Custom,
    ];

    /// The quick-pick for `tons`, if the product page offers one.
    pub fn from_tons(tons: u32) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|p| *p == QuantityPreset::Tons(tons))
            .ok_or_else(|| {
                ValidationError::new(
                    "quantity",
                    format!("{tons} Tons is not a preset; choose 1, 5, 10, 25, 50 or 100"),
                )
            })
    }

    pub fn label(self) -> String {
        match self {
            QuantityPreset::Tons(1) => "1 Ton".to_string(),
            QuantityPreset::Tons(n) => format!("{n} Tons"),
            QuantityPreset::Custom => "Custom Quantity".to_string(),
        }
    }

    /// Resolve the selection to a quantity; `Custom` takes the typed amount.
    pub fn resolve(self, custom: &str) -> Result<Quantity, ValidationError> {
        match self {
            QuantityPreset::Tons(n) => Quantity::parse(&n.to_string()),
            QuantityPreset::Custom => Quantity::parse(custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentTerms {
    Advance,
    Lc,
    Net15,
    Net30,
    Cod,
}

impl PaymentTerms {
    pub fn label(self) -> &'static str {
        match self {
            PaymentTerms::Advance => "100% Advance",
            PaymentTerms::Lc => "Letter of Credit (LC)",
            PaymentTerms::Net15 => "Net 15 Days",
            PaymentTerms::Net30 => "Net 30 Days",
            PaymentTerms::Cod => "Cash on Delivery",
        }
    }
}

impl std::str::FromStr for PaymentTerms {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "advance" => Ok(PaymentTerms::Advance),
            "lc" => Ok(PaymentTerms::Lc),
            "net15" => Ok(PaymentTerms::Net15),
            "net30" => Ok(PaymentTerms::Net30),
            "cod" => Ok(PaymentTerms::Cod),
            "" => Err(ValidationError::new("paymentTerms", "Payment terms are required")),
            other => Err(ValidationError::new(
                "paymentTerms",
                format!("unknown payment terms `{other}`"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryTerms {
    Exw,
    Fob,
    Cif,
    Door,
}

impl DeliveryTerms {
    pub fn label(self) -> &'static str {
        match self {
            DeliveryTerms::Exw => "Ex-Works",
            DeliveryTerms::Fob => "FOB",
            DeliveryTerms::Cif => "CIF",
            DeliveryTerms::Door => "Door Delivery",
        }
    }
}

impl std::str::FromStr for DeliveryTerms {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exw" => Ok(DeliveryTerms::Exw),
            "fob" => Ok(DeliveryTerms::Fob),
            "cif" => Ok(DeliveryTerms::Cif),
            "door" => Ok(DeliveryTerms::Door),
            "" => Err(ValidationError::new("deliveryTerms", "Delivery terms are required")),
            other => Err(ValidationError::new(
                "deliveryTerms",
                format!("unknown delivery terms `{other}`"),
            )),
        }
    }
}

/// Commercial terms attached to a detailed inquiry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InquiryTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_price: Option<u64>,
    pub payment_terms: PaymentTerms,
    pub delivery_terms: DeliveryTerms,
    /// Date the buyer needs delivery by, `YYYY-MM-DD`.
    pub required_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InquiryTerms {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.required_by.trim().is_empty() {
            return Err(ValidationError::new(
                "requiredBy",
                "Required by date is required",
            ));
        }
        if chrono::NaiveDate::parse_from_str(self.required_by.trim(), "%Y-%m-%d").is_err() {
            return Err(ValidationError::new(
                "requiredBy",
                format!("`{}` is not a YYYY-MM-DD date", self.required_by.trim()),
            ));
        }
        Ok(())
    }
}

/// A buyer's request for a quantity of one seller's product.
///
/// Names of the industry and product are copied in for display; nothing
/// checks them against the directory later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub id: RequestId,
    pub industry_id: IndustryId,
    pub industry_name: String,
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: Quantity,
    pub unit: Unit,
    pub status: RequestStatus,
    pub timestamp: DateTime<Utc>,
    pub buyer_phone: BuyerContact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terms: Option<InquiryTerms>,
}

/// What a seller can do with a request in its current status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestAction {
    Accept,
    Reject,
    /// Dial the buyer; carries the `tel:` URI.
    CallBuyer(String),
}

impl PurchaseRequest {
    pub fn available_actions(&self) -> Vec<RequestAction> {
        match self.status {
            RequestStatus::Pending => vec![RequestAction::Accept, RequestAction::Reject],
            RequestStatus::Accepted => vec![RequestAction::CallBuyer(self.buyer_phone.tel_uri())],
            RequestStatus::Rejected => Vec::new(),
        }
    }

    /// Dialable contact, exposed only once the seller has accepted.
    pub fn contact_uri(&self) -> Option<String> {
        (self.status == RequestStatus::Accepted).then(|| self.buyer_phone.tel_uri())
    }

    pub fn age(&self, now: DateTime<Utc>) -> String {
        format_age(self.timestamp, now)
    }
}

/// "12m ago" under an hour, "5h ago" under a day, otherwise the date.
pub fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    let minutes = elapsed.num_minutes().max(0);
    let hours = elapsed.num_hours().max(0);
    if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else {
        timestamp.format("%d/%m/%Y").to_string()
    }
}
