use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier of a seller business in the directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndustryId(pub String);

impl fmt::Display for IndustryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndustryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Contact number used when no signed-in buyer identity is available.
pub const PLACEHOLDER_BUYER_PHONE: &str = "+91 9876543210";

/// Phone number a seller can dial once a request is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuyerContact(String);

impl BuyerContact {
    /// Accepts any string that contains at least one digit.
    pub fn new(phone: impl Into<String>) -> Result<Self, ValidationError> {
        let phone = phone.into().trim().to_string();
        if !phone.chars().any(|c| c.is_ascii_digit()) {
            return Err(ValidationError::new(
                "buyerPhone",
                "a contact number must contain digits",
            ));
        }
        Ok(Self(phone))
    }

    pub fn placeholder() -> Self {
        Self(PLACEHOLDER_BUYER_PHONE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `tel:` URI for the host's dialer. Spaces and punctuation are dropped.
    pub fn tel_uri(&self) -> String {
        let dialable: String = self
            .0
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '+')
            .collect();
        format!("tel:{dialable}")
    }
}

impl Default for BuyerContact {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl fmt::Display for BuyerContact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which side of the marketplace a user acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    Buyer,
    Seller,
    Both,
}

impl UserRole {
    pub fn can_resolve_requests(self) -> bool {
        matches!(self, UserRole::Seller | UserRole::Both)
    }

    pub fn can_place_requests(self) -> bool {
        matches!(self, UserRole::Buyer | UserRole::Both)
    }
}
