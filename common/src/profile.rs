use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, StorageError, ValidationError};
use crate::identity::UserRole;
use crate::storage::LedgerStorage;

pub const PROFILE_SLOT: &str = "profileData";
pub const PROFILE_COMPLETE_SLOT: &str = "profileComplete";

/// What a business trades and the registrations it holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    /// Free text, typically a comma-separated list.
    pub chemicals_sell: String,
    pub chemicals_buy: String,
    pub factory_license: String,
    pub gst_number: String,
    pub trade_license: String,
}

impl BusinessProfile {
    fn split(list: &str) -> Vec<String> {
        list.split([',', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn sells(&self) -> Vec<String> {
        Self::split(&self.chemicals_sell)
    }

    pub fn buys(&self) -> Vec<String> {
        Self::split(&self.chemicals_buy)
    }

    /// Role implied by the chemicals listed, `None` if neither list has entries.
    pub fn role(&self) -> Option<UserRole> {
        match (self.sells().is_empty(), self.buys().is_empty()) {
            (false, false) => Some(UserRole::Both),
            (false, true) => Some(UserRole::Seller),
            (true, false) => Some(UserRole::Buyer),
            (true, true) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProfileStep {
    Chemicals,
    Licenses,
    Complete,
}

impl ProfileStep {
    pub fn number(self) -> u8 {
        match self {
            ProfileStep::Chemicals => 1,
            ProfileStep::Licenses => 2,
            ProfileStep::Complete => 3,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ProfileStep::Chemicals => "Chemicals",
            ProfileStep::Licenses => "Licenses",
            ProfileStep::Complete => "Complete",
        }
    }
}

/// Three-step profile builder. `back` and `next` stop at the first and last step.
#[derive(Debug, Clone)]
pub struct ProfileWizard {
    step: ProfileStep,
    pub profile: BusinessProfile,
}

impl Default for ProfileWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileWizard {
    pub fn new() -> Self {
        Self {
            step: ProfileStep::Chemicals,
            profile: BusinessProfile::default(),
        }
    }

    pub fn step(&self) -> ProfileStep {
        self.step
    }

    /// Advance one step. Leaving the chemicals step needs at least one chemical.
    pub fn next(&mut self) -> Result<ProfileStep, ValidationError> {
        self.step = match self.step {
            ProfileStep::Chemicals => {
                if self.profile.role().is_none() {
                    return Err(ValidationError::new(
                        "chemicalsSell",
                        "list at least one chemical you sell or buy",
                    ));
                }
                ProfileStep::Licenses
            }
            ProfileStep::Licenses | ProfileStep::Complete => ProfileStep::Complete,
        };
        Ok(self.step)
    }

    pub fn back(&mut self) -> ProfileStep {
        self.step = match self.step {
            ProfileStep::Chemicals | ProfileStep::Licenses => ProfileStep::Chemicals,
            ProfileStep::Complete => ProfileStep::Licenses,
        };
        self.step
    }

    /// Persist the profile and mark it complete. Only allowed from the last step.
    pub fn submit<S: LedgerStorage>(self, storage: &mut S) -> Result<BusinessProfile> {
        if self.step != ProfileStep::Complete {
            return Err(ValidationError::new(
                "step",
                format!("cannot submit from the {} step", self.step.title()),
            )
            .into());
        }
        save_profile(storage, &self.profile)?;
        Ok(self.profile)
    }
}

pub fn save_profile<S: LedgerStorage>(storage: &mut S, profile: &BusinessProfile) -> Result<()> {
    let json = serde_json::to_string(profile).expect("serialization should not fail");
    storage.store(PROFILE_SLOT, &json)?;
    storage.store(PROFILE_COMPLETE_SLOT, "true")?;
    info!(role = ?profile.role(), "Business profile saved");
    Ok(())
}

pub fn load_profile<S: LedgerStorage>(storage: &S) -> Result<Option<BusinessProfile>> {
    let Some(raw) = storage.load(PROFILE_SLOT)? else {
        return Ok(None);
    };
    let profile = serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
        slot: PROFILE_SLOT.to_string(),
        source,
    })?;
    Ok(Some(profile))
}

pub fn is_profile_complete<S: LedgerStorage>(storage: &S) -> Result<bool> {
    Ok(storage.load(PROFILE_COMPLETE_SLOT)?.as_deref() == Some("true"))
}
