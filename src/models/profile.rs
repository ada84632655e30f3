use serde::{Deserialize, Serialize};

use super::{timestamp_to_rfc3339, Tier};
use crate::constants::FALLBACK_CUSTOMER_NAME;

/// Customer profile stored in redb, keyed by normalized email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub email: String,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    /// Mirrors the most recently approved tier-change request
    pub current_tier: Option<Tier>,
    pub current_quota: Option<String>,
    /// False when the profile was created implicitly by an approval
    pub onboarded: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CustomerProfile {
    /// Bare profile for a customer who has not gone through onboarding
    pub fn implicit(email: &str, now: i64) -> Self {
        Self {
            email: email.to_string(),
            company_name: None,
            contact_name: None,
            phone: None,
            current_tier: None,
            current_quota: None,
            onboarded: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the current entitlement. Applying the same values twice is a no-op
    /// apart from `updated_at`.
    pub fn apply_tier(&mut self, tier: Tier, quota: &str, now: i64) {
        self.current_tier = Some(tier);
        self.current_quota = Some(quota.to_string());
        self.updated_at = now;
    }

    /// Name to greet the customer with
    pub fn display_name(&self) -> &str {
        self.contact_name
            .as_deref()
            .or(self.company_name.as_deref())
            .unwrap_or(FALLBACK_CUSTOMER_NAME)
    }
}

/// Customer profile as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerProfileView {
    pub email: String,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub current_tier: Option<Tier>,
    pub current_quota: Option<String>,
    pub onboarded: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&CustomerProfile> for CustomerProfileView {
    fn from(profile: &CustomerProfile) -> Self {
        Self {
            email: profile.email.clone(),
            company_name: profile.company_name.clone(),
            contact_name: profile.contact_name.clone(),
            phone: profile.phone.clone(),
            current_tier: profile.current_tier,
            current_quota: profile.current_quota.clone(),
            onboarded: profile.onboarded,
            created_at: timestamp_to_rfc3339(profile.created_at),
            updated_at: timestamp_to_rfc3339(profile.updated_at),
        }
    }
}
