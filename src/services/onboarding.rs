use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Deserialize;

use crate::constants::{ERR_INVALID_QUOTA, ERR_INVALID_TIER, ERR_REQUIRED};
use crate::db::{codec, tables};
use crate::error::{AppError, Result};
use crate::models::{is_valid_quota, normalize_email, normalize_quota, CustomerProfile, Tier};
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingInput {
    pub email: Option<String>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub tier: Option<String>,
    pub quota: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomer {
    pub email: String,
    pub company_name: String,
    pub contact_name: String,
    pub phone: Option<String>,
    pub tier: Option<Tier>,
    pub quota: Option<String>,
}

impl OnboardingInput {
    pub fn validate(&self) -> Result<NewCustomer> {
        let mut errors = FieldErrors::new();

        let email = errors.email("email", self.email.as_deref());
        let company_name = errors.required("companyName", self.company_name.as_deref());
        let contact_name = errors.required("contactName", self.contact_name.as_deref());
        let phone = errors.optional("phone", self.phone.as_deref());

        let tier = match errors.optional("tier", self.tier.as_deref()) {
            Some(raw) => match raw.parse::<Tier>() {
                Ok(tier) => Some(tier),
                Err(_) => {
                    errors.add("tier", ERR_INVALID_TIER);
                    None
                }
            },
            None => None,
        };

        let quota = match errors.optional("quota", self.quota.as_deref()) {
            Some(raw) if is_valid_quota(&raw) => Some(normalize_quota(&raw)),
            Some(_) => {
                errors.add("quota", ERR_INVALID_QUOTA);
                None
            }
            None => None,
        };

        // Custom tiers have no catalog quota to fall back on
        if tier == Some(Tier::Custom) && quota.is_none() {
            errors.add("quota", ERR_REQUIRED);
        }

        errors.finish()?;

        match (email, company_name, contact_name) {
            (Some(email), Some(company_name), Some(contact_name)) => Ok(NewCustomer {
                email,
                company_name,
                contact_name,
                phone,
                tier,
                quota,
            }),
            _ => Err(AppError::InvalidInput("Invalid onboarding request".to_string())),
        }
    }
}

/// Create the customer's profile, or complete one that an approval created
///
/// New profiles start on the requested tier, or `default_tier`, with that
/// tier's catalog quota unless a quota was given. A profile created implicitly
/// by an approval keeps its tier. An already onboarded customer is a conflict.
pub fn onboard(
    db: &Database,
    customer: NewCustomer,
    default_tier: Tier,
    now: i64,
) -> Result<CustomerProfile> {
    let write_txn = db.begin_write()?;
    let profile = {
        let mut profiles = write_txn.open_table(tables::PROFILES)?;
        let existing: Option<CustomerProfile> = profiles
            .get(customer.email.as_str())?
            .map(|b| codec::decode(b.value()))
            .transpose()?;

        let profile = match existing {
            Some(existing) if existing.onboarded => {
                tracing::info!("Customer {} already onboarded", customer.email);
                return Err(AppError::Conflict("Customer already onboarded".to_string()));
            }
            Some(mut implicit) => {
                implicit.company_name = Some(customer.company_name);
                implicit.contact_name = Some(customer.contact_name);
                implicit.phone = customer.phone;
                implicit.onboarded = true;
                implicit.updated_at = now;
                implicit
            }
            None => {
                let tier = customer.tier.unwrap_or(default_tier);
                let quota = customer
                    .quota
                    .or_else(|| tier.default_quota().map(str::to_string));
                CustomerProfile {
                    email: customer.email,
                    company_name: Some(customer.company_name),
                    contact_name: Some(customer.contact_name),
                    phone: customer.phone,
                    current_tier: Some(tier),
                    current_quota: quota,
                    onboarded: true,
                    created_at: now,
                    updated_at: now,
                }
            }
        };

        let bytes = codec::encode(&profile)?;
        profiles.insert(profile.email.as_str(), bytes.as_slice())?;
        profile
    };
    write_txn.commit()?;

    tracing::info!("Customer {} onboarded", profile.email);
    Ok(profile)
}

pub fn get_profile(db: &Database, email: &str) -> Result<Option<CustomerProfile>> {
    let email = normalize_email(email);
    let read_txn = db.begin_read()?;
    let profiles = read_txn.open_table(tables::PROFILES)?;

    let profile = profiles
        .get(email.as_str())?
        .map(|b| codec::decode(b.value()))
        .transpose()?;
    Ok(profile)
}
