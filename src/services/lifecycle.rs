//! Tier-change request lifecycle
//!
//! `pending -> approved | rejected`, both terminal. The pending index and the
//! request record are written in one redb write transaction; redb admits a
//! single writer at a time, so two concurrent submissions for the same customer
//! cannot both observe "no pending request".

use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Deserialize;

use crate::constants::{ERR_INVALID_QUOTA, ERR_INVALID_TIER, ERR_NO_CHANGE, FALLBACK_CUSTOMER_NAME};
use crate::db::{codec, tables};
use crate::error::{AppError, Result};
use crate::models::{
    is_valid_quota, normalize_email, normalize_quota, CustomerProfile, Decision, RequestStatus,
    Tier, TierChangeRequest, TierChangeRequestView,
};
use crate::validation::FieldErrors;

/// Raw intake payload; every field optional so missing ones surface as field errors
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierChangeInput {
    pub customer_email: Option<String>,
    pub previous_tier: Option<String>,
    pub new_tier: Option<String>,
    pub previous_quota: Option<String>,
    pub new_quota: Option<String>,
    pub requester_name: Option<String>,
}

/// Validated intake
#[derive(Debug, Clone, PartialEq)]
pub struct NewTierChange {
    pub customer_email: String,
    pub previous_tier: Tier,
    pub new_tier: Tier,
    pub previous_quota: String,
    pub new_quota: String,
    pub requester_name: Option<String>,
}

fn parse_tier(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<Tier> {
    let value = errors.required(field, value)?;
    match value.parse() {
        Ok(tier) => Some(tier),
        Err(_) => {
            errors.add(field, ERR_INVALID_TIER);
            None
        }
    }
}

fn parse_quota(errors: &mut FieldErrors, field: &str, value: Option<&str>) -> Option<String> {
    let value = errors.required(field, value)?;
    if !is_valid_quota(&value) {
        errors.add(field, ERR_INVALID_QUOTA);
        return None;
    }
    Some(normalize_quota(&value))
}

impl TierChangeInput {
    pub fn validate(&self) -> Result<NewTierChange> {
        let mut errors = FieldErrors::new();

        let customer_email = errors.email("customerEmail", self.customer_email.as_deref());
        let previous_tier = parse_tier(&mut errors, "previousTier", self.previous_tier.as_deref());
        let new_tier = parse_tier(&mut errors, "newTier", self.new_tier.as_deref());
        let previous_quota =
            parse_quota(&mut errors, "previousQuota", self.previous_quota.as_deref());
        let new_quota = parse_quota(&mut errors, "newQuota", self.new_quota.as_deref());
        let requester_name = errors.optional("requesterName", self.requester_name.as_deref());

        match (customer_email, previous_tier, new_tier, previous_quota, new_quota) {
            (
                Some(customer_email),
                Some(previous_tier),
                Some(new_tier),
                Some(previous_quota),
                Some(new_quota),
            ) if errors.is_empty() => {
                if previous_tier == new_tier && previous_quota == new_quota {
                    return Err(AppError::invalid_field("newTier", ERR_NO_CHANGE));
                }
                Ok(NewTierChange {
                    customer_email,
                    previous_tier,
                    new_tier,
                    previous_quota,
                    new_quota,
                    requester_name,
                })
            }
            _ => {
                errors.finish()?;
                // finish() only returns Ok when no field failed, which implies every value parsed
                Err(AppError::InvalidInput("Invalid upgrade request".to_string()))
            }
        }
    }
}

/// Outcome of a successful submission or decision, with the name to greet
/// the customer by in notifications
#[derive(Debug, Clone)]
pub struct Recorded {
    pub request: TierChangeRequest,
    pub customer_name: String,
}

/// Current entitlement plus outstanding and latest requests
#[derive(Debug, Clone, Default)]
pub struct TierStatus {
    pub current_tier: Option<Tier>,
    pub current_quota: Option<String>,
    pub pending_request: Option<TierChangeRequest>,
    pub last_request: Option<TierChangeRequest>,
}

fn customer_name(profile: Option<&CustomerProfile>, requester_name: Option<&str>) -> String {
    requester_name
        .or_else(|| profile.map(CustomerProfile::display_name))
        .unwrap_or(FALLBACK_CUSTOMER_NAME)
        .to_string()
}

/// Record a new pending request, or fail with the conflicting pending one
pub fn submit_request(db: &Database, change: NewTierChange, now: i64) -> Result<Recorded> {
    let email = change.customer_email.clone();

    let write_txn = db.begin_write()?;
    let recorded = {
        let mut pending = write_txn.open_table(tables::PENDING_REQUESTS)?;
        let mut requests = write_txn.open_table(tables::TIER_REQUESTS)?;

        let existing_id = pending
            .get(email.as_str())?
            .map(|id| id.value().to_string());

        if let Some(existing_id) = existing_id {
            let existing: Option<TierChangeRequest> = requests
                .get(existing_id.as_str())?
                .map(|b| codec::decode(b.value()))
                .transpose()?;

            match existing {
                Some(existing) if existing.is_pending() => {
                    tracing::info!(
                        "Duplicate upgrade request for {} (pending: {})",
                        email,
                        existing.id
                    );
                    return Err(AppError::DuplicateRequest(Box::new(
                        TierChangeRequestView::from(&existing),
                    )));
                }
                _ => {
                    // Stale index entry; the insert below overwrites it
                    tracing::warn!("Pending index for {} pointed at {}", email, existing_id);
                }
            }
        }

        let request = TierChangeRequest {
            id: uuid::Uuid::new_v4().to_string(),
            customer_email: email.clone(),
            previous_tier: change.previous_tier,
            new_tier: change.new_tier,
            previous_quota: change.previous_quota,
            new_quota: change.new_quota,
            requester_name: change.requester_name,
            status: RequestStatus::Pending,
            submitted_at: now,
            decided_at: None,
            decided_by: None,
        };

        let bytes = codec::encode(&request)?;
        requests.insert(request.id.as_str(), bytes.as_slice())?;
        pending.insert(email.as_str(), request.id.as_str())?;
        drop(requests);
        drop(pending);

        // Append to the customer's request history
        let mut history = write_txn.open_table(tables::CUSTOMER_REQUESTS)?;
        let mut ids: Vec<String> = history
            .get(email.as_str())?
            .map(|b| codec::decode(b.value()))
            .transpose()?
            .unwrap_or_default();
        ids.push(request.id.clone());
        let ids_bytes = codec::encode(&ids)?;
        history.insert(email.as_str(), ids_bytes.as_slice())?;
        drop(history);

        let profiles = write_txn.open_table(tables::PROFILES)?;
        let profile: Option<CustomerProfile> = profiles
            .get(email.as_str())?
            .map(|b| codec::decode(b.value()))
            .transpose()?;

        Recorded {
            customer_name: customer_name(profile.as_ref(), request.requester_name.as_deref()),
            request,
        }
    };
    write_txn.commit()?;

    tracing::info!(
        "Upgrade request {} recorded for {}: {} -> {}",
        recorded.request.id,
        recorded.request.customer_email,
        recorded.request.previous_tier,
        recorded.request.new_tier
    );

    Ok(recorded)
}

/// Apply an administrator decision to a pending request
///
/// On approval the customer's profile takes the new tier and quota in the same
/// transaction. Deciding a request that is no longer pending fails with
/// `InvalidState` and changes nothing.
pub fn decide(
    db: &Database,
    request_id: &str,
    decision: Decision,
    decided_by: Option<String>,
    now: i64,
) -> Result<Recorded> {
    let write_txn = db.begin_write()?;
    let recorded = {
        let mut requests = write_txn.open_table(tables::TIER_REQUESTS)?;
        let mut request: TierChangeRequest = requests
            .get(request_id)?
            .map(|b| codec::decode(b.value()))
            .transpose()?
            .ok_or(AppError::NotFound("Request"))?;

        if request.status.is_terminal() {
            tracing::warn!(
                "Decision on request {} rejected: already {}",
                request.id,
                request.status
            );
            return Err(AppError::InvalidState {
                status: request.status,
            });
        }

        request.record_decision(decision, decided_by, now);
        let bytes = codec::encode(&request)?;
        requests.insert(request.id.as_str(), bytes.as_slice())?;
        drop(requests);

        let mut pending = write_txn.open_table(tables::PENDING_REQUESTS)?;
        let indexed = pending
            .get(request.customer_email.as_str())?
            .map(|id| id.value() == request.id)
            .unwrap_or(false);
        if indexed {
            pending.remove(request.customer_email.as_str())?;
        }
        drop(pending);

        let mut profiles = write_txn.open_table(tables::PROFILES)?;
        let mut profile: Option<CustomerProfile> = profiles
            .get(request.customer_email.as_str())?
            .map(|b| codec::decode(b.value()))
            .transpose()?;

        if decision == Decision::Approve {
            let updated = profile
                .get_or_insert_with(|| CustomerProfile::implicit(&request.customer_email, now));
            updated.apply_tier(request.new_tier, &request.new_quota, now);
            let profile_bytes = codec::encode(&*updated)?;
            profiles.insert(request.customer_email.as_str(), profile_bytes.as_slice())?;
        }

        Recorded {
            customer_name: customer_name(profile.as_ref(), request.requester_name.as_deref()),
            request,
        }
    };
    write_txn.commit()?;

    tracing::info!(
        "Upgrade request {} {} for {}",
        recorded.request.id,
        recorded.request.status,
        recorded.request.customer_email
    );

    Ok(recorded)
}

/// Reconstruct a customer's entitlement and requests. Never fails for
/// unknown customers; the fields are simply empty.
pub fn get_status(db: &Database, customer_email: &str) -> Result<TierStatus> {
    let email = normalize_email(customer_email);
    let read_txn = db.begin_read()?;

    let profiles = read_txn.open_table(tables::PROFILES)?;
    let profile: Option<CustomerProfile> = profiles
        .get(email.as_str())?
        .map(|b| codec::decode(b.value()))
        .transpose()?;

    let requests = read_txn.open_table(tables::TIER_REQUESTS)?;
    let load = |id: &str| -> Result<Option<TierChangeRequest>> {
        requests
            .get(id)?
            .map(|b| codec::decode(b.value()))
            .transpose()
    };

    let pending = read_txn.open_table(tables::PENDING_REQUESTS)?;
    let pending_id = pending.get(email.as_str())?.map(|id| id.value().to_string());
    let pending_request = match pending_id {
        Some(id) => load(id.as_str())?.filter(TierChangeRequest::is_pending),
        None => None,
    };

    let history = read_txn.open_table(tables::CUSTOMER_REQUESTS)?;
    let ids: Vec<String> = history
        .get(email.as_str())?
        .map(|b| codec::decode(b.value()))
        .transpose()?
        .unwrap_or_default();
    let last_request = match ids.last() {
        Some(id) => load(id.as_str())?,
        None => None,
    };

    Ok(TierStatus {
        current_tier: profile.as_ref().and_then(|p| p.current_tier),
        current_quota: profile.and_then(|p| p.current_quota),
        pending_request,
        last_request,
    })
}

/// Every request a customer has submitted, oldest first
pub fn requests_for_customer(db: &Database, customer_email: &str) -> Result<Vec<TierChangeRequest>> {
    let email = normalize_email(customer_email);
    let read_txn = db.begin_read()?;

    let history = read_txn.open_table(tables::CUSTOMER_REQUESTS)?;
    let ids: Vec<String> = history
        .get(email.as_str())?
        .map(|b| codec::decode(b.value()))
        .transpose()?
        .unwrap_or_default();

    let requests = read_txn.open_table(tables::TIER_REQUESTS)?;
    let mut out = Vec::with_capacity(ids.len());
    for id in &ids {
        if let Some(bytes) = requests.get(id.as_str())? {
            out.push(codec::decode(bytes.value())?);
        }
    }
    Ok(out)
}

/// All requests, optionally filtered by status, newest first
pub fn list_requests(db: &Database, status: Option<RequestStatus>) -> Result<Vec<TierChangeRequest>> {
    let read_txn = db.begin_read()?;
    let requests = read_txn.open_table(tables::TIER_REQUESTS)?;

    let mut out = Vec::new();
    for entry in requests.iter()? {
        let (_, value) = entry?;
        let request: TierChangeRequest = codec::decode(value.value())?;
        if status.map_or(true, |s| request.status == s) {
            out.push(request);
        }
    }

    out.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
    Ok(out)
}
