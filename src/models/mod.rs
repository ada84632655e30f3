pub mod issue;
pub mod profile;
pub mod request;
pub mod staff;
pub mod tier;

pub use issue::{IssueKind, IssueReport, IssueView};
pub use profile::{CustomerProfile, CustomerProfileView};
pub use request::{Decision, RequestStatus, TierChangeRequest, TierChangeRequestView};
pub use staff::{StaffAccount, StaffRole, StaffView};
pub use tier::{is_valid_quota, normalize_quota, Tier};

use chrono::{DateTime, Utc};

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Canonical form of an email address used as a storage key
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
