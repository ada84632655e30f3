use serde::{Deserialize, Serialize};
use std::fmt;

use super::{timestamp_to_rfc3339, Tier};

/// Where a tier-change request is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrator outcome for a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn resulting_status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

/// Tier-change request stored in redb
/// Timestamps are Unix seconds for compact storage with bincode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierChangeRequest {
    pub id: String,
    pub customer_email: String,
    pub previous_tier: Tier,
    pub new_tier: Tier,
    pub previous_quota: String,
    pub new_quota: String,
    pub requester_name: Option<String>,
    pub status: RequestStatus,
    pub submitted_at: i64,
    /// Set once, when the request leaves `pending`
    pub decided_at: Option<i64>,
    pub decided_by: Option<String>,
}

impl TierChangeRequest {
    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Move out of `pending`. The caller guarantees the request is still pending.
    pub fn record_decision(&mut self, decision: Decision, decided_by: Option<String>, now: i64) {
        debug_assert!(self.is_pending());
        self.status = decision.resulting_status();
        self.decided_at = Some(now);
        self.decided_by = decided_by;
    }
}

/// Tier-change request as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierChangeRequestView {
    pub id: String,
    pub customer_email: String,
    pub previous_tier: Tier,
    pub new_tier: Tier,
    pub previous_quota: String,
    pub new_quota: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester_name: Option<String>,
    pub status: RequestStatus,
    pub submitted_at: String,
    pub decided_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
}

impl From<&TierChangeRequest> for TierChangeRequestView {
    fn from(request: &TierChangeRequest) -> Self {
        Self {
            id: request.id.clone(),
            customer_email: request.customer_email.clone(),
            previous_tier: request.previous_tier,
            new_tier: request.new_tier,
            previous_quota: request.previous_quota.clone(),
            new_quota: request.new_quota.clone(),
            requester_name: request.requester_name.clone(),
            status: request.status,
            submitted_at: timestamp_to_rfc3339(request.submitted_at),
            decided_at: request.decided_at.map(timestamp_to_rfc3339),
            decided_by: request.decided_by.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending() -> TierChangeRequest {
        TierChangeRequest {
            id: "req-1".to_string(),
            customer_email: "a@x.com".to_string(),
            previous_tier: Tier::Standard,
            new_tier: Tier::Business,
            previous_quota: "200GB".to_string(),
            new_quota: "400GB".to_string(),
            requester_name: None,
            status: RequestStatus::Pending,
            submitted_at: 1_733_788_800,
            decided_at: None,
            decided_by: None,
        }
    }

    #[test]
    fn test_record_decision_sets_status_and_time() {
        let mut request = pending();
        request.record_decision(Decision::Approve, Some("ops@x.com".to_string()), 1_733_800_000);

        assert_eq!(request.status, RequestStatus::Approved);
        assert_eq!(request.decided_at, Some(1_733_800_000));
        assert_eq!(request.decided_by.as_deref(), Some("ops@x.com"));
        assert!(request.status.is_terminal());
    }

    #[test]
    fn test_reject_is_terminal() {
        let mut request = pending();
        request.record_decision(Decision::Reject, None, 1_733_800_000);
        assert_eq!(request.status, RequestStatus::Rejected);
        assert!(!request.is_pending());
    }

    #[test]
    fn test_view_uses_camel_case_and_rfc3339() {
        let view = TierChangeRequestView::from(&pending());
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["customerEmail"], "a@x.com");
        assert_eq!(json["newTier"], "business");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["submittedAt"], "2024-12-10T00:00:00+00:00");
        assert!(json["decidedAt"].is_null());
        assert!(json.get("requesterName").is_none());
    }
}
