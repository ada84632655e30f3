use serde::{Deserialize, Serialize};

use super::timestamp_to_rfc3339;

/// Whether the customer is reporting a fault or asking for something
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Issue,
    Request,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::Issue => "issue",
            IssueKind::Request => "request",
        }
    }
}

/// Issue report stored in redb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub id: String,
    pub reporter_email: String,
    pub reporter_name: Option<String>,
    pub kind: IssueKind,
    pub summary: String,
    pub description: String,
    /// Tracker status, free-form (Jira workflows differ per project)
    pub status: String,
    /// Key of the mirrored tracker issue, once the mirror succeeded
    pub jira_key: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Issue report as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueView {
    pub id: String,
    pub reporter_email: String,
    pub reporter_name: Option<String>,
    pub kind: IssueKind,
    pub summary: String,
    pub description: String,
    pub status: String,
    pub jira_key: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&IssueReport> for IssueView {
    fn from(issue: &IssueReport) -> Self {
        Self {
            id: issue.id.clone(),
            reporter_email: issue.reporter_email.clone(),
            reporter_name: issue.reporter_name.clone(),
            kind: issue.kind,
            summary: issue.summary.clone(),
            description: issue.description.clone(),
            status: issue.status.clone(),
            jira_key: issue.jira_key.clone(),
            created_at: timestamp_to_rfc3339(issue.created_at),
            updated_at: timestamp_to_rfc3339(issue.updated_at),
        }
    }
}
