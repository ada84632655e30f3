//! Mirroring of issue reports into Jira
//!
//! The local issue record is authoritative. Mirroring runs after the record is
//! committed and its failure only leaves `jira_key` unset.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::JiraConfig;
use crate::constants::TRACKER_TIMEOUT_SECS;
use crate::models::IssueReport;

/// Line prefix written into tracker descriptions; the webhook reads it back
pub const REPORTER_EMAIL_PREFIX: &str = "Reporter email:";

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Tracker request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Tracker rejected issue with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Issue tracker collaborator
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create a tracker issue for the report and return its key
    async fn create_issue(&self, report: &IssueReport) -> Result<String, TrackerError>;
}

/// Description text for the tracker issue
pub fn build_issue_description(report: &IssueReport) -> String {
    let mut description = String::new();
    description.push_str(&format!(
        "{} {}\n",
        REPORTER_EMAIL_PREFIX, report.reporter_email
    ));
    if let Some(name) = &report.reporter_name {
        description.push_str(&format!("Reporter name: {}\n", name));
    }
    description.push_str(&format!("Type: {}\n", report.kind.as_str()));
    description.push_str(&format!("Reference: {}\n", report.id));
    description.push('\n');
    description.push_str(report.description.trim());
    description
}

#[derive(Debug, Deserialize)]
struct CreatedIssue {
    key: String,
}

/// Jira Cloud REST client (basic auth with an API token)
pub struct JiraClient {
    client: reqwest::Client,
    config: JiraConfig,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self, TrackerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TRACKER_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn create_issue(&self, report: &IssueReport) -> Result<String, TrackerError> {
        let url = format!("{}/rest/api/2/issue", self.config.base_url);
        let body = json!({
            "fields": {
                "project": { "key": self.config.project_key },
                "summary": report.summary,
                "description": build_issue_description(report),
                "issuetype": { "name": self.config.issue_type },
                "labels": [report.kind.as_str()],
            }
        });

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.email, Some(&self.config.api_token))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedIssue = response.json().await?;
        Ok(created.key)
    }
}
