use std::collections::BTreeMap;

use serde::Serialize;

/// The kinds of transactional email the service sends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    /// To the customer: tier-change request recorded
    RequestReceived,
    /// To operations: a tier-change request awaits a decision
    RequestActionRequired,
    UpgradeApproved,
    UpgradeDenied,
    /// To the reporter: issue report recorded
    IssueReceived,
    /// To operations: a new issue report
    IssueActionRequired,
    /// To the reporter: tracker status changed
    IssueUpdated,
    /// To a newly onboarded customer
    Welcome,
}

fn get<'a>(context: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    context.get(key).map(String::as_str).unwrap_or("")
}

/// Render the subject line and plain-text body for a notification
pub fn render(kind: TemplateKind, context: &BTreeMap<String, String>) -> (String, String) {
    let name = match get(context, "name") {
        "" => "Customer",
        name => name,
    };

    match kind {
        TemplateKind::RequestReceived => (
            "We received your storage upgrade request".to_string(),
            format!(
                "Hello {},\n\nWe received your request to move from {} ({}) to {} ({}).\n\
                 Reference: {}\n\nWe will let you know as soon as it has been reviewed.\n",
                name,
                get(context, "previous_tier"),
                get(context, "previous_quota"),
                get(context, "new_tier"),
                get(context, "new_quota"),
                get(context, "request_id"),
            ),
        ),
        TemplateKind::RequestActionRequired => (
            format!(
                "Action required: upgrade request from {}",
                get(context, "customer_email")
            ),
            format!(
                "{} <{}> requested a tier change from {} ({}) to {} ({}).\n\
                 Request id: {}\n",
                name,
                get(context, "customer_email"),
                get(context, "previous_tier"),
                get(context, "previous_quota"),
                get(context, "new_tier"),
                get(context, "new_quota"),
                get(context, "request_id"),
            ),
        ),
        TemplateKind::UpgradeApproved => (
            "Your storage upgrade has been approved".to_string(),
            format!(
                "Hello {},\n\nYour account is now on the {} tier with {} of storage.\n\
                 Reference: {}\n",
                name,
                get(context, "new_tier"),
                get(context, "new_quota"),
                get(context, "request_id"),
            ),
        ),
        TemplateKind::UpgradeDenied => (
            "Your storage upgrade request".to_string(),
            format!(
                "Hello {},\n\nWe were unable to approve your request to move to the {} tier.\n\
                 Your current plan is unchanged. Reply to this email if you have questions.\n\
                 Reference: {}\n",
                name,
                get(context, "new_tier"),
                get(context, "request_id"),
            ),
        ),
        TemplateKind::IssueReceived => (
            format!("We received your {}: {}", get(context, "kind"), get(context, "summary")),
            format!(
                "Hello {},\n\nThanks for getting in touch. Our team will follow up shortly.\n\
                 Reference: {}\n",
                name,
                get(context, "issue_id"),
            ),
        ),
        TemplateKind::IssueActionRequired => (
            format!(
                "New {} from {}: {}",
                get(context, "kind"),
                get(context, "customer_email"),
                get(context, "summary")
            ),
            format!(
                "{} <{}> reported:\n\n{}\n\nIssue id: {}\n",
                name,
                get(context, "customer_email"),
                get(context, "description"),
                get(context, "issue_id"),
            ),
        ),
        TemplateKind::IssueUpdated => (
            format!("Update on {}: {}", get(context, "jira_key"), get(context, "summary")),
            format!(
                "Hello {},\n\nThe status of {} is now \"{}\".\n",
                name,
                get(context, "jira_key"),
                get(context, "status"),
            ),
        ),
        TemplateKind::Welcome => (
            "Welcome aboard".to_string(),
            format!(
                "Hello {},\n\nYour account for {} is ready on the {} tier ({}).\n",
                name,
                get(context, "company"),
                get(context, "tier"),
                get(context, "quota"),
            ),
        ),
    }
}
