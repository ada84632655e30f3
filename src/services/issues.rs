use redb::{Database, ReadableDatabase, ReadableTable};
use serde::Deserialize;

use crate::constants::{
    ERR_INVALID_ISSUE_KIND, INITIAL_ISSUE_STATUS, MAX_DESCRIPTION_LEN, MAX_SUMMARY_LEN,
};
use crate::db::{codec, tables};
use crate::error::{AppError, Result};
use crate::models::{IssueKind, IssueReport};
use crate::validation::FieldErrors;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueInput {
    pub email: Option<String>,
    pub name: Option<String>,
    pub kind: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub reporter_email: String,
    pub reporter_name: Option<String>,
    pub kind: IssueKind,
    pub summary: String,
    pub description: String,
}

impl IssueInput {
    pub fn validate(&self) -> Result<NewIssue> {
        let mut errors = FieldErrors::new();

        let reporter_email = errors.email("email", self.email.as_deref());
        let reporter_name = errors.optional("name", self.name.as_deref());
        let summary = errors.required_text("summary", self.summary.as_deref(), MAX_SUMMARY_LEN);
        let description =
            errors.required_text("description", self.description.as_deref(), MAX_DESCRIPTION_LEN);

        let kind = match self.kind.as_deref().map(str::trim).map(str::to_ascii_lowercase) {
            None => Some(IssueKind::Issue),
            Some(kind) if kind.is_empty() || kind == "issue" => Some(IssueKind::Issue),
            Some(kind) if kind == "request" => Some(IssueKind::Request),
            Some(_) => {
                errors.add("kind", ERR_INVALID_ISSUE_KIND);
                None
            }
        };

        errors.finish()?;

        match (reporter_email, summary, description, kind) {
            (Some(reporter_email), Some(summary), Some(description), Some(kind)) => Ok(NewIssue {
                reporter_email,
                reporter_name,
                kind,
                summary,
                description,
            }),
            _ => Err(AppError::InvalidInput("Invalid issue report".to_string())),
        }
    }
}

pub fn record_issue(db: &Database, issue: NewIssue, now: i64) -> Result<IssueReport> {
    let report = IssueReport {
        id: uuid::Uuid::new_v4().to_string(),
        reporter_email: issue.reporter_email,
        reporter_name: issue.reporter_name,
        kind: issue.kind,
        summary: issue.summary,
        description: issue.description,
        status: INITIAL_ISSUE_STATUS.to_string(),
        jira_key: None,
        created_at: now,
        updated_at: now,
    };

    let write_txn = db.begin_write()?;
    {
        let mut issues = write_txn.open_table(tables::ISSUES)?;
        let bytes = codec::encode(&report)?;
        issues.insert(report.id.as_str(), bytes.as_slice())?;
    }
    write_txn.commit()?;

    tracing::info!(
        "Issue {} ({}) recorded for {}",
        report.id,
        report.kind.as_str(),
        report.reporter_email
    );
    Ok(report)
}

pub fn get_issue(db: &Database, id: &str) -> Result<Option<IssueReport>> {
    let read_txn = db.begin_read()?;
    let issues = read_txn.open_table(tables::ISSUES)?;
    let issue = issues
        .get(id)?
        .map(|b| codec::decode(b.value()))
        .transpose()?;
    Ok(issue)
}

/// Issue mirrored as the given Jira key, if any
pub fn find_by_jira_key(db: &Database, key: &str) -> Result<Option<IssueReport>> {
    let read_txn = db.begin_read()?;
    let index = read_txn.open_table(tables::JIRA_ISSUES)?;
    let Some(id) = index.get(key)?.map(|id| id.value().to_string()) else {
        return Ok(None);
    };

    let issues = read_txn.open_table(tables::ISSUES)?;
    let issue = issues
        .get(id.as_str())?
        .map(|b| codec::decode(b.value()))
        .transpose()?;
    Ok(issue)
}

/// Record the tracker key after a successful mirror
pub fn attach_jira_key(db: &Database, issue_id: &str, key: &str, now: i64) -> Result<IssueReport> {
    let write_txn = db.begin_write()?;
    let report = {
        let mut issues = write_txn.open_table(tables::ISSUES)?;
        let mut report: IssueReport = issues
            .get(issue_id)?
            .map(|b| codec::decode(b.value()))
            .transpose()?
            .ok_or(AppError::NotFound("Issue"))?;

        report.jira_key = Some(key.to_string());
        report.updated_at = now;
        let bytes = codec::encode(&report)?;
        issues.insert(issue_id, bytes.as_slice())?;
        drop(issues);

        let mut index = write_txn.open_table(tables::JIRA_ISSUES)?;
        index.insert(key, issue_id)?;
        report
    };
    write_txn.commit()?;

    tracing::info!("Issue {} mirrored as {}", issue_id, key);
    Ok(report)
}

/// Store a tracker status change on the local issue
pub fn update_status(db: &Database, issue_id: &str, status: &str, now: i64) -> Result<IssueReport> {
    let write_txn = db.begin_write()?;
    let report = {
        let mut issues = write_txn.open_table(tables::ISSUES)?;
        let mut report: IssueReport = issues
            .get(issue_id)?
            .map(|b| codec::decode(b.value()))
            .transpose()?
            .ok_or(AppError::NotFound("Issue"))?;

        report.status = status.to_string();
        report.updated_at = now;
        let bytes = codec::encode(&report)?;
        issues.insert(issue_id, bytes.as_slice())?;
        report
    };
    write_txn.commit()?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn input() -> IssueInput {
        IssueInput {
            email: Some("a@x.com".to_string()),
            name: Some("Dana".to_string()),
            kind: None,
            summary: Some("Sync fails".to_string()),
            description: Some("Uploads stop at 99%".to_string()),
        }
    }

    #[test]
    fn test_kind_defaults_to_issue() {
        assert_eq!(input().validate().unwrap().kind, IssueKind::Issue);

        let mut request = input();
        request.kind = Some("Request".to_string());
        assert_eq!(request.validate().unwrap().kind, IssueKind::Request);

        let mut bad = input();
        bad.kind = Some("complaint".to_string());
        match bad.validate() {
            Err(AppError::Validation { fields }) => {
                assert_eq!(fields.get("kind").map(String::as_str), Some(ERR_INVALID_ISSUE_KIND));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_long_description_allowed() {
        let mut long = input();
        long.description = Some("x".repeat(5_000));
        assert!(long.validate().is_ok());
    }

    #[test]
    fn test_record_and_link_jira_key() {
        let dir = TempDir::new().unwrap();
        let db = crate::db::open_database(dir.path().join("test.db")).unwrap();

        let report = record_issue(&db, input().validate().unwrap(), 100).unwrap();
        assert_eq!(report.status, "open");
        assert!(find_by_jira_key(&db, "SUP-1").unwrap().is_none());

        attach_jira_key(&db, &report.id, "SUP-1", 110).unwrap();
        let linked = find_by_jira_key(&db, "SUP-1").unwrap().unwrap();
        assert_eq!(linked.id, report.id);
        assert_eq!(linked.jira_key.as_deref(), Some("SUP-1"));

        let updated = update_status(&db, &report.id, "In Progress", 120).unwrap();
        assert_eq!(updated.status, "In Progress");
        assert_eq!(get_issue(&db, &report.id).unwrap().unwrap().updated_at, 120);
    }

    #[test]
    fn test_update_unknown_issue() {
        let dir = TempDir::new().unwrap();
        let db = crate::db::open_database(dir.path().join("test.db")).unwrap();
        assert!(matches!(
            update_status(&db, "missing", "Done", 1),
            Err(AppError::NotFound(_))
        ));
    }
}
