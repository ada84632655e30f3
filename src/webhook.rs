//! Reading Jira webhook payloads
//!
//! The reporter's email can sit in several places depending on project
//! configuration and on whether the issue was created by this service. Each
//! place is a named [`EmailStrategy`]; [`find_reporter_email`] tries them in
//! order and returns the first hit.

use serde_json::Value;

use crate::models::normalize_email;
use crate::tracker::REPORTER_EMAIL_PREFIX;
use crate::validation::is_valid_email;

/// One way of locating the reporter's email in a payload
pub struct EmailStrategy {
    pub name: &'static str,
    extract: fn(&Value) -> Option<String>,
}

impl EmailStrategy {
    pub fn extract(&self, payload: &Value) -> Option<String> {
        (self.extract)(payload)
            .filter(|email| is_valid_email(email))
            .map(|email| normalize_email(&email))
    }
}

/// Strategies in the order they are tried
pub const STRATEGIES: &[EmailStrategy] = &[
    EmailStrategy {
        name: "reporter_field",
        extract: reporter_field,
    },
    EmailStrategy {
        name: "description_line",
        extract: description_line,
    },
    EmailStrategy {
        name: "custom_field",
        extract: custom_field,
    },
    EmailStrategy {
        name: "creator_field",
        extract: creator_field,
    },
];

/// Email found by a strategy
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMatch {
    pub email: String,
    pub strategy: &'static str,
}

pub fn find_reporter_email(strategies: &[EmailStrategy], payload: &Value) -> Option<EmailMatch> {
    strategies.iter().find_map(|strategy| {
        strategy.extract(payload).map(|email| EmailMatch {
            email,
            strategy: strategy.name,
        })
    })
}

fn fields(payload: &Value) -> Option<&Value> {
    payload.get("issue")?.get("fields")
}

fn reporter_field(payload: &Value) -> Option<String> {
    fields(payload)?
        .get("reporter")?
        .get("emailAddress")?
        .as_str()
        .map(str::to_string)
}

fn description_line(payload: &Value) -> Option<String> {
    let description = fields(payload)?.get("description")?.as_str()?;
    description.lines().find_map(|line| {
        let line = line.trim();
        let prefix = line.get(..REPORTER_EMAIL_PREFIX.len())?;
        if prefix.eq_ignore_ascii_case(REPORTER_EMAIL_PREFIX) {
            Some(line[REPORTER_EMAIL_PREFIX.len()..].trim().to_string())
        } else {
            None
        }
    })
}

fn custom_field(payload: &Value) -> Option<String> {
    let fields = fields(payload)?.as_object()?;
    fields
        .iter()
        .filter(|(key, _)| key.starts_with("customfield_"))
        .find_map(|(_, value)| {
            let candidate = match value {
                Value::String(s) => Some(s.as_str()),
                Value::Object(_) => value.get("emailAddress").and_then(Value::as_str),
                _ => None,
            }?;
            is_valid_email(candidate).then(|| candidate.to_string())
        })
}

fn creator_field(payload: &Value) -> Option<String> {
    fields(payload)?
        .get("creator")?
        .get("emailAddress")?
        .as_str()
        .map(str::to_string)
}

/// Issue key such as `SUP-42`
pub fn issue_key(payload: &Value) -> Option<&str> {
    payload.get("issue")?.get("key")?.as_str()
}

pub fn issue_summary(payload: &Value) -> Option<&str> {
    fields(payload)?.get("summary")?.as_str()
}

/// New status name when the event's changelog contains a status transition
pub fn status_change(payload: &Value) -> Option<String> {
    payload
        .get("changelog")?
        .get("items")?
        .as_array()?
        .iter()
        .find(|item| item.get("field").and_then(Value::as_str) == Some("status"))
        .and_then(|item| item.get("toString").and_then(Value::as_str))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reporter_field() {
        let payload = json!({"issue": {"fields": {"reporter": {"emailAddress": "Dana@X.com"}}}});
        assert_eq!(reporter_field(&payload).as_deref(), Some("Dana@X.com"));
        assert_eq!(
            find_reporter_email(STRATEGIES, &payload),
            Some(EmailMatch {
                email: "dana@x.com".to_string(),
                strategy: "reporter_field"
            })
        );
    }

    #[test]
    fn test_description_line() {
        let payload = json!({"issue": {"fields": {
            "description": "Type: issue\nreporter EMAIL:  a@x.com \n\nBody"
        }}});
        assert_eq!(description_line(&payload).as_deref(), Some("a@x.com"));
    }

    #[test]
    fn test_custom_field_string_and_object() {
        let payload = json!({"issue": {"fields": {
            "customfield_10010": "not an email",
            "customfield_10020": "b@x.com"
        }}});
        assert_eq!(custom_field(&payload).as_deref(), Some("b@x.com"));

        let payload = json!({"issue": {"fields": {
            "customfield_10030": {"emailAddress": "c@x.com"}
        }}});
        assert_eq!(custom_field(&payload).as_deref(), Some("c@x.com"));
    }

    #[test]
    fn test_creator_field() {
        let payload = json!({"issue": {"fields": {"creator": {"emailAddress": "d@x.com"}}}});
        assert_eq!(creator_field(&payload).as_deref(), Some("d@x.com"));
    }

    #[test]
    fn test_strategy_order() {
        // Reporter hidden (privacy settings), description and creator both present
        let payload = json!({"issue": {"fields": {
            "reporter": {"displayName": "Dana"},
            "description": "Reporter email: a@x.com",
            "creator": {"emailAddress": "bot@x.com"}
        }}});

        let found = find_reporter_email(STRATEGIES, &payload).unwrap();
        assert_eq!(found.email, "a@x.com");
        assert_eq!(found.strategy, "description_line");
    }

    #[test]
    fn test_invalid_candidates_skipped() {
        let payload = json!({"issue": {"fields": {
            "reporter": {"emailAddress": "?"},
            "creator": {"emailAddress": "d@x.com"}
        }}});
        assert_eq!(find_reporter_email(STRATEGIES, &payload).unwrap().strategy, "creator_field");
    }

    #[test]
    fn test_nothing_found() {
        assert!(find_reporter_email(STRATEGIES, &json!({"issue": {"fields": {}}})).is_none());
        assert!(find_reporter_email(STRATEGIES, &json!([])).is_none());
    }

    #[test]
    fn test_status_change() {
        let payload = json!({"changelog": {"items": [
            {"field": "assignee", "toString": "Ops"},
            {"field": "status", "fromString": "Open", "toString": "In Progress"}
        ]}});
        assert_eq!(status_change(&payload).as_deref(), Some("In Progress"));
        assert!(status_change(&json!({"changelog": {"items": []}})).is_none());
    }

    #[test]
    fn test_issue_key_and_summary() {
        let payload = json!({"issue": {"key": "SUP-7", "fields": {"summary": "Sync fails"}}});
        assert_eq!(issue_key(&payload), Some("SUP-7"));
        assert_eq!(issue_summary(&payload), Some("Sync fails"));
    }
}
