use redb::TableDefinition;

/// Tier-change requests: request id -> TierChangeRequest (serialized)
pub const TIER_REQUESTS: TableDefinition<&str, &[u8]> = TableDefinition::new("tier_requests");

/// Customer request index: customer email -> Vec<request id>, in submission order
pub const CUSTOMER_REQUESTS: TableDefinition<&str, &[u8]> =
    TableDefinition::new("customer_requests");

/// Pending request index: customer email -> id of its single pending request
/// Acts as the unique constraint on (customer email, status = pending)
pub const PENDING_REQUESTS: TableDefinition<&str, &str> = TableDefinition::new("pending_requests");

/// Customer profiles: customer email -> CustomerProfile (serialized)
pub const PROFILES: TableDefinition<&str, &[u8]> = TableDefinition::new("profiles");

/// Staff accounts: staff email -> StaffAccount (serialized)
pub const STAFF: TableDefinition<&str, &[u8]> = TableDefinition::new("staff");

/// Issue reports: issue id -> IssueReport (serialized)
pub const ISSUES: TableDefinition<&str, &[u8]> = TableDefinition::new("issues");

/// Jira issue index: Jira key -> issue id
pub const JIRA_ISSUES: TableDefinition<&str, &str> = TableDefinition::new("jira_issues");
