/// Default quota for the standard tier
pub const STANDARD_QUOTA: &str = "200GB";

/// Default quota for the business tier
pub const BUSINESS_QUOTA: &str = "400GB";

/// Default quota for the premium tier
pub const PREMIUM_QUOTA: &str = "2TB";

/// Maximum length of a single free-text field (names, quotas, company)
pub const MAX_FIELD_LEN: usize = 200;

/// Maximum length of an issue summary
pub const MAX_SUMMARY_LEN: usize = 255;

/// Maximum length of an issue description (64KB)
pub const MAX_DESCRIPTION_LEN: usize = 65_536;

/// Minimum staff password length
pub const MIN_PASSWORD_LEN: usize = 10;

/// Status assigned to newly reported issues
pub const INITIAL_ISSUE_STATUS: &str = "open";

/// Name used in notifications when nothing better is on file
pub const FALLBACK_CUSTOMER_NAME: &str = "Customer";

/// Header carrying the Jira webhook signature
pub const WEBHOOK_SIGNATURE_HEADER: &str = "x-hub-signature";

// =============================================================================
// Notification delivery defaults
// =============================================================================

/// Per-attempt timeout for outbound mail (seconds)
pub const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;

/// Attempts before a notification is given up on
pub const DEFAULT_MAIL_MAX_ATTEMPTS: u32 = 3;

/// Initial backoff between attempts, doubled each retry (milliseconds)
pub const DEFAULT_MAIL_BACKOFF_MS: u64 = 500;

/// Timeout for calls to the issue tracker (seconds)
pub const TRACKER_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// Error Messages
// =============================================================================

/// Error message for blank required fields
pub const ERR_REQUIRED: &str = "is required";

/// Error message for malformed email addresses
pub const ERR_INVALID_EMAIL: &str = "must be a valid email address";

/// Error message for unknown tier names
pub const ERR_INVALID_TIER: &str = "must be one of standard, business, premium, custom";

/// Error message for malformed quota strings
pub const ERR_INVALID_QUOTA: &str = "must be a capacity such as 200GB or 2TB";

/// Error message for over-long fields
pub const ERR_TOO_LONG: &str = "is too long";

/// Error message for staff passwords under the minimum length
pub const ERR_PASSWORD_TOO_SHORT: &str = "is too short";

/// Error message for unknown issue kinds
pub const ERR_INVALID_ISSUE_KIND: &str = "must be issue or request";

/// Error message for requests that change nothing
pub const ERR_NO_CHANGE: &str = "no change requested";
