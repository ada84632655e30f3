use std::env;

use crate::constants::{
    DEFAULT_MAIL_BACKOFF_MS, DEFAULT_MAIL_MAX_ATTEMPTS, DEFAULT_MAIL_TIMEOUT_SECS,
};
use crate::models::Tier;

/// Outbound mail settings
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// HTTP endpoint of the mail relay; log-only delivery when unset
    pub relay_url: Option<String>,
    pub relay_token: Option<String>,
    pub from_address: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

/// Jira connection settings (issue mirroring and webhook verification)
#[derive(Debug, Clone)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    pub issue_type: String,
}

/// Admin account created at startup if missing
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub environment: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub password_pepper: String,
    /// Tier given to newly onboarded customers who don't pick one
    pub default_tier: Tier,
    /// Operations mailbox that receives "action required" notices
    pub ops_mailbox: String,
    pub mail: MailConfig,
    pub jira: Option<JiraConfig>,
    pub jira_webhook_secret: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/supportdesk.db".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set for token signing")?;

        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .map_err(|_| "Invalid TOKEN_TTL_HOURS")?;

        let password_pepper = env::var("PASSWORD_PEPPER")
            .map_err(|_| "PASSWORD_PEPPER must be set for password hashing")?;

        let default_tier = env::var("DEFAULT_TIER")
            .unwrap_or_else(|_| "standard".to_string())
            .parse()
            .map_err(|_| "Invalid DEFAULT_TIER")?;

        let ops_mailbox =
            env::var("OPS_MAILBOX").unwrap_or_else(|_| "operations@localhost".to_string());

        let mail = MailConfig {
            relay_url: optional_var("MAIL_RELAY_URL"),
            relay_token: optional_var("MAIL_RELAY_TOKEN"),
            from_address: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@localhost".to_string()),
            timeout_secs: env::var("MAIL_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_MAIL_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| "Invalid MAIL_TIMEOUT_SECS")?,
            max_attempts: env::var("MAIL_MAX_ATTEMPTS")
                .unwrap_or_else(|_| DEFAULT_MAIL_MAX_ATTEMPTS.to_string())
                .parse()
                .map_err(|_| "Invalid MAIL_MAX_ATTEMPTS")?,
            backoff_ms: env::var("MAIL_BACKOFF_MS")
                .unwrap_or_else(|_| DEFAULT_MAIL_BACKOFF_MS.to_string())
                .parse()
                .map_err(|_| "Invalid MAIL_BACKOFF_MS")?,
        };

        // Jira mirroring is only enabled when every connection setting is present
        let jira = match (
            optional_var("JIRA_BASE_URL"),
            optional_var("JIRA_EMAIL"),
            optional_var("JIRA_API_TOKEN"),
            optional_var("JIRA_PROJECT_KEY"),
        ) {
            (Some(base_url), Some(email), Some(api_token), Some(project_key)) => Some(JiraConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                email,
                api_token,
                project_key,
                issue_type: env::var("JIRA_ISSUE_TYPE").unwrap_or_else(|_| "Task".to_string()),
            }),
            _ => None,
        };

        let jira_webhook_secret = optional_var("JIRA_WEBHOOK_SECRET");

        let bootstrap_admin = match (
            optional_var("BOOTSTRAP_ADMIN_EMAIL"),
            optional_var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        Ok(Config {
            server_host,
            server_port,
            database_path,
            allowed_origins,
            environment,
            jwt_secret,
            token_ttl_hours,
            password_pepper,
            default_tier,
            ops_mailbox,
            mail,
            jira,
            jira_webhook_secret,
            bootstrap_admin,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
