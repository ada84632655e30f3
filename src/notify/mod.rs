//! Outbound notifications
//!
//! Handlers build a [`Notification`] after their state change has committed and
//! hand it to the [`Dispatcher`], which delivers it on a background task with a
//! per-attempt timeout and exponential backoff. Delivery failures are logged and
//! never reach the caller.

pub mod relay;
pub mod templates;

pub use relay::MailRelayNotifier;
pub use templates::TemplateKind;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Mail relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mail relay rejected message with status {0}")]
    Rejected(u16),

    #[error("Delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

/// A single email to one recipient
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub to: String,
    pub kind: TemplateKind,
    pub context: BTreeMap<String, String>,
}

impl Notification {
    pub fn new(to: impl Into<String>, kind: TemplateKind) -> Self {
        Self {
            to: to.into(),
            kind,
            context: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    /// Subject and plain-text body
    pub fn render(&self) -> (String, String) {
        templates::render(self.kind, &self.context)
    }
}

/// Email-sending collaborator
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Writes notifications to the log instead of sending them
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        let (subject, _) = notification.render();
        tracing::info!(
            to = %notification.to,
            kind = ?notification.kind,
            "Notification (log only): {}",
            subject
        );
        Ok(())
    }
}

/// Captures notifications in memory; optionally fails the first N sends
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
    failures_left: Mutex<u32>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(failures: u32) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failures_left: Mutex::new(failures),
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Poll until at least `count` notifications arrived or `timeout` elapsed
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<Notification> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let sent = self.sent();
            if sent.len() >= count || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        if let Ok(mut failures) = self.failures_left.lock() {
            if *failures > 0 {
                *failures -= 1;
                return Err(NotificationError::Other("simulated failure".to_string()));
            }
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        Ok(())
    }
}

/// Delivery attempts, per-attempt timeout and backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &MailConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            attempt_timeout: Duration::from_secs(config.timeout_secs),
            initial_backoff: Duration::from_millis(config.backoff_ms),
        }
    }
}

/// Fire-and-forget front of a [`Notifier`]
#[derive(Clone)]
pub struct Dispatcher {
    notifier: Arc<dyn Notifier>,
    policy: RetryPolicy,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, policy: RetryPolicy) -> Self {
        Self { notifier, policy }
    }

    /// Mail relay when one is configured, otherwise log-only delivery
    pub fn from_config(config: &MailConfig) -> Result<Self, NotificationError> {
        let notifier: Arc<dyn Notifier> = match MailRelayNotifier::from_config(config)? {
            Some(relay) => Arc::new(relay),
            None => {
                tracing::warn!("MAIL_RELAY_URL not set, notifications will only be logged");
                Arc::new(LogNotifier)
            }
        };
        Ok(Self::new(notifier, RetryPolicy::from_config(config)))
    }

    /// Queue a notification for background delivery. Never blocks, never fails.
    pub fn dispatch(&self, notification: Notification) {
        if notification.to.trim().is_empty() {
            tracing::debug!(kind = ?notification.kind, "Skipping notification without recipient");
            return;
        }

        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(e) = dispatcher.deliver(&notification).await {
                tracing::error!(
                    to = %notification.to,
                    kind = ?notification.kind,
                    notifier = dispatcher.notifier.name(),
                    "Notification delivery failed: {}",
                    e
                );
            }
        });
    }

    /// Deliver with retries, returning the last error once attempts run out
    pub async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.initial_backoff;
        let mut attempt = 1;

        loop {
            let result = match tokio::time::timeout(
                self.policy.attempt_timeout,
                self.notifier.send(notification),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(NotificationError::Timeout(self.policy.attempt_timeout)),
            };

            match result {
                Ok(()) => {
                    tracing::debug!(to = %notification.to, kind = ?notification.kind, attempt, "Notification sent");
                    return Ok(());
                }
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        to = %notification.to,
                        attempt,
                        "Notification attempt failed, retrying in {:?}: {}",
                        backoff,
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            attempt_timeout: Duration::from_millis(200),
            initial_backoff: Duration::from_millis(1),
        }
    }

    struct SlowNotifier;

    #[async_trait]
    impl Notifier for SlowNotifier {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn send(&self, _: &Notification) -> Result<(), NotificationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_deliver_retries_until_success() {
        let notifier = Arc::new(RecordingNotifier::failing_first(2));
        let dispatcher = Dispatcher::new(notifier.clone(), fast_policy(3));

        let notification = Notification::new("a@x.com", TemplateKind::UpgradeApproved);
        tokio_test::assert_ok!(dispatcher.deliver(&notification).await);
        assert_eq!(notifier.sent(), vec![notification]);
    }

    #[tokio::test]
    async fn test_deliver_gives_up_after_max_attempts() {
        let notifier = Arc::new(RecordingNotifier::failing_first(5));
        let dispatcher = Dispatcher::new(notifier.clone(), fast_policy(3));

        let notification = Notification::new("a@x.com", TemplateKind::UpgradeDenied);
        tokio_test::assert_err!(dispatcher.deliver(&notification).await);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_deliver_times_out_slow_notifier() {
        let dispatcher = Dispatcher::new(Arc::new(SlowNotifier), fast_policy(1));
        let notification = Notification::new("a@x.com", TemplateKind::Welcome);

        match dispatcher.deliver(&notification).await {
            Err(NotificationError::Timeout(_)) => {}
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_runs_in_background() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = Dispatcher::new(notifier.clone(), fast_policy(1));

        dispatcher.dispatch(Notification::new("a@x.com", TemplateKind::Welcome).with("name", "Dana"));
        let sent = notifier.wait_for(1, Duration::from_secs(2)).await;

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].context["name"], "Dana");
    }

    #[tokio::test]
    async fn test_dispatch_skips_empty_recipient() {
        let notifier = Arc::new(RecordingNotifier::new());
        let dispatcher = Dispatcher::new(notifier.clone(), fast_policy(1));

        dispatcher.dispatch(Notification::new("  ", TemplateKind::UpgradeDenied));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(notifier.sent().is_empty());
    }
}
