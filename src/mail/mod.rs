//! Outgoing mail.
//!
//! Mails are delivered by a [`Mailer`] chosen from `[mail] backend`:
//! - `console` logs each mail through tracing
//! - `smtp` relays through an SMTP server with lettre
//! - `memory` keeps mails in an in-process outbox

mod smtp;

pub use smtp::SmtpMailer;

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::{MailBackend, MailConfig};
use crate::Result;

/// A plain-text mail ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    /// Build a mail using the configured sender and subject prefix.
    ///
    /// Line breaks in the subject are collapsed so a template cannot inject headers.
    pub fn compose(
        config: &MailConfig,
        to: impl Into<String>,
        subject: &str,
        body: impl Into<String>,
    ) -> Self {
        let subject = subject.split_whitespace().collect::<Vec<_>>().join(" ");
        let subject = if config.subject_prefix.is_empty() {
            subject
        } else {
            format!("{} {}", config.subject_prefix, subject)
        };

        Self {
            from: config.from_email.clone(),
            to: to.into(),
            subject,
            body: body.into(),
        }
    }
}

/// Mail delivery backend.
///
/// Delivery may block; async callers run it on the blocking thread pool.
pub trait Mailer: Send + Sync {
    /// Deliver one mail.
    fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Writes mails to the log instead of delivering them.
#[derive(Debug, Default)]
pub struct ConsoleMailer;

impl Mailer for ConsoleMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        info!(
            from = %mail.from,
            to = %mail.to,
            subject = %mail.subject,
            "Outgoing mail\n{}",
            mail.body
        );
        Ok(())
    }
}

/// Keeps delivered mails in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutgoingMail>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all mails sent so far.
    pub fn outbox(&self) -> Vec<OutgoingMail> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Number of mails sent so far.
    pub fn len(&self) -> usize {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all stored mails.
    pub fn clear(&self) {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        self.outbox
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(mail.clone());
        Ok(())
    }
}

/// Build the mailer selected by the configuration.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>> {
    let mailer: Arc<dyn Mailer> = match config.backend {
        MailBackend::Console => Arc::new(ConsoleMailer),
        MailBackend::Memory => Arc::new(MemoryMailer::new()),
        MailBackend::Smtp => Arc::new(SmtpMailer::new(config)?),
    };
    Ok(mailer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_applies_prefix_and_sender() {
        let config = MailConfig::default();
        let mail = OutgoingMail::compose(
            &config,
            "john@example.com",
            "Password reset\nconfirmation",
            "body",
        );

        assert_eq!(mail.from, "noreply@localhost");
        assert_eq!(mail.to, "john@example.com");
        assert_eq!(mail.subject, "[Forum] Password reset confirmation");
    }

    #[test]
    fn test_compose_without_prefix() {
        let config = MailConfig {
            subject_prefix: String::new(),
            ..MailConfig::default()
        };
        let mail = OutgoingMail::compose(&config, "a@b.c", "Hello", "body");
        assert_eq!(mail.subject, "Hello");
    }

    #[test]
    fn test_memory_mailer_outbox() {
        let mailer = MemoryMailer::new();
        assert!(mailer.is_empty());

        let mail = OutgoingMail::compose(&MailConfig::default(), "a@b.c", "Hi", "there");
        mailer.send(&mail).unwrap();
        mailer.send(&mail).unwrap();

        assert_eq!(mailer.len(), 2);
        assert_eq!(mailer.outbox()[0], mail);
        mailer.clear();
        assert!(mailer.is_empty());
    }

    #[test]
    fn test_console_mailer_accepts_mail() {
        let mail = OutgoingMail::compose(&MailConfig::default(), "a@b.c", "Hi", "there");
        assert!(ConsoleMailer.send(&mail).is_ok());
    }

    #[test]
    fn test_from_config() {
        assert!(from_config(&MailConfig::default()).is_ok());
        let config = MailConfig {
            backend: MailBackend::Memory,
            ..MailConfig::default()
        };
        assert!(from_config(&config).is_ok());
    }
}
