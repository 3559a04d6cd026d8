//! SMTP delivery through lettre.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::{debug, error};

use super::{Mailer, OutgoingMail};
use crate::config::MailConfig;
use crate::{ForumError, Result};

/// Relays mails to an SMTP server.
pub struct SmtpMailer {
    transport: SmtpTransport,
}

impl SmtpMailer {
    /// Create a mailer for the relay described in `config`.
    ///
    /// The connection is plain SMTP; point it at a local relay or submission
    /// agent that handles TLS upstream.
    pub fn new(config: &MailConfig) -> Result<Self> {
        let mut builder =
            SmtpTransport::builder_dangerous(&config.smtp_host).port(config.smtp_port);

        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
        })
    }

    fn build_message(mail: &OutgoingMail) -> Result<Message> {
        let from: Mailbox = mail
            .from
            .parse()
            .map_err(|e| ForumError::Mail(format!("invalid sender address: {e}")))?;
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| ForumError::Mail(format!("invalid recipient address: {e}")))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.body.clone())
            .map_err(|e| ForumError::Mail(format!("failed to build message: {e}")))
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let message = Self::build_message(mail)?;
        self.transport.send(&message).map_err(|e| {
            error!(to = %mail.to, "SMTP delivery failed: {}", e);
            ForumError::Mail(e.to_string())
        })?;
        debug!(to = %mail.to, "Mail delivered over SMTP");
        Ok(())
    }
}
