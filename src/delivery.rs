//! Digest delivery over SMTP.
//!
//! The pipeline only needs a yes/no answer from [`Mailer::send`]; anything
//! short of a confirmed hand-off to the SMTP server is a failure and keeps the
//! batch's URLs out of the history.

use crate::error::{Error, Result};
use itertools::Itertools;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};

/// Delivery capability used by the dispatcher.
pub trait Mailer {
    /// Send one HTML message. `Ok` means the server accepted it.
    async fn send(&self, subject: &str, html_body: &str) -> Result<()>;
}

/// SMTP account and recipient settings.
#[derive(Clone)]
pub struct MailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// Comma-separated recipient list.
    pub recipients: String,
    pub timeout: Duration,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("username", &self.username)
            .field("recipients", &self.recipients)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Split a comma-separated address list, trimming entries and dropping
/// blanks and duplicates. First occurrence wins.
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unique()
        .map(str::to_string)
        .collect()
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| Error::Config(format!("invalid email address `{address}`: {e}")))
}

/// Sends through an implicit-TLS SMTP relay, recipients in BCC.
///
/// The visible `To` header is the sender itself so recipients do not see
/// each other.
pub struct SmtpMailer {
    transport: SmtpTransport,
    sender: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn new(settings: &MailSettings) -> Result<Self> {
        let sender = parse_mailbox(&settings.username)?;
        let recipients = parse_recipients(&settings.recipients)
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<_>>>()?;

        let transport = SmtpTransport::relay(&settings.smtp_host)
            .map_err(|e| Error::Config(format!("invalid SMTP relay `{}`: {e}", settings.smtp_host)))?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self {
            transport,
            sender,
            recipients,
        })
    }

    fn build_message(&self, subject: &str, html_body: &str) -> Result<Message> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .to(self.sender.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML);
        for recipient in &self.recipients {
            builder = builder.bcc(recipient.clone());
        }
        builder
            .body(html_body.to_string())
            .map_err(|e| Error::Delivery(format!("failed to build message: {e}")))
    }
}

impl Mailer for SmtpMailer {
    #[instrument(level = "info", skip_all, fields(%subject, recipients = self.recipients.len()))]
    async fn send(&self, subject: &str, html_body: &str) -> Result<()> {
        if html_body.is_empty() {
            return Err(Error::Delivery("refusing to send an empty message".to_string()));
        }
        if self.recipients.is_empty() {
            return Err(Error::Delivery("no recipients configured".to_string()));
        }

        let message = self.build_message(subject, html_body)?;
        let transport = self.transport.clone();

        info!("Sending digest (BCC)");
        tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| Error::Delivery(format!("send task failed: {e}")))?
            .map_err(|e| Error::Delivery(e.to_string()))?;

        info!("Digest sent");
        Ok(())
    }
}
