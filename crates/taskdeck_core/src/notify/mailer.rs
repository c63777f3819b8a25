//! Outbound mail contract.
//!
//! Delivery infrastructure lives outside the core; the dispatcher only
//! depends on this trait. Implementations are expected to be best-effort
//! and cheap to call repeatedly within one run.

use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One composed message, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub body: String,
    /// Ordered, deduplicated delivery addresses. Never empty when handed
    /// to a mailer.
    pub recipients: Vec<String>,
}

/// Opaque delivery failure reported by a mailer implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailError {
    message: String,
}

impl MailError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for MailError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "mail delivery failed: {}", self.message)
    }
}

impl Error for MailError {}

/// Delivery capability consumed by the dispatcher.
pub trait Mailer {
    /// Attempts delivery of one message to all its recipients.
    fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Stand-in transport that records sends in the log and always succeeds.
///
/// Deployments implement [`Mailer`] against their actual relay; this keeps
/// local runs and the CLI probe free of mail infrastructure.
#[derive(Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            "event=mail_send module=notify status=ok transport=log recipients={} subject={}",
            email.recipients.len(),
            email.subject
        );
        Ok(())
    }
}
