//! SMTP transport via lettre (blocking transport run on the blocking pool).

use lettre::message::header::ContentType;
use lettre::message::{Attachment as AttachmentPart, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::info;

use crate::config::SmtpConfig;
use crate::error::MailError;
use crate::model::Attachment;
use crate::notify::traits::Mailer;

/// Batteries-included `Mailer` over an SMTP relay.
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    /// Build from environment variables.
    /// Returns `None` if `SMTP_HOST` is not set (outbound mail disabled).
    pub fn from_env() -> Option<Self> {
        SmtpConfig::from_env().map(Self::new)
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        attachments: &[Attachment],
    ) -> Result<(), MailError> {
        let config = self.config.clone();
        let to = to.to_string();
        let subject = subject.to_string();
        let html = html.to_string();
        let attachments = attachments.to_vec();

        tokio::task::spawn_blocking(move || {
            send_blocking(&config, &to, &subject, &html, &attachments)
        })
        .await
        .map_err(|e| MailError::Transport(format!("send task panicked: {e}")))?
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e| MailError::InvalidAddress {
        address: address.to_string(),
        reason: format!("{e}"),
    })
}

fn send_blocking(
    config: &SmtpConfig,
    to: &str,
    subject: &str,
    html: &str,
    attachments: &[Attachment],
) -> Result<(), MailError> {
    let creds = Credentials::new(config.username.clone(), config.password.clone());

    let transport = SmtpTransport::relay(&config.host)
        .map_err(|e| MailError::Transport(format!("SMTP relay error: {e}")))?
        .port(config.port)
        .credentials(creds)
        .build();

    let mut multipart = MultiPart::mixed().singlepart(SinglePart::html(html.to_string()));
    for attachment in attachments {
        let bytes = attachment
            .load_bytes()
            .map_err(|e| MailError::Build(e.to_string()))?;
        let content_type = attachment
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        let content_type = ContentType::parse(content_type)
            .map_err(|e| MailError::Build(format!("invalid content type: {e}")))?;
        let part = match &attachment.cid {
            Some(cid) => AttachmentPart::new_inline(cid.clone()).body(bytes, content_type),
            None => AttachmentPart::new(attachment.filename.clone()).body(bytes, content_type),
        };
        multipart = multipart.singlepart(part);
    }

    let message = Message::builder()
        .from(parse_mailbox(&config.from_address)?)
        .to(parse_mailbox(to)?)
        .subject(subject)
        .multipart(multipart)
        .map_err(|e| MailError::Build(e.to_string()))?;

    transport
        .send(&message)
        .map_err(|e| MailError::Transport(e.to_string()))?;

    info!(to, "email sent");
    Ok(())
}
