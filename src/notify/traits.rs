//! Collaborator seams for the notification pipeline.
//!
//! The orchestrator depends only on these traits; transport, settings
//! storage, attachment resolution and form persistence live behind them.

use async_trait::async_trait;

use crate::error::{AttachmentError, MailError, SettingsError, StoreError};
use crate::model::{Attachment, Form, MailSettings, Submission};
use crate::render::PlaceholderData;

/// Outbound mail transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one HTML email with attachments to a single recipient.
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        html: &str,
        attachments: &[Attachment],
    ) -> Result<(), MailError>;
}

/// System mail-settings lookup (configured sender address and names).
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn mail_settings(&self) -> Result<MailSettings, SettingsError>;
}

/// Resolves attachments for a rendered notification.
#[async_trait]
pub trait AttachmentResolver: Send + Sync {
    async fn resolve(
        &self,
        placeholders: &PlaceholderData,
        form: &Form,
        submission: &Submission,
    ) -> Result<Vec<Attachment>, AttachmentError>;
}

/// Form lookup for the manual test-send path.
#[async_trait]
pub trait FormStore: Send + Sync {
    async fn form_by_id(&self, form_id: &str) -> Result<Option<Form>, StoreError>;
}

/// Attachment resolver that never attaches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAttachments;

#[async_trait]
impl AttachmentResolver for NoAttachments {
    async fn resolve(
        &self,
        _placeholders: &PlaceholderData,
        _form: &Form,
        _submission: &Submission,
    ) -> Result<Vec<Attachment>, AttachmentError> {
        Ok(Vec::new())
    }
}
