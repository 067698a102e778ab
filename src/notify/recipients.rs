//! Recipient resolution for notification templates.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SiteConfig;
use crate::model::{NotificationTemplate, RecipientPolicy, SubmitterInfo};
use crate::notify::traits::SettingsProvider;
use crate::render::is_valid_email;

/// Resolves a template's recipient policy into concrete addresses.
///
/// Resolution never fails: every policy degrades to an empty list when
/// nothing usable is configured, and the caller decides what an empty
/// list means.
pub struct RecipientManager {
    settings: Arc<dyn SettingsProvider>,
    site: SiteConfig,
}

impl RecipientManager {
    pub fn new(settings: Arc<dyn SettingsProvider>, site: SiteConfig) -> Self {
        Self { settings, site }
    }

    /// Resolve recipients for one template.
    pub async fn get_recipients(
        &self,
        template: &NotificationTemplate,
        submitter: Option<&SubmitterInfo>,
    ) -> Vec<String> {
        let recipients = match template.to {
            RecipientPolicy::Admin => self.admin_recipients().await,
            RecipientPolicy::Submitter => submitter
                .and_then(|s| s.email.as_deref())
                .filter(|e| !e.is_empty())
                .map(|e| vec![e.to_string()])
                .unwrap_or_default(),
            RecipientPolicy::Custom => {
                parse_custom_emails(template.custom_emails.as_deref().unwrap_or_default())
            }
        };
        debug!(
            template = %template.name,
            policy = ?template.to,
            count = recipients.len(),
            "resolved recipients"
        );
        recipients
    }

    /// The configured system sender address, falling back to the
    /// ADMIN_EMAIL environment value when the settings lookup fails or
    /// yields nothing.
    async fn admin_recipients(&self) -> Vec<String> {
        match self.settings.mail_settings().await {
            Ok(settings) if !settings.sender_email.is_empty() => {
                return vec![settings.sender_email];
            }
            Ok(_) => {
                debug!("mail settings carry no sender address, falling back to ADMIN_EMAIL");
            }
            Err(e) => {
                warn!(error = %e, "mail settings lookup failed, falling back to ADMIN_EMAIL");
            }
        }
        if self.site.admin_email.is_empty() {
            Vec::new()
        } else {
            vec![self.site.admin_email.clone()]
        }
    }
}

/// Split a comma-separated address list, keeping only well-formed entries.
pub fn parse_custom_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| is_valid_email(s))
        .map(str::to_string)
        .collect()
}

// ── Tests ───────────────────────────────────────────────────────────
