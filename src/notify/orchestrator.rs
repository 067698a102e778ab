//! Notification orchestration — per-submission, per-template, per-recipient
//! fan-out with per-template failure isolation.
//!
//! **Core invariant: one template's failure never blocks its siblings.**
//! The automatic submit-triggered path is best-effort and reports outcomes
//! instead of raising; the manual test-send path is strict and propagates.

use std::sync::Arc;

use chrono::Local;
use tracing::{debug, error, info, warn};

use crate::config::SiteConfig;
use crate::error::NotifyError;
use crate::model::{
    Attachment, Form, NotificationTemplate, RequestInfo, Submission, SubmitterInfo,
};
use crate::notify::recipients::RecipientManager;
use crate::notify::traits::{AttachmentResolver, FormStore, Mailer, SettingsProvider};
use crate::render::{PlaceholderData, build_placeholder_data, wrap_email_content};

/// Trigger name for the submit-time flow.
const SUBMIT_TRIGGER: &str = "submit";

/// Subject prefix for manual test sends.
const TEST_SUBJECT_PREFIX: &str = "[测试] ";

// ── Outcomes ────────────────────────────────────────────────────────

/// Per-template result of a submit-notification fan-out.
#[derive(Debug, Clone)]
pub struct TemplateOutcome {
    pub template_id: String,
    pub template_name: String,
    pub status: OutcomeStatus,
}

#[derive(Debug, Clone)]
pub enum OutcomeStatus {
    /// Every resolved recipient was sent to.
    Sent { recipients: Vec<String> },
    /// No recipients resolved; nothing was attempted.
    Skipped,
    /// Rendering, attachment resolution, or a send failed. Recipients
    /// after the failing one were not attempted.
    Failed { error: String },
}

impl OutcomeStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent { .. })
    }
}

/// Transient rendered message for one (submission, template) pair.
#[derive(Debug, Clone)]
pub struct RenderedMessage {
    pub subject: String,
    pub html_body: String,
    pub recipients: Vec<String>,
    pub attachments: Vec<Attachment>,
}

// ── Orchestrator ────────────────────────────────────────────────────

/// Drives the notification pipeline for one submission event.
///
/// Holds no per-event state: every invocation builds its placeholder
/// data fresh and is independent of any other submission.
pub struct NotificationOrchestrator {
    mailer: Arc<dyn Mailer>,
    recipients: RecipientManager,
    attachments: Arc<dyn AttachmentResolver>,
    forms: Arc<dyn FormStore>,
    site: SiteConfig,
}

impl NotificationOrchestrator {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        settings: Arc<dyn SettingsProvider>,
        attachments: Arc<dyn AttachmentResolver>,
        forms: Arc<dyn FormStore>,
        site: SiteConfig,
    ) -> Self {
        Self {
            mailer,
            recipients: RecipientManager::new(settings, site.clone()),
            attachments,
            forms,
            site,
        }
    }

    /// Handle one form-submission event.
    ///
    /// Filters to enabled, submit-triggered templates, builds one
    /// read-only placeholder namespace, and processes each template
    /// independently. Never returns an error; per-template failures are
    /// logged and reported in the outcome list.
    pub async fn handle_submission(
        &self,
        submission: &Submission,
        form: &Form,
        submitter: Option<&SubmitterInfo>,
        request: Option<&RequestInfo>,
    ) -> Vec<TemplateOutcome> {
        let templates: Vec<&NotificationTemplate> = form
            .notification_templates()
            .iter()
            .filter(|t| t.fires_on(SUBMIT_TRIGGER))
            .collect();

        if templates.is_empty() {
            debug!(form_id = %form.id, "no enabled submit-triggered templates");
            return Vec::new();
        }

        info!(
            form_id = %form.id,
            templates = templates.len(),
            "dispatching submit notifications"
        );

        let data = build_placeholder_data(submission, form, submitter, request, &self.site);

        let mut outcomes = Vec::with_capacity(templates.len());
        for template in templates {
            let status = match self
                .process_template(template, &data, form, submission, submitter)
                .await
            {
                Ok(Some(recipients)) => {
                    info!(
                        template = %template.name,
                        recipients = recipients.len(),
                        "notification template sent"
                    );
                    OutcomeStatus::Sent { recipients }
                }
                Ok(None) => {
                    warn!(template = %template.name, "no recipients resolved, skipping");
                    OutcomeStatus::Skipped
                }
                Err(e) => {
                    error!(template = %template.name, error = %e, "notification template failed");
                    OutcomeStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(TemplateOutcome {
                template_id: template.id.clone(),
                template_name: template.name.clone(),
                status,
            });
        }
        outcomes
    }

    /// Render and send one template. `Ok(None)` means no recipients.
    async fn process_template(
        &self,
        template: &NotificationTemplate,
        data: &PlaceholderData,
        form: &Form,
        submission: &Submission,
        submitter: Option<&SubmitterInfo>,
    ) -> Result<Option<Vec<String>>, NotifyError> {
        let subject = data.apply(&template.subject);
        let body = data.apply(&template.content);
        let html_body = wrap_email_content(&body);

        let recipients = self.recipients.get_recipients(template, submitter).await;
        if recipients.is_empty() {
            return Ok(None);
        }

        let attachments = self.attachments.resolve(data, form, submission).await?;

        let message = RenderedMessage {
            subject,
            html_body,
            recipients,
            attachments,
        };

        for recipient in &message.recipients {
            self.mailer
                .send_email(
                    recipient,
                    &message.subject,
                    &message.html_body,
                    &message.attachments,
                )
                .await?;
            debug!(template = %template.name, recipient = %recipient, "notification sent");
        }
        Ok(Some(message.recipients))
    }

    /// Manual test send for one template.
    ///
    /// Strict path: missing form/template and transport failures are
    /// returned to the caller. Substitutes a fixed synthetic placeholder
    /// set, skips HTML wrapping and attachments, and prefixes the
    /// subject with `[测试] `.
    pub async fn test_template(
        &self,
        template_id: &str,
        form_id: &str,
        test_email: &str,
    ) -> Result<(), NotifyError> {
        let form = self
            .forms
            .form_by_id(form_id)
            .await?
            .ok_or(NotifyError::FormNotFound)?;
        let template = form
            .notification_templates()
            .iter()
            .find(|t| t.id == template_id)
            .ok_or(NotifyError::TemplateNotFound)?;

        let data = sample_placeholder_data(test_email);
        let subject = format!("{TEST_SUBJECT_PREFIX}{}", data.apply(&template.subject));
        let body = data.apply(&template.content);

        self.mailer.send_email(test_email, &subject, &body, &[]).await?;
        info!(template = %template.name, to = %test_email, "test notification sent");
        Ok(())
    }
}

/// Fixed synthetic placeholder values for the manual test-send path.
fn sample_placeholder_data(test_email: &str) -> PlaceholderData {
    let now = Local::now();
    let mut data = PlaceholderData::default();
    data.insert("form_title", "测试表单");
    data.insert("form_description", "这是一条测试通知");
    data.insert("submission_id", "test-submission");
    data.insert("submission_date", now.format("%Y/%-m/%-d").to_string());
    data.insert("submission_time", now.format("%Y/%-m/%-d %H:%M:%S").to_string());
    data.insert("submitter_name", "测试用户");
    data.insert("submitter_email", test_email);
    data.insert("form_data", "姓名: 测试用户\n留言: 这是一条测试数据");
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_data_carries_the_real_test_address() {
        let data = sample_placeholder_data("qa@site.com");
        assert_eq!(data.get("submitter_email"), Some("qa@site.com"));
        assert_eq!(data.get("form_title"), Some("测试表单"));
        assert!(data.get("form_data").is_some());
    }

    #[test]
    fn outcome_status_sent_predicate() {
        assert!(OutcomeStatus::Sent { recipients: vec![] }.is_sent());
        assert!(!OutcomeStatus::Skipped.is_sent());
        assert!(
            !OutcomeStatus::Failed {
                error: "x".into()
            }
            .is_sent()
        );
    }
}
