//! Notification fan-out — recipient resolution, transport, orchestration.

pub mod mailer;
pub mod orchestrator;
pub mod recipients;
pub mod traits;

pub use mailer::SmtpMailer;
pub use orchestrator::{NotificationOrchestrator, OutcomeStatus, RenderedMessage, TemplateOutcome};
pub use recipients::{RecipientManager, parse_custom_emails};
pub use traits::{AttachmentResolver, FormStore, Mailer, NoAttachments, SettingsProvider};
