//! Error types for the notification engine.

/// Top-level error for notification operations.
///
/// The automatic submit-triggered path never surfaces this to its caller —
/// failures are caught per template and reported as outcomes. The manual
/// test-send path propagates it directly.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The form referenced by a test send does not exist.
    #[error("表单不存在")]
    FormNotFound,

    /// The template referenced by a test send is not on the form.
    #[error("通知模板不存在")]
    TemplateNotFound,

    #[error("Mail error: {0}")]
    Mail(#[from] MailError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Outbound mail transport errors.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP send failed: {0}")]
    Transport(String),
}

/// Mail-settings lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings lookup failed: {0}")]
    Lookup(String),

    #[error("Mail settings not configured")]
    Missing,
}

/// Attachment resolution and loading errors.
#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Failed to read attachment {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Attachment resolution failed: {0}")]
    Resolve(String),
}

/// Form store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Form lookup failed: {0}")]
    Lookup(String),
}

/// Result type alias for the notification engine.
pub type Result<T> = std::result::Result<T, NotifyError>;
