//! Domain model — forms, templates, submissions and attachments.
//!
//! Submission values are schema-less (`serde_json::Value`); the declared
//! component type tag, when present, drives how each value is rendered.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AttachmentError;

// ── Component types ─────────────────────────────────────────────────

/// Declared component type tag from the form schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentType {
    #[default]
    Text,
    Textarea,
    PresetText,
    Instruction,
    ArticleContent,
    Date,
    Checkbox,
    Slider,
    Amount,
    Image,
    Countdown,
    Order,
    Upload,
    Quotation,
    Divider,
    Html,
    Steps,
    Group,
    ColumnContainer,
    Pagination,
    Unknown,
}

impl ComponentType {
    /// Parse a schema type tag. Unrecognized tags map to `Unknown`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "text" => Self::Text,
            "textarea" => Self::Textarea,
            "presetText" => Self::PresetText,
            "instruction" => Self::Instruction,
            "articleContent" => Self::ArticleContent,
            "date" => Self::Date,
            "checkbox" => Self::Checkbox,
            "slider" => Self::Slider,
            "amount" => Self::Amount,
            "image" => Self::Image,
            "countdown" => Self::Countdown,
            "order" => Self::Order,
            "upload" => Self::Upload,
            "quotation" => Self::Quotation,
            "divider" => Self::Divider,
            "html" => Self::Html,
            "steps" => Self::Steps,
            "group" => Self::Group,
            "columnContainer" => Self::ColumnContainer,
            "pagination" => Self::Pagination,
            _ => Self::Unknown,
        }
    }

    /// Layout-only components that never carry a submitted value.
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            Self::Divider
                | Self::Html
                | Self::Steps
                | Self::Group
                | Self::ColumnContainer
                | Self::Pagination
        )
    }

    /// Components excluded from rendered email output entirely.
    pub fn is_excluded_from_email(self) -> bool {
        matches!(self, Self::Image | Self::Countdown)
    }
}

// ── Submission fields ───────────────────────────────────────────────

/// One field of a submission, normalized from either a typed cell
/// `{value, label, type}` or a raw legacy value.
#[derive(Debug, Clone, Copy)]
pub struct FieldView<'a> {
    pub value: &'a Value,
    pub label: &'a str,
    pub kind: ComponentType,
}

impl<'a> FieldView<'a> {
    /// Normalize one submission entry. Typed cells carry their own label and
    /// type tag; raw legacy values fall back to the component id and `text`.
    pub fn from_entry(component_id: &'a str, raw: &'a Value) -> Self {
        if let Some(obj) = raw.as_object()
            && obj.contains_key("value")
        {
            let label = obj
                .get("label")
                .and_then(Value::as_str)
                .filter(|l| !l.is_empty())
                .unwrap_or(component_id);
            let kind = obj
                .get("type")
                .and_then(Value::as_str)
                .map(ComponentType::from_tag)
                .unwrap_or_default();
            return Self {
                value: &obj["value"],
                label,
                kind,
            };
        }
        Self {
            value: raw,
            label: component_id,
            kind: ComponentType::Text,
        }
    }
}

// ── Templates ───────────────────────────────────────────────────────

/// Recipient policy for a notification template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientPolicy {
    Admin,
    Submitter,
    Custom,
}

/// Operator-authored notification template, owned by a form's settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub triggers: Vec<String>,
    pub to: RecipientPolicy,
    /// Comma-separated address list, used when `to` is `custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_emails: Option<String>,
    pub subject: String,
    pub content: String,
}

impl NotificationTemplate {
    /// Whether this template participates in a given trigger's flow.
    pub fn fires_on(&self, trigger: &str) -> bool {
        self.enabled && self.triggers.iter().any(|t| t == trigger)
    }
}

// ── Forms ───────────────────────────────────────────────────────────

/// A form definition, read-only to this engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Form {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub settings: FormSettings,
    /// Declared component schema (used by the legacy placeholder walk).
    #[serde(default)]
    pub components: Vec<FormComponent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSettings {
    #[serde(default)]
    pub notification: Option<NotificationSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub templates: Vec<NotificationTemplate>,
}

impl Form {
    /// Configured notification templates, empty when notifications are
    /// not set up. Explicit accessor so callers never dig through
    /// optional settings layers themselves.
    pub fn notification_templates(&self) -> &[NotificationTemplate] {
        self.settings
            .notification
            .as_ref()
            .map(|n| n.templates.as_slice())
            .unwrap_or(&[])
    }
}

/// One declared component of a form schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormComponent {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

// ── Submissions ─────────────────────────────────────────────────────

/// One completed instance of a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub submitter_name: Option<String>,
    /// Component id → typed cell `{value, label, type}` or raw legacy value.
    #[serde(default)]
    pub submission_data: Option<serde_json::Map<String, Value>>,
}

/// Identity of the submitting user, when known.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitterInfo {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub enterprise: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Request metadata captured at submission time.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub ip: Option<String>,
}

// ── Mail settings ───────────────────────────────────────────────────

/// System mail settings returned by the settings collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MailSettings {
    pub sender_email: String,
    #[serde(default)]
    pub reply_email: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

// ── Attachments ─────────────────────────────────────────────────────

/// Source of attachment bytes.
#[derive(Debug, Clone)]
pub enum AttachmentContent {
    Data(Vec<u8>),
    Path(PathBuf),
}

/// One outgoing email attachment.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: AttachmentContent,
    pub content_type: Option<String>,
    /// Content-ID for inline (embedded) attachments.
    pub cid: Option<String>,
}

impl Attachment {
    pub fn from_data(filename: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            content: AttachmentContent::Data(data),
            content_type: None,
            cid: None,
        }
    }

    pub fn from_path(filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            content: AttachmentContent::Path(path.into()),
            content_type: None,
            cid: None,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_cid(mut self, cid: impl Into<String>) -> Self {
        self.cid = Some(cid.into());
        self
    }

    /// Load the attachment bytes, reading from disk for path-backed content.
    pub fn load_bytes(&self) -> Result<Vec<u8>, AttachmentError> {
        match &self.content {
            AttachmentContent::Data(data) => Ok(data.clone()),
            AttachmentContent::Path(path) => {
                std::fs::read(path).map_err(|source| AttachmentError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────
