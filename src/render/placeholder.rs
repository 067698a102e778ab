//! Placeholder flattening and literal `{key}` substitution.
//!
//! One `PlaceholderData` is built per notification event, read-only once
//! built, and thrown away afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

use chrono::Local;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::SiteConfig;
use crate::model::{ComponentType, FieldView, Form, RequestInfo, Submission, SubmitterInfo};
use crate::render::{html, value};

// ── Substitution utilities ──────────────────────────────────────────

/// Whether a submission value counts as empty: `null`, `""`, an empty
/// array, or an object with zero keys. `0`, `false` and `"0"` are not
/// empty.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Normalize a field label into a placeholder key: strip everything that
/// is not a CJK ideograph (U+4E00–U+9FA5), ASCII letter, or digit, and
/// lowercase ASCII letters only. Idempotent — templates reference the
/// result literally.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter_map(|c| {
            if ('\u{4e00}'..='\u{9fa5}').contains(&c) {
                Some(c)
            } else if c.is_ascii_alphanumeric() {
                Some(c.to_ascii_lowercase())
            } else {
                None
            }
        })
        .collect()
}

/// Well-formedness check shared with custom recipient parsing.
pub fn is_valid_email(address: &str) -> bool {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid"))
        .is_match(address)
}

/// Flattened substitution namespace for one notification event.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderData {
    entries: HashMap<String, String>,
}

impl PlaceholderData {
    /// Insert a key. Colliding keys overwrite (last write wins); the
    /// collision is logged so operators can spot ambiguous labels.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if self.entries.contains_key(&key) {
            debug!(key = %key, "placeholder key collision, last write wins");
        }
        self.entries.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Substitute this data into a template string.
    pub fn apply(&self, template: &str) -> String {
        replace_placeholders(template, self)
    }
}

/// Replace every occurrence of `{key}` for each key present in `data`.
/// Tokens with no matching key are left untouched.
pub fn replace_placeholders(template: &str, data: &PlaceholderData) -> String {
    let mut out = template.to_string();
    for (key, value) in data.iter() {
        let token = format!("{{{key}}}");
        if out.contains(&token) {
            out = out.replace(&token, value);
        }
    }
    out
}

// ── Placeholder builder ─────────────────────────────────────────────

/// Flatten a submission, its form, and submitter context into one
/// substitution namespace.
///
/// Keys come in three tiers: fixed system keys, the aggregate
/// `form_data` dump, and per-field keys derived from normalized labels
/// (with `内容`/`项目`/`名称` secondary keys for composite types).
pub fn build_placeholder_data(
    submission: &Submission,
    form: &Form,
    submitter: Option<&SubmitterInfo>,
    request: Option<&RequestInfo>,
    site: &SiteConfig,
) -> PlaceholderData {
    let mut data = PlaceholderData::default();
    let now = Local::now();

    data.insert("form_title", form.title.clone());
    data.insert("form_description", form.description.clone());
    data.insert(
        "submission_id",
        submission.id.clone().unwrap_or_else(|| "unknown".to_string()),
    );
    data.insert("submission_date", now.format("%Y/%-m/%-d").to_string());
    data.insert("submission_time", now.format("%Y/%-m/%-d %H:%M:%S").to_string());
    data.insert(
        "submitter_name",
        submission
            .submitter_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "匿名用户".to_string()),
    );
    data.insert(
        "submitter_ip",
        request.and_then(|r| r.ip.clone()).unwrap_or_default(),
    );
    data.insert("admin_email", site.admin_email.clone());
    data.insert("site_title", site.site_title.clone());
    data.insert("site_url", site.site_url.clone());

    if let Some(info) = submitter {
        data.insert("submitter_email", info.email.clone().unwrap_or_default());
        data.insert("submitter_username", info.username.clone().unwrap_or_default());
        data.insert("submitter_company", info.company.clone().unwrap_or_default());
        data.insert("submitter_enterprise", info.enterprise.clone().unwrap_or_default());
        data.insert("submitter_department", info.department.clone().unwrap_or_default());
        data.insert("submitter_position", info.position.clone().unwrap_or_default());
        data.insert("submitter_phone", info.phone.clone().unwrap_or_default());
        data.insert("submitter_role", info.role.clone().unwrap_or_default());
    }

    if let Some(fields) = submission.submission_data.as_ref() {
        data.insert("form_data", value::generate_formatted_content(fields));
        add_field_placeholders(&mut data, fields);
    }

    data
}

/// Per-field derived keys, from the submission tree.
fn add_field_placeholders(data: &mut PlaceholderData, fields: &serde_json::Map<String, Value>) {
    for (component_id, raw) in fields {
        let field = FieldView::from_entry(component_id, raw);
        if field.kind.is_excluded_from_email() || is_empty(field.value) {
            continue;
        }
        let key = normalize_label(field.label);

        match (field.kind, field.value) {
            (ComponentType::Order, Value::Array(items)) => {
                // Composite: secondary keys only, no default key.
                data.insert(format!("{key}内容"), html::generate_order_table(items));
                data.insert(format!("{key}项目"), value::order_item_names(items).join("、"));
            }
            (ComponentType::Upload, Value::Array(files)) => {
                data.insert(key, html::generate_file_list(files));
            }
            (ComponentType::Quotation, Value::Object(_)) => {
                data.insert(format!("{key}名称"), value::quotation_name(field.value));
                data.insert(format!("{key}内容"), html::generate_quotation_table(field.value));
            }
            _ => {
                data.insert(key, value::format_value_for_email(field.value, field.kind));
            }
        }
    }
}

/// Legacy placeholder derivation: walk the form's declared component
/// schema instead of the submission tree. Structural components carry
/// no value and are skipped. Retained for backward compatibility; not
/// on the primary path.
pub fn add_form_field_placeholders(
    data: &mut PlaceholderData,
    form: &Form,
    submission: &Submission,
) {
    let Some(fields) = submission.submission_data.as_ref() else {
        return;
    };

    for component in &form.components {
        let kind = ComponentType::from_tag(&component.kind);
        if kind.is_structural() {
            continue;
        }
        let Some(raw) = fields.get(&component.id) else {
            continue;
        };
        let field = FieldView::from_entry(&component.id, raw);
        if is_empty(field.value) {
            continue;
        }
        let label = component
            .label
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(field.label);
        data.insert(
            normalize_label(label),
            value::format_value_for_email(field.value, kind),
        );
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::model::FormComponent;

    use super::*;

    #[test]
    fn is_empty_matrix() {
        assert!(is_empty(&json!(null)));
        assert!(is_empty(&json!("")));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!({})));

        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(false)));
        assert!(!is_empty(&json!("0")));
        assert!(!is_empty(&json!([1])));
        assert!(!is_empty(&json!({"a": 1})));
    }

    #[test]
    fn normalize_label_strips_punctuation_and_lowercases_ascii() {
        assert_eq!(normalize_label("Email Address!"), "emailaddress");
        assert_eq!(normalize_label("订单 (2024)"), "订单2024");
        assert_eq!(normalize_label("用户-名_称"), "用户名称");
    }

    #[test]
    fn normalize_label_preserves_cjk() {
        assert_eq!(normalize_label("服务名称"), "服务名称");
        assert_eq!(normalize_label("第①项"), "第项");
    }

    #[test]
    fn normalize_label_is_idempotent() {
        for label in ["Email Address!", "订单 (2024)", "服务名称", "a B c"] {
            let once = normalize_label(label);
            assert_eq!(normalize_label(&once), once);
        }
    }

    #[test]
    fn replace_placeholders_replaces_all_occurrences_of_present_keys() {
        let mut data = PlaceholderData::default();
        data.insert("a", "X");
        assert_eq!(replace_placeholders("{a}-{a}-{b}", &data), "X-X-{b}");
    }

    #[test]
    fn replace_placeholders_leaves_unknown_tokens_verbatim() {
        let data = PlaceholderData::default();
        assert_eq!(replace_placeholders("hello {missing}", &data), "hello {missing}");
    }

    #[test]
    fn is_valid_email_matches_simple_pattern() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("user.name@sub.domain.cn"));
        assert!(!is_valid_email("nope"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.com"));
    }

    #[test]
    fn placeholder_collision_last_write_wins() {
        let mut data = PlaceholderData::default();
        data.insert("key", "first");
        data.insert("key", "second");
        assert_eq!(data.get("key"), Some("second"));
        assert_eq!(data.len(), 1);
    }

    fn sample_form() -> Form {
        Form {
            id: "form-1".into(),
            title: "项目咨询".into(),
            description: "项目咨询表单".into(),
            ..Form::default()
        }
    }

    fn sample_site() -> SiteConfig {
        SiteConfig {
            admin_email: "admin@site.com".into(),
            site_title: "我的站点".into(),
            site_url: "https://site.com".into(),
        }
    }

    #[test]
    fn builder_seeds_fixed_system_keys() {
        let submission = Submission {
            id: Some("sub-1".into()),
            submitter_name: Some("张三".into()),
            submission_data: None,
        };
        let data = build_placeholder_data(&submission, &sample_form(), None, None, &sample_site());

        assert_eq!(data.get("form_title"), Some("项目咨询"));
        assert_eq!(data.get("submission_id"), Some("sub-1"));
        assert_eq!(data.get("submitter_name"), Some("张三"));
        assert_eq!(data.get("admin_email"), Some("admin@site.com"));
        assert_eq!(data.get("site_title"), Some("我的站点"));
        assert_eq!(data.get("site_url"), Some("https://site.com"));
        // No submission data → no aggregate dump.
        assert!(data.get("form_data").is_none());
    }

    #[test]
    fn builder_defaults_missing_identity() {
        let submission = Submission::default();
        let data = build_placeholder_data(&submission, &sample_form(), None, None, &sample_site());
        assert_eq!(data.get("submission_id"), Some("unknown"));
        assert_eq!(data.get("submitter_name"), Some("匿名用户"));
        assert_eq!(data.get("submitter_ip"), Some(""));
    }

    #[test]
    fn builder_adds_submitter_keys_when_known() {
        let submitter = SubmitterInfo {
            email: Some("user@x.com".into()),
            username: Some("zhangsan".into()),
            ..SubmitterInfo::default()
        };
        let request = RequestInfo {
            ip: Some("10.0.0.1".into()),
        };
        let data = build_placeholder_data(
            &Submission::default(),
            &sample_form(),
            Some(&submitter),
            Some(&request),
            &sample_site(),
        );
        assert_eq!(data.get("submitter_email"), Some("user@x.com"));
        assert_eq!(data.get("submitter_username"), Some("zhangsan"));
        assert_eq!(data.get("submitter_company"), Some(""));
        assert_eq!(data.get("submitter_ip"), Some("10.0.0.1"));
    }

    #[test]
    fn order_fields_get_secondary_keys_and_no_default_key() {
        let submission = Submission {
            id: None,
            submitter_name: None,
            submission_data: Some(
                serde_json::from_value(json!({
                    "c1": {
                        "value": [{"服务名称": "LOGO设计", "单价": 100, "数量": 2, "小计": 200}],
                        "label": "订单",
                        "type": "order",
                    }
                }))
                .unwrap(),
            ),
        };
        let data = build_placeholder_data(&submission, &sample_form(), None, None, &sample_site());

        let table = data.get("订单内容").expect("order table key");
        assert!(table.contains("<table"));
        assert!(table.contains("¥200.00"));
        assert_eq!(data.get("订单项目"), Some("LOGO设计"));
        assert!(!data.contains_key("订单"));
    }

    #[test]
    fn upload_fields_get_file_list_as_default_key() {
        let submission = Submission {
            id: None,
            submitter_name: None,
            submission_data: Some(
                serde_json::from_value(json!({
                    "c1": {
                        "value": [{"name": "合同.pdf", "size": 1048576, "type": "application/pdf"}],
                        "label": "附件",
                        "type": "upload",
                    }
                }))
                .unwrap(),
            ),
        };
        let data = build_placeholder_data(&submission, &sample_form(), None, None, &sample_site());
        let files = data.get("附件").expect("upload key");
        assert!(files.contains("合同.pdf"));
        assert!(files.contains("1.00 MB"));
    }

    #[test]
    fn quotation_fields_get_name_and_content_keys_only() {
        let submission = Submission {
            id: None,
            submitter_name: None,
            submission_data: Some(
                serde_json::from_value(json!({
                    "c1": {
                        "value": {"name": "标准套餐", "services": [
                            {"name": "设计", "unitPrice": 500, "unit": "次"},
                        ]},
                        "label": "报价单",
                        "type": "quotation",
                    }
                }))
                .unwrap(),
            ),
        };
        let data = build_placeholder_data(&submission, &sample_form(), None, None, &sample_site());
        assert_eq!(data.get("报价单名称"), Some("标准套餐"));
        assert!(data.get("报价单内容").expect("quotation table").contains("¥500.00/次"));
        assert!(!data.contains_key("报价单"));
    }

    #[test]
    fn form_data_aggregates_all_fields() {
        let submission = Submission {
            id: None,
            submitter_name: None,
            submission_data: Some(
                serde_json::from_value(json!({
                    "c1": {"value": "张三", "label": "姓名", "type": "text"},
                    "c2": {"value": "你好", "label": "留言", "type": "textarea"},
                }))
                .unwrap(),
            ),
        };
        let data = build_placeholder_data(&submission, &sample_form(), None, None, &sample_site());
        assert_eq!(data.get("form_data"), Some("姓名: 张三\n留言: 你好"));
        assert_eq!(data.get("姓名"), Some("张三"));
        assert_eq!(data.get("留言"), Some("你好"));
    }

    #[test]
    fn legacy_schema_walk_skips_structural_components() {
        let form = Form {
            components: vec![
                FormComponent {
                    id: "c1".into(),
                    label: Some("姓名".into()),
                    kind: "text".into(),
                },
                FormComponent {
                    id: "c2".into(),
                    label: None,
                    kind: "divider".into(),
                },
            ],
            ..sample_form()
        };
        let submission = Submission {
            id: None,
            submitter_name: None,
            submission_data: Some(
                serde_json::from_value(json!({
                    "c1": {"value": "李四", "label": "姓名", "type": "text"},
                    "c2": {"value": "x", "label": "分隔", "type": "divider"},
                }))
                .unwrap(),
            ),
        };
        let mut data = PlaceholderData::default();
        add_form_field_placeholders(&mut data, &form, &submission);
        assert_eq!(data.get("姓名"), Some("李四"));
        assert_eq!(data.len(), 1);
    }
}
