//! Value formatting — converts one typed submission value into a display
//! string or inline HTML fragment.

use chrono::{DateTime, Local, NaiveDate};
use serde_json::{Map, Value};

use crate::model::ComponentType;
use crate::render::classify::{ValueShape, aliased_str, classify};
use crate::render::html;
use crate::render::placeholder::is_empty;

/// Sentinel for an absent scalar value.
const EMPTY_VALUE: &str = "(空)";
/// Sentinel for an empty list value.
const EMPTY_LIST: &str = "(空列表)";
/// Fallback name for order items with no usable name field.
pub(crate) const UNKNOWN_ITEM: &str = "未知项目";
/// Fallback name for quotations with no `name`.
pub(crate) const UNKNOWN_QUOTATION: &str = "未知报价单";

// ── Scalar helpers ──────────────────────────────────────────────────

/// Display a JSON scalar the way a template reader expects: strings
/// unquoted, everything else via its JSON rendering.
pub(crate) fn display_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// JavaScript-style truthiness for loosely-typed checkbox values.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `k: v, k: v` pairs for a generic object.
fn object_pairs(obj: &Map<String, Value>) -> String {
    obj.iter()
        .map(|(k, v)| format!("{k}: {}", display_scalar(v)))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Locale-style date rendering for date components. Accepts epoch
/// milliseconds, RFC 3339 strings, or plain `YYYY-MM-DD` strings;
/// anything else passes through unchanged.
fn format_date_value(value: &Value) -> String {
    if let Some(ms) = value.as_i64()
        && let Some(dt) = DateTime::from_timestamp_millis(ms)
    {
        return dt.with_timezone(&Local).format("%Y/%-m/%-d").to_string();
    }
    if let Some(s) = value.as_str() {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return dt.with_timezone(&Local).format("%Y/%-m/%-d").to_string();
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return d.format("%Y/%-m/%-d").to_string();
        }
    }
    display_scalar(value)
}

// ── Primary formatter ───────────────────────────────────────────────

/// Convert one submission value into a display string or HTML fragment.
///
/// Precedence: scalar-empty sentinel, then arrays (classified as file
/// list, order table, or generic join), then generic objects, then
/// type-directed primitives. Empty arrays render `(空列表)` from the
/// array branch, never `(空)`.
pub fn format_value_for_email(value: &Value, kind: ComponentType) -> String {
    match value {
        Value::Null => return EMPTY_VALUE.to_string(),
        Value::String(s) if s.is_empty() => return EMPTY_VALUE.to_string(),
        Value::Object(o) if o.is_empty() => return EMPTY_VALUE.to_string(),
        _ => {}
    }

    if let Some(items) = value.as_array() {
        if items.is_empty() {
            return EMPTY_LIST.to_string();
        }
        return match classify(kind, &items[0]) {
            ValueShape::File => html::generate_file_list(items),
            ValueShape::OrderItem => html::generate_order_table(items),
            ValueShape::Generic => {
                if items[0].is_object() {
                    items
                        .iter()
                        .map(|item| match item.as_object() {
                            Some(obj) => object_pairs(obj),
                            None => display_scalar(item),
                        })
                        .collect::<Vec<_>>()
                        .join("; ")
                } else {
                    items
                        .iter()
                        .map(display_scalar)
                        .collect::<Vec<_>>()
                        .join(", ")
                }
            }
        };
    }

    if let Some(obj) = value.as_object() {
        if let Some(name) = obj
            .get("name")
            .or_else(|| obj.get("title"))
            .filter(|v| is_truthy(v))
        {
            return display_scalar(name);
        }
        return object_pairs(obj);
    }

    match kind {
        ComponentType::Date => format_date_value(value),
        ComponentType::Textarea
        | ComponentType::PresetText
        | ComponentType::Instruction
        | ComponentType::ArticleContent => display_scalar(value),
        ComponentType::Checkbox => if is_truthy(value) { "是" } else { "否" }.to_string(),
        ComponentType::Slider => format!("{} 分", display_scalar(value)),
        _ => display_scalar(value),
    }
}

// ── Aggregate dump ──────────────────────────────────────────────────

/// Resolve order item names through the fallback chain, dropping items
/// with no usable name field.
pub(crate) fn order_item_names(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            aliased_str(obj, &["serviceName", "服务名称", "name", "title", "itemName"])
                .map(str::to_string)
        })
        .filter(|name| name != UNKNOWN_ITEM)
        .collect()
}

/// Quotation display name, `未知报价单` when absent.
pub(crate) fn quotation_name(value: &Value) -> String {
    value
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .unwrap_or(UNKNOWN_QUOTATION)
        .to_string()
}

/// Render a full human-readable dump of a submission: one
/// `label: value` line per field, in submission order.
///
/// Image and countdown fields and empty values are skipped. Orders
/// contribute only their item names, quotations only their name,
/// uploads the full file-list HTML.
pub fn generate_formatted_content(data: &Map<String, Value>) -> String {
    let mut lines = Vec::new();

    for (component_id, raw) in data {
        let field = crate::model::FieldView::from_entry(component_id, raw);
        if field.kind.is_excluded_from_email() || is_empty(field.value) {
            continue;
        }

        let rendered = match (field.kind, field.value.as_array()) {
            (ComponentType::Order, Some(items)) => order_item_names(items).join("、"),
            (ComponentType::Upload, Some(files)) => html::generate_file_list(files),
            (ComponentType::Quotation, _) => quotation_name(field.value),
            _ => format_value_for_email(field.value, field.kind),
        };

        lines.push(format!("{}: {rendered}", field.label));
    }

    lines.join("\n")
}

// ── Legacy formatter ────────────────────────────────────────────────

/// Secondary formatter retained for older callers; not on the primary
/// notification path.
pub fn format_field_value(value: &Value, kind: ComponentType) -> String {
    if is_empty(value) {
        return String::new();
    }
    match kind {
        ComponentType::Checkbox => if is_truthy(value) { "是" } else { "否" }.to_string(),
        ComponentType::Upload => value
            .as_array()
            .map(|files| html::generate_file_list(files))
            .unwrap_or_default(),
        ComponentType::Date => format_date_value(value),
        ComponentType::Amount => format!("¥{}", html::format_amount(html::parse_number(Some(value)))),
        ComponentType::Order => value
            .as_array()
            .map(|items| html::generate_order_table(items))
            .unwrap_or_default(),
        _ => display_scalar(value),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
