//! Value shape classification for heterogeneous submission values.
//!
//! The declared component type tag is the primary driver; field-presence
//! sniffing is the fallback for legacy payloads with no usable tag.

use serde_json::{Map, Value};
use tracing::debug;

use crate::model::ComponentType;

/// What an array-of-objects submission value looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    File,
    OrderItem,
    Generic,
}

/// Classify an element of an array value.
pub fn classify(kind: ComponentType, element: &Value) -> ValueShape {
    let shape = match kind {
        ComponentType::Upload => ValueShape::File,
        ComponentType::Order => ValueShape::OrderItem,
        _ => sniff(element),
    };
    debug!(?kind, ?shape, "classified array element");
    shape
}

/// Shape-sniffing fallback for untyped payloads.
fn sniff(element: &Value) -> ValueShape {
    let Some(obj) = element.as_object() else {
        return ValueShape::Generic;
    };
    if looks_like_file(obj) {
        ValueShape::File
    } else if looks_like_order_item(obj) {
        ValueShape::OrderItem
    } else {
        ValueShape::Generic
    }
}

/// A file object has a `name` plus either a `size` or a MIME `type`.
pub fn looks_like_file(obj: &Map<String, Value>) -> bool {
    obj.contains_key("name")
        && (obj.contains_key("size") || obj.get("type").is_some_and(|t| !t.is_null()))
}

/// An order item has a service name, a unit price and a quantity, under
/// either English or CJK field names.
pub fn looks_like_order_item(obj: &Map<String, Value>) -> bool {
    has_any(obj, &["serviceName", "服务名称"])
        && has_any(obj, &["unitPrice", "单价"])
        && has_any(obj, &["quantity", "数量"])
}

fn has_any(obj: &Map<String, Value>, aliases: &[&str]) -> bool {
    aliases.iter().any(|k| obj.contains_key(*k))
}

/// Pick the first present field among aliased names, as a non-empty string.
pub(crate) fn aliased_str<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a str> {
    aliases
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str).filter(|s| !s.is_empty()))
}

/// Pick the first present field among aliased names, as a raw value.
pub(crate) fn aliased_value<'a>(obj: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|k| obj.get(*k))
}
