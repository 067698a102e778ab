//! HTML artifact rendering — file-list cards, order tables, quotation
//! tables, and the standalone email document wrapper.

use serde_json::{Map, Value};

use crate::render::classify::{aliased_str, aliased_value};

// ── Text helpers ────────────────────────────────────────────────────

/// Escape user-entered text for safe embedding in HTML.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Forgiving float parse: numbers pass through, numeric strings parse,
/// everything else is 0.
pub(crate) fn parse_number(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Format a currency amount with exactly two decimals and thousands
/// separators: `1234567.8` → `1,234,567.80`.
pub(crate) fn format_amount(value: f64) -> String {
    let raw = format!("{value:.2}");
    let (sign, rest) = match raw.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", raw.as_str()),
    };
    let (int_part, frac_part) = rest.split_once('.').unwrap_or((rest, "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac_part}")
}

/// Display a quantity without a trailing `.0` when integral.
fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

// ── File list ───────────────────────────────────────────────────────

const ICON_IMAGE: &str = r##"<svg width="20" height="20" viewBox="0 0 24 24" fill="none"><rect x="3" y="3" width="18" height="18" rx="2" stroke="#10b981" stroke-width="2"/><circle cx="8.5" cy="8.5" r="1.5" fill="#10b981"/><path d="M21 15l-5-5L5 21" stroke="#10b981" stroke-width="2"/></svg>"##;
const ICON_PDF: &str = r##"<svg width="20" height="20" viewBox="0 0 24 24" fill="none"><path d="M14 2H6a2 2 0 00-2 2v16a2 2 0 002 2h12a2 2 0 002-2V8z" stroke="#ef4444" stroke-width="2"/><path d="M14 2v6h6" stroke="#ef4444" stroke-width="2"/><text x="7" y="17" font-size="6" fill="#ef4444">PDF</text></svg>"##;
const ICON_WORD: &str = r##"<svg width="20" height="20" viewBox="0 0 24 24" fill="none"><path d="M14 2H6a2 2 0 00-2 2v16a2 2 0 002 2h12a2 2 0 002-2V8z" stroke="#2563eb" stroke-width="2"/><path d="M14 2v6h6" stroke="#2563eb" stroke-width="2"/><text x="8" y="17" font-size="6" fill="#2563eb">W</text></svg>"##;
const ICON_EXCEL: &str = r##"<svg width="20" height="20" viewBox="0 0 24 24" fill="none"><path d="M14 2H6a2 2 0 00-2 2v16a2 2 0 002 2h12a2 2 0 002-2V8z" stroke="#16a34a" stroke-width="2"/><path d="M14 2v6h6" stroke="#16a34a" stroke-width="2"/><text x="8" y="17" font-size="6" fill="#16a34a">X</text></svg>"##;
const ICON_PPT: &str = r##"<svg width="20" height="20" viewBox="0 0 24 24" fill="none"><path d="M14 2H6a2 2 0 00-2 2v16a2 2 0 002 2h12a2 2 0 002-2V8z" stroke="#ea580c" stroke-width="2"/><path d="M14 2v6h6" stroke="#ea580c" stroke-width="2"/><text x="8" y="17" font-size="6" fill="#ea580c">P</text></svg>"##;
const ICON_ARCHIVE: &str = r##"<svg width="20" height="20" viewBox="0 0 24 24" fill="none"><rect x="3" y="4" width="18" height="16" rx="2" stroke="#a855f7" stroke-width="2"/><path d="M12 4v16M9 8h6M9 12h6" stroke="#a855f7" stroke-width="2"/></svg>"##;
const ICON_DOCUMENT: &str = r##"<svg width="20" height="20" viewBox="0 0 24 24" fill="none"><path d="M14 2H6a2 2 0 00-2 2v16a2 2 0 002 2h12a2 2 0 002-2V8z" stroke="#6b7280" stroke-width="2"/><path d="M14 2v6h6M8 13h8M8 17h8" stroke="#6b7280" stroke-width="2"/></svg>"##;

/// Pick an icon by MIME type, falling back to the filename extension.
fn file_icon(name: &str, mime: &str) -> &'static str {
    let mime = mime.to_lowercase();
    let name = name.to_lowercase();

    if mime.starts_with("image/") {
        return ICON_IMAGE;
    }
    if mime.contains("pdf") || name.ends_with(".pdf") {
        return ICON_PDF;
    }
    if mime.contains("word") || name.ends_with(".doc") || name.ends_with(".docx") {
        return ICON_WORD;
    }
    if mime.contains("excel")
        || mime.contains("spreadsheet")
        || name.ends_with(".xls")
        || name.ends_with(".xlsx")
    {
        return ICON_EXCEL;
    }
    if mime.contains("powerpoint")
        || mime.contains("presentation")
        || name.ends_with(".ppt")
        || name.ends_with(".pptx")
    {
        return ICON_PPT;
    }
    if ["zip", "rar", "7z", "tar", "gz", "compressed"]
        .iter()
        .any(|kw| mime.contains(kw) || name.ends_with(&format!(".{kw}")))
    {
        return ICON_ARCHIVE;
    }
    ICON_DOCUMENT
}

/// Render an uploaded-files value as a self-contained styled card.
///
/// Empty input renders the literal `暂无文件`.
pub fn generate_file_list(files: &[Value]) -> String {
    if files.is_empty() {
        return "暂无文件".to_string();
    }

    let mut html = format!(
        "<div style=\"border:1px solid #e5e7eb;border-radius:8px;padding:16px;background-color:#f9fafb;\">\
         <div style=\"font-weight:600;color:#374151;margin-bottom:12px;\">共 {} 个文件</div>",
        files.len()
    );

    let empty = Map::new();
    for file in files {
        let obj = file.as_object().unwrap_or(&empty);
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .unwrap_or("未知文件");
        let mime = obj.get("type").and_then(Value::as_str).unwrap_or("");
        let size_mb = parse_number(obj.get("size")) / 1024.0 / 1024.0;

        html.push_str(&format!(
            "<div style=\"display:flex;align-items:center;padding:8px 0;border-bottom:1px solid #f3f4f6;\">\
             {icon}\
             <span style=\"margin-left:8px;color:#111827;\">{name}</span>\
             <span style=\"margin-left:auto;color:#6b7280;font-size:13px;\">{size:.2} MB</span>\
             </div>",
            icon = file_icon(name, mime),
            name = escape_html(name),
            size = size_mb,
        ));
    }

    html.push_str("</div>");
    html
}

// ── Order table ─────────────────────────────────────────────────────

const TH_STYLE: &str = "padding:10px 12px;background-color:#f3f4f6;color:#374151;\
                        font-weight:600;text-align:left;border:1px solid #e5e7eb;";
const TD_STYLE: &str = "padding:10px 12px;color:#111827;border:1px solid #e5e7eb;";

/// Read a string field through a CJK-first/English-fallback alias pair.
fn order_field<'a>(obj: &'a Map<String, Value>, cjk: &str, en: &str) -> Option<&'a str> {
    aliased_str(obj, &[cjk, en])
}

/// Render an order-items value as a styled table with a total row.
///
/// Empty input renders the literal `暂无订单项`.
pub fn generate_order_table(items: &[Value]) -> String {
    if items.is_empty() {
        return "暂无订单项".to_string();
    }

    let mut html = String::from(
        "<table style=\"width:100%;border-collapse:collapse;font-size:14px;\">\
         <thead><tr>",
    );
    for header in ["序号", "服务名称", "分类", "单价", "数量", "小计"] {
        html.push_str(&format!("<th style=\"{TH_STYLE}\">{header}</th>"));
    }
    html.push_str("</tr></thead><tbody>");

    let empty = Map::new();
    let mut total = 0.0;
    for (i, item) in items.iter().enumerate() {
        let obj = item.as_object().unwrap_or(&empty);
        let name = order_field(obj, "服务名称", "serviceName").unwrap_or("未知项目");
        let category = order_field(obj, "分类", "categoryName").unwrap_or("-");
        let unit = order_field(obj, "单位", "unit").unwrap_or("");
        let unit_price = parse_number(aliased_value(obj, &["单价", "unitPrice"]));
        let quantity = parse_number(aliased_value(obj, &["数量", "quantity"]));
        let subtotal = parse_number(aliased_value(obj, &["小计", "subtotal"]));
        total += subtotal;

        html.push_str(&format!(
            "<tr>\
             <td style=\"{TD_STYLE}\">{index:02}</td>\
             <td style=\"{TD_STYLE}\">{name}</td>\
             <td style=\"{TD_STYLE}\">{category}</td>\
             <td style=\"{TD_STYLE}\">¥{price}</td>\
             <td style=\"{TD_STYLE}\">{quantity}{unit}</td>\
             <td style=\"{TD_STYLE}\">¥{subtotal}</td>\
             </tr>",
            index = i + 1,
            name = escape_html(name),
            category = escape_html(category),
            price = format_amount(unit_price),
            quantity = format_quantity(quantity),
            unit = escape_html(unit),
            subtotal = format_amount(subtotal),
        ));
    }

    html.push_str(&format!(
        "<tr>\
         <td colspan=\"5\" style=\"{TD_STYLE}font-weight:600;text-align:right;\">总计</td>\
         <td style=\"{TD_STYLE}font-weight:600;color:#dc2626;\">¥{}</td>\
         </tr></tbody></table>",
        format_amount(total)
    ));
    html
}

// ── Quotation table ─────────────────────────────────────────────────

/// Convert every newline flavor (`\r\n`, `\n`, `\r`) to `<br/>`.
fn newlines_to_br(text: &str) -> String {
    text.replace("\r\n", "<br/>")
        .replace('\n', "<br/>")
        .replace('\r', "<br/>")
}

/// Render a quotation object: one sub-table per service category.
///
/// A quotation without services renders a styled placeholder card.
pub fn generate_quotation_table(quotation: &Value) -> String {
    let services = quotation
        .get("services")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    if services.is_empty() {
        return "<div style=\"border:1px dashed #d1d5db;border-radius:8px;padding:24px;\
                text-align:center;color:#9ca3af;\">暂无服务项目</div>"
            .to_string();
    }

    // Group by category, preserving first-seen order.
    let empty = Map::new();
    let mut groups: Vec<(&str, Vec<&Map<String, Value>>)> = Vec::new();
    for service in services {
        let obj = service.as_object().unwrap_or(&empty);
        let category = aliased_str(obj, &["categoryName", "category"]).unwrap_or("其他服务");
        match groups.iter_mut().find(|(name, _)| *name == category) {
            Some((_, members)) => members.push(obj),
            None => groups.push((category, vec![obj])),
        }
    }

    let mut html = String::new();
    for (category, members) in groups {
        html.push_str(&format!(
            "<div style=\"font-weight:600;color:#374151;margin:16px 0 8px;\">{}</div>\
             <table style=\"width:100%;border-collapse:collapse;font-size:14px;\">\
             <thead><tr>\
             <th style=\"{TH_STYLE}\">服务名称</th>\
             <th style=\"{TH_STYLE}\">单价</th>\
             <th style=\"{TH_STYLE}\">价格说明</th>\
             </tr></thead><tbody>",
            escape_html(category)
        ));

        for obj in members {
            let name = aliased_str(obj, &["name", "serviceName"]).unwrap_or("未知服务");
            let unit = aliased_str(obj, &["unit", "单位"]).unwrap_or("项");
            let price = parse_number(aliased_value(obj, &["unitPrice", "单价"]));
            let description =
                aliased_str(obj, &["priceDescription", "价格说明", "description"]).unwrap_or("");

            html.push_str(&format!(
                "<tr>\
                 <td style=\"{TD_STYLE}\">{name}</td>\
                 <td style=\"{TD_STYLE}\">¥{price}/{unit}</td>\
                 <td style=\"{TD_STYLE}color:#6b7280;\">{description}</td>\
                 </tr>",
                name = escape_html(name),
                price = format_amount(price),
                unit = escape_html(unit),
                description = newlines_to_br(&escape_html(description)),
            ));
        }
        html.push_str("</tbody></table>");
    }
    html
}

// ── Document wrapper ────────────────────────────────────────────────

/// Wrap body HTML in a complete standalone document: centered 1200px
/// container with responsive breakpoints at 768px and 480px.
pub fn wrap_email_content(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head>\n\
         <meta charset=\"utf-8\"/>\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\"/>\n\
         <style>\n\
         body {{ margin:0; padding:0; background-color:#f5f6f8; \
         font-family:'Helvetica Neue',Arial,'PingFang SC','Microsoft YaHei',sans-serif; }}\n\
         .email-container {{ max-width:1200px; margin:0 auto; padding:32px; \
         background-color:#ffffff; border-radius:12px; }}\n\
         @media (max-width: 768px) {{ .email-container {{ padding:16px; border-radius:8px; }} }}\n\
         @media (max-width: 480px) {{ .email-container {{ padding:8px; border-radius:4px; }} }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <div class=\"email-container\">\n\
         {body}\n\
         </div>\n\
         </body>\n\
         </html>"
    )
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn amount_has_two_decimals_and_thousands_separators() {
        assert_eq!(format_amount(250.0), "250.00");
        assert_eq!(format_amount(1234567.8), "1,234,567.80");
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(-1234.5), "-1,234.50");
    }

    #[test]
    fn parse_number_is_forgiving() {
        assert_eq!(parse_number(Some(&json!(12.5))), 12.5);
        assert_eq!(parse_number(Some(&json!("99.9"))), 99.9);
        assert_eq!(parse_number(Some(&json!("not a number"))), 0.0);
        assert_eq!(parse_number(Some(&json!(null))), 0.0);
        assert_eq!(parse_number(None), 0.0);
    }

    #[test]
    fn empty_file_list_renders_sentinel() {
        assert_eq!(generate_file_list(&[]), "暂无文件");
    }

    #[test]
    fn file_list_shows_count_name_and_size() {
        let files = vec![json!({"name": "报告.pdf", "type": "application/pdf", "size": 2097152})];
        let html = generate_file_list(&files);
        assert!(html.contains("共 1 个文件"));
        assert!(html.contains("报告.pdf"));
        assert!(html.contains("2.00 MB"));
    }

    #[test]
    fn file_icon_heuristics() {
        assert_eq!(file_icon("a.png", "image/png"), ICON_IMAGE);
        assert_eq!(file_icon("report.pdf", ""), ICON_PDF);
        assert_eq!(file_icon("doc.docx", ""), ICON_WORD);
        assert_eq!(
            file_icon("x", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            ICON_EXCEL
        );
        assert_eq!(file_icon("slides.pptx", ""), ICON_PPT);
        assert_eq!(file_icon("bundle.zip", ""), ICON_ARCHIVE);
        assert_eq!(file_icon("notes.txt", "text/plain"), ICON_DOCUMENT);
    }

    #[test]
    fn empty_order_table_renders_sentinel() {
        assert_eq!(generate_order_table(&[]), "暂无订单项");
    }

    #[test]
    fn order_table_sums_subtotals_into_total_row() {
        let items = vec![
            json!({"服务名称": "A", "单价": 100, "数量": 2, "小计": 200}),
            json!({"服务名称": "B", "单价": 50, "数量": 1, "小计": 50}),
        ];
        let html = generate_order_table(&items);
        assert!(html.contains("¥250.00"));
        assert!(html.contains("总计"));
        assert!(html.contains("<td style"));
    }

    #[test]
    fn order_table_reads_english_aliases_and_pads_index() {
        let items = vec![json!({
            "serviceName": "网站开发",
            "categoryName": "开发",
            "unitPrice": 8000,
            "quantity": 1,
            "unit": "次",
            "subtotal": 8000,
        })];
        let html = generate_order_table(&items);
        assert!(html.contains(">01<"));
        assert!(html.contains("网站开发"));
        assert!(html.contains("开发"));
        assert!(html.contains("¥8,000.00"));
        assert!(html.contains("1次"));
    }

    #[test]
    fn order_table_defaults_unparseable_numbers_to_zero() {
        let items = vec![json!({"服务名称": "A", "单价": "abc", "数量": null, "小计": "xyz"})];
        let html = generate_order_table(&items);
        assert!(html.contains("¥0.00"));
    }

    #[test]
    fn quotation_without_services_renders_placeholder_card() {
        let html = generate_quotation_table(&json!({"name": "空报价单"}));
        assert!(html.contains("暂无服务项目"));

        let html = generate_quotation_table(&json!({"services": []}));
        assert!(html.contains("暂无服务项目"));
    }

    #[test]
    fn quotation_groups_services_by_category() {
        let quotation = json!({
            "services": [
                {"name": "LOGO设计", "categoryName": "设计", "unitPrice": 500, "unit": "次"},
                {"name": "名片设计", "categoryName": "设计", "unitPrice": 200, "unit": "次"},
                {"name": "域名注册", "unitPrice": 60, "unit": "年"},
            ]
        });
        let html = generate_quotation_table(&quotation);
        assert_eq!(html.matches("设计</div>").count(), 1);
        assert!(html.contains("其他服务"));
        assert!(html.contains("¥500.00/次"));
        assert!(html.contains("¥60.00/年"));
    }

    #[test]
    fn quotation_converts_every_newline_flavor_to_br() {
        let quotation = json!({
            "services": [{
                "name": "套餐",
                "unitPrice": 99,
                "priceDescription": "首年\r\n次年\n第三年\r续费",
            }]
        });
        let html = generate_quotation_table(&quotation);
        assert!(html.contains("首年<br/>次年<br/>第三年<br/>续费"));
        assert!(!html.contains('\r'));
    }

    #[test]
    fn wrapper_is_a_standalone_responsive_document() {
        let html = wrap_email_content("<p>你好</p>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("max-width:1200px"));
        assert!(html.contains("@media (max-width: 768px)"));
        assert!(html.contains("@media (max-width: 480px)"));
        assert!(html.contains("<p>你好</p>"));
    }

    #[test]
    fn user_text_is_escaped() {
        let files = vec![json!({"name": "<script>.pdf", "size": 1024})];
        let html = generate_file_list(&files);
        assert!(html.contains("&lt;script&gt;.pdf"));
        assert!(!html.contains("<script>"));
    }
}
