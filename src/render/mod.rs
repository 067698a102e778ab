//! Rendering — value classification and formatting, HTML artifacts, and
//! placeholder flattening.

pub mod classify;
pub mod html;
pub mod placeholder;
pub mod value;

pub use classify::ValueShape;
pub use html::{generate_file_list, generate_order_table, generate_quotation_table, wrap_email_content};
pub use placeholder::{
    PlaceholderData, add_form_field_placeholders, build_placeholder_data, is_empty,
    is_valid_email, normalize_label, replace_placeholders,
};
pub use value::{format_field_value, format_value_for_email, generate_formatted_content};
