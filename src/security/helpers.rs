use crate::security::templates;
use crate::security::types::Protocol;

/// Render the port descriptor of a permission entry: `ALL`, `N` or `N-M`
pub fn port_descriptor(protocol: &Protocol, from_port: Option<i32>, to_port: Option<i32>) -> String {
    if *protocol == Protocol::All {
        return templates::ALL_PORTS.to_string();
    }

    match (from_port, to_port) {
        // Negative bounds are the provider's "every type/code" marker (ICMP)
        (Some(from), Some(to)) if from < 0 || to < 0 => templates::ALL_PORTS.to_string(),
        (Some(from), Some(to)) if from == to => from.to_string(),
        (Some(from), Some(to)) => format!("{}-{}", from, to),
        (Some(single), None) | (None, Some(single)) if single < 0 => templates::ALL_PORTS.to_string(),
        (Some(single), None) | (None, Some(single)) => single.to_string(),
        (None, None) => templates::PLACEHOLDER.to_string(),
    }
}

/// Replace an empty field with the report placeholder
pub fn or_placeholder(value: &str) -> &str {
    if value.trim().is_empty() {
        templates::PLACEHOLDER
    } else {
        value
    }
}

/// Spreadsheet sheet names are limited to 31 characters and forbid `[]:*?/\`
pub fn sanitize_sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return "Sheet".to_string();
    }
    cleaned.chars().take(31).collect()
}
