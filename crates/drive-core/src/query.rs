//! Remote query construction

/// Excludes trashed files from every listing
pub const NOT_TRASHED: &str = "trashed = false";

/// Ordering of the recent files view
pub const RECENT_ORDER: &str = "modifiedTime desc";

/// Escape a value for use inside a single-quoted query literal
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Query for a plain listing, optionally restricted by name
pub fn list_query(name_filter: Option<&str>) -> String {
    match name_filter {
        Some(filter) => format!(
            "name contains '{}' and {}",
            escape_literal(filter),
            NOT_TRASHED
        ),
        None => NOT_TRASHED.to_string(),
    }
}

/// Query matching names or extracted full text
pub fn search_query(query: &str) -> String {
    let literal = escape_literal(query);
    format!(
        "(name contains '{literal}' or fullText contains '{literal}') and {}",
        NOT_TRASHED
    )
}
