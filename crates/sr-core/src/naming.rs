//! Identifier and path helpers used by every emitter.

use regex::Regex;
use std::sync::OnceLock;

fn non_alphanumeric_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").unwrap())
}

fn first_cap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap())
}

fn all_cap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap())
}

/// Upper-case the first ASCII character.
pub fn first_upper(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Lower-case the first ASCII character.
pub fn first_lower(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_ascii_lowercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `UserInfo` → `user_info`, `HTTPServer` → `http_server`.
pub fn to_snake_case(s: &str) -> String {
    let s = non_alphanumeric_re().replace_all(s, "_");
    let s = first_cap_re().replace_all(&s, "${1}_${2}");
    let s = all_cap_re().replace_all(&s, "${1}_${2}");
    s.to_lowercase()
}

/// Go exports identifiers that start with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Last `/`-separated segment of an import path.
pub fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// RPC object name for a logic struct.
///
/// Logic structs follow the `sUser` convention: a lower-case `s` prefix in
/// front of the exported object name. Other names are just capitalised.
pub fn object_name(struct_name: &str) -> String {
    let mut chars = struct_name.chars();
    if chars.next() == Some('s') && chars.next().is_some_and(|c| c.is_ascii_uppercase()) {
        return struct_name[1..].to_string();
    }
    first_upper(struct_name)
}

/// `/`-joined relative path, independent of the host separator.
pub fn slash_path(path: &std::path::Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("UserInfo"), "user_info");
        assert_eq!(to_snake_case("HTTPServer"), "http_server");
        assert_eq!(to_snake_case("order-item"), "order_item");
    }

    #[test]
    fn test_first_case() {
        assert_eq!(first_upper("user"), "User");
        assert_eq!(first_lower("User"), "user");
        assert_eq!(first_upper(""), "");
    }

    #[test]
    fn test_object_name() {
        assert_eq!(object_name("sUser"), "User");
        assert_eq!(object_name("sorter"), "Sorter");
        assert_eq!(object_name("Account"), "Account");
    }

    #[test]
    fn test_last_segment_and_export() {
        assert_eq!(last_segment("github.com/a/b/model"), "model");
        assert_eq!(last_segment("time"), "time");
        assert!(is_exported("Name"));
        assert!(!is_exported("name"));
    }
}
