//! Identifier sanitization for imported tables and columns
//!
//! A sanitized identifier contains only `[a-z0-9_]`: ASCII letters are
//! lower-cased and every other character becomes `_`.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref DISALLOWED: Regex = Regex::new(r"[^A-Za-z0-9_]").unwrap();
    static ref SANITIZED: Regex = Regex::new(r"^[a-z0-9_]+$").unwrap();
}

/// Reduce `raw` to `[a-z0-9_]`, one `_` per replaced character.
pub fn sanitize_identifier(raw: &str) -> String {
    DISALLOWED.replace_all(raw, "_").to_ascii_lowercase()
}

pub fn is_sanitized(name: &str) -> bool {
    SANITIZED.is_match(name)
}

/// Default table name for an uploaded file: the base name without its last
/// extension, sanitized.
///
/// `"data/My Movies.2024.csv"` becomes `my_movies_2024`. A name without an
/// extension is used whole.
pub fn default_table_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };
    sanitize_identifier(stem)
}

/// Sanitize header cells into distinct column names.
///
/// Cells that sanitize to nothing become `column_<position>`. A name already
/// taken gets the first free `_2`, `_3`, ... suffix, so no column is lost.
pub fn column_names(raw_headers: &[String]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(raw_headers.len());

    for (idx, raw) in raw_headers.iter().enumerate() {
        let mut base = sanitize_identifier(raw.trim());
        if base.is_empty() {
            base = format!("column_{}", idx + 1);
        }

        let mut name = base.clone();
        let mut suffix = 2;
        while taken.contains(&name) {
            name = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        taken.insert(name.clone());
        names.push(name);
    }

    names
}
