//! Import discovery over raw schema text
//!
//! Imports are found with a line-oriented pattern (`import <name> {`) rather
//! than a YANG parser. Unusual layouts, such as the opening brace on the next
//! line, are not discovered.

use regex::Regex;
use std::sync::LazyLock;

static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"import (.+) \{").expect("import pattern is valid"));

/// Names of the modules imported by a schema, in order of appearance
///
/// Quote characters around the module name are dropped.
pub fn scan_imports(schema_text: &str) -> Vec<String> {
    IMPORT_RE
        .captures_iter(schema_text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().replace(['\'', '"'], "").trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}
