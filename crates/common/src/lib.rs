//! Common types and utilities for yang-docgen
//!
//! This crate contains the option-document model produced by the converter,
//! the YAML helpers used to render and embed it, and the shared error type
//! for document I/O.

pub mod documentation;
mod options;

pub use options::{OptionType, OptionsMap, OptionsNode};

use thiserror::Error;

/// Errors that can occur while reading, rendering or embedding documents
#[derive(Error, Debug)]
pub enum DocgenError {
    #[error("Document error: {0}")]
    Document(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocgenError>;

/// Normalize a YANG description for use in an option document
///
/// Runs of whitespace (including line breaks) collapse to a single space and
/// colons become semicolons so the text stays a plain YAML scalar.
pub fn normalize_description(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(':', ";")
}

/// Turn a YANG identifier into an option key (`admin-status` → `admin_status`)
pub fn option_key(name: &str) -> String {
    name.replace('-', "_")
}
