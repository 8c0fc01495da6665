//! YANG schema tree to option document conversion
//!
//! This crate turns a resolved YANG schema context into the option documents
//! consumed by resource-module generation: every configurable data node
//! becomes an [`OptionsNode`] with a target type, description, required flag
//! and, where applicable, choices, a length bound or nested suboptions.
//!
//! ## Conversion Strategy
//!
//! The schema tree is walked depth-first in pre-order:
//! - `container` → `dict`, `list` → `list` of `dict`
//! - `leaf` → resolved scalar, `leaf-list` → `list` wrapping the scalar
//! - `choice` → cases hoisted into the parent, or one `str` option naming
//!   the cases (see [`ChoiceStyle`])
//! - non-config, deprecated and obsolete nodes are left out
//!
//! Leaf types are resolved through typedef chains, leafref targets,
//! identity derivations and union members down to the target vocabulary.
//! A type outside that vocabulary stops the conversion.

mod converter;
pub mod schema;
mod type_resolver;

pub use converter::{
    ChoiceStyle, Conversion, ConversionStats, Converter, ConverterOptions, KeyStyle,
    RequiredPolicy,
};
pub use schema::{Keyword, ModuleId, NodeId, SchemaContext, SchemaNode, Status};
pub use type_resolver::{ResolvedType, TypeResolver};
pub use yang_docgen_common::{OptionType, OptionsMap, OptionsNode};

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during conversion
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Unhandled YANG type '{type_name}' on {node}")]
    UnhandledType { type_name: String, node: String },

    #[error("Failed to resolve type of {node}: {reason}")]
    TypeResolution { node: String, reason: String },

    #[error("Path '{0}' does not exist in module")]
    PathNotFound(String),

    #[error("Module '{0}' not found in schema context")]
    ModuleNotFound(String),

    #[error("Invalid schema document: {0}")]
    InvalidSchema(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// Load a schema document and convert one module (convenience function)
///
/// # Arguments
/// * `path` - Resolved schema document (JSON)
/// * `module_name` - Module whose data tree is converted
/// * `options` - Convention flags for the generated document
pub fn convert_file(
    path: &Path,
    module_name: &str,
    options: ConverterOptions,
) -> Result<Conversion> {
    let ctx = SchemaContext::from_file(path)?;
    Converter::new(&ctx, options).convert_module(module_name)
}
