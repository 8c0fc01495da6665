//! Resolved YANG schema model
//!
//! Schemas arrive as a JSON document describing modules after `uses` and
//! `augment` expansion: every data node lists its children in schema order,
//! carries its type statement verbatim and may name the module that defined
//! it when that differs from the module it sits in.
//!
//! ## Document Format
//! ```json
//! {
//!   "modules": [{
//!     "name": "example-interfaces",
//!     "prefix": "if",
//!     "imports": { "yang": "ietf-yang-types" },
//!     "typedefs": [{ "name": "if-name", "type": { "name": "string", "length": "1..64" } }],
//!     "identities": [{ "name": "ethernet", "bases": ["interface-type"] }],
//!     "children": [{
//!       "keyword": "container", "name": "interfaces",
//!       "children": [{ "keyword": "leaf", "name": "name", "type": { "name": "if-name" } }]
//!     }]
//!   }]
//! }
//! ```
//!
//! Submodules are listed with `belongs_to`; their typedefs and identities
//! count as part of the owning module and their top-level nodes are attached
//! to it.

mod context;
mod types;

pub use context::{Identity, Module, ModuleId, NodeId, SchemaContext, SchemaNode, Typedef};
pub use types::*;
