//! YANG schema retrieval over NETCONF
//!
//! This crate lists the schemas a device advertises through
//! `ietf-netconf-monitoring`, downloads them with `<get-schema>` and follows
//! their `import` statements until the dependency closure is complete.
//!
//! ## Fetch Strategy
//!
//! The closure walk is breadth-first over a FIFO queue:
//! - the requested schema is downloaded first
//! - its imports are discovered with a textual scan of the schema body
//! - every import not yet fetched, failed or queued is enqueued
//!
//! Failures either abort the walk or, with `continue_on_failure`, are
//! recorded in [`FetchResult::failed`] while the queue keeps draining.
//!
//! ## Usage
//! ```rust,ignore
//! use yang_docgen_fetcher::{FetchResult, SchemaStore, SshConnection, SshTarget};
//!
//! let conn = SshConnection::connect(&SshTarget::new("192.0.2.1"))?;
//! let mut store = SchemaStore::connect(conn)?;
//! let mut result = FetchResult::default();
//! let count = store.fetch_closure("openconfig-interfaces", false, &mut result)?;
//! ```

mod catalog;
mod connection;
mod imports;
mod reply;
mod ssh;
mod store;

pub use catalog::{SchemaCatalog, SchemaDescriptor};
pub use connection::{ensure_monitoring_capability, NetconfConnection};
pub use imports::scan_imports;
pub use reply::XmlElement;
pub use ssh::{SshConnection, SshTarget};
pub use store::{write_schemas, FetchResult, SchemaStore, ALL_SCHEMAS};

#[cfg(test)]
pub(crate) use connection::MockNetconfConnection;

use thiserror::Error;

/// Namespace of the NETCONF base protocol
pub const NETCONF_BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Namespace of the schema-monitoring module advertising the schema catalog
pub const NETCONF_MONITORING_NS: &str = "urn:ietf:params:xml:ns:yang:ietf-netconf-monitoring";

/// Errors that can occur while fetching schemas
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(
        "remote NETCONF server does not support the capability required to fetch YANG schemas ({0})"
    )]
    Precondition(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to fetch '{0}' yang model: not listed in the device schema catalog")]
    NotFound(String),

    #[error("Malformed NETCONF reply: {0}")]
    MalformedReply(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;
