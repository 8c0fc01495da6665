//! Schema store: catalog listing, single retrieval and closure fetch

use crate::catalog::SchemaCatalog;
use crate::connection::{ensure_monitoring_capability, NetconfConnection};
use crate::imports::scan_imports;
use crate::reply::{check_rpc_error, reply_data, XmlElement};
use crate::{FetchError, Result, NETCONF_MONITORING_NS};
use quick_xml::escape::escape;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Schema name that selects every schema in the catalog
pub const ALL_SCHEMAS: &str = "all";

const CATALOG_FILTER: &str = r#"<filter xmlns="urn:ietf:params:xml:ns:netconf:base:1.0" type="subtree"><netconf-state xmlns="urn:ietf:params:xml:ns:yang:ietf-netconf-monitoring"><schemas/></netconf-state></filter>"#;

/// Accumulated outcome of one or more closure fetches
#[derive(Debug, Clone, Default, Serialize)]
pub struct FetchResult {
    /// Schema text by identifier
    pub fetched: BTreeMap<String, String>,

    /// Identifiers whose download failed, in order of failure
    #[serde(rename = "failed_yang_models")]
    pub failed: Vec<String>,
}

impl FetchResult {
    pub fn contains(&self, identifier: &str) -> bool {
        self.fetched.contains_key(identifier)
    }

    pub fn is_failed(&self, identifier: &str) -> bool {
        self.failed.iter().any(|f| f == identifier)
    }

    fn is_settled(&self, identifier: &str) -> bool {
        self.contains(identifier) || self.is_failed(identifier)
    }
}

/// Fetches schemas from a device through a [`NetconfConnection`]
pub struct SchemaStore<C> {
    conn: C,
    catalog: Option<SchemaCatalog>,
}

impl<C: NetconfConnection> SchemaStore<C> {
    /// Wrap a connection without checking capabilities
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            catalog: None,
        }
    }

    /// Wrap a connection after verifying the schema-monitoring capability
    pub fn connect(conn: C) -> Result<Self> {
        ensure_monitoring_capability(&conn.server_capabilities()?)?;
        Ok(Self::new(conn))
    }

    /// List the device's schema catalog
    ///
    /// The catalog is queried once and cached for the store's lifetime.
    pub fn list_catalog(&mut self) -> Result<&SchemaCatalog> {
        if self.catalog.is_none() {
            let reply = self.conn.get(CATALOG_FILTER)?;
            let catalog = SchemaCatalog::from_reply(&reply)?;
            debug!(schemas = catalog.len(), "Listed schema catalog");
            self.catalog = Some(catalog);
        }

        self.catalog
            .as_ref()
            .ok_or_else(|| FetchError::MalformedReply("Schema catalog unavailable".to_string()))
    }

    /// Sorted names of the modules the device supports
    pub fn supported_modules(&mut self) -> Result<Vec<String>> {
        Ok(self.list_catalog()?.supported_modules())
    }

    fn revision_of(&mut self, identifier: &str) -> Result<Option<String>> {
        Ok(self
            .list_catalog()?
            .revision_of(identifier)
            .map(str::to_string))
    }

    /// Retrieve one schema's text
    ///
    /// The text is returned exactly as the device sent it, surrounding
    /// whitespace included.
    pub fn fetch_one(&mut self, identifier: &str, revision: &str) -> Result<String> {
        if !self.list_catalog()?.contains(identifier) {
            return Err(FetchError::NotFound(identifier.to_string()));
        }

        let request = format!(
            r#"<get-schema xmlns="{}"><identifier>{}</identifier><version>{}</version></get-schema>"#,
            NETCONF_MONITORING_NS,
            escape(identifier),
            escape(revision)
        );
        let reply = self.conn.dispatch(&request)?;

        let root = XmlElement::parse(&reply)?;
        check_rpc_error(&root)?;
        let text = reply_data(&root)
            .map(|data| data.text.as_str())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| {
                FetchError::MalformedReply(format!("No schema text for '{}'", identifier))
            })?;

        info!(schema = identifier, revision, "Fetched yang model");
        Ok(text.to_string())
    }

    /// Fetch a schema and everything it transitively imports
    ///
    /// Returns the number of schemas newly stored in `result` by this call.
    /// With `continue_on_failure` unset the first failure is returned and
    /// `result` keeps what was stored before it; otherwise failed identifiers
    /// are appended to `result.failed` and the walk goes on.
    pub fn fetch_closure(
        &mut self,
        root: &str,
        continue_on_failure: bool,
        result: &mut FetchResult,
    ) -> Result<usize> {
        let root_revision = self.revision_of(root)?.unwrap_or_default();

        let mut queue = VecDeque::from([(root.to_string(), root_revision)]);
        let mut queued = HashSet::from([root.to_string()]);
        let mut count = 0;

        while let Some((identifier, revision)) = queue.pop_front() {
            if result.is_settled(&identifier) {
                debug!(schema = %identifier, "Already processed, skipping");
                continue;
            }

            let text = match self.fetch_one(&identifier, &revision) {
                Ok(text) => text,
                Err(err) if continue_on_failure => {
                    warn!(schema = %identifier, "Failed to fetch yang model: {}", err);
                    result.failed.push(identifier);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let imports = scan_imports(&text);
            result.fetched.insert(identifier, text);
            count += 1;

            for import in imports {
                if result.is_settled(&import) || !queued.insert(import.clone()) {
                    continue;
                }
                let revision = self.revision_of(&import)?.unwrap_or_default();
                debug!(schema = %import, "Queued dependency");
                queue.push_back((import, revision));
            }
        }

        Ok(count)
    }

    /// Fetch the closure of every schema in the catalog
    ///
    /// Schemas already stored by an earlier iteration are not counted again.
    pub fn fetch_all(
        &mut self,
        continue_on_failure: bool,
        result: &mut FetchResult,
    ) -> Result<usize> {
        let identifiers: Vec<String> = self
            .list_catalog()?
            .identifiers()
            .map(str::to_string)
            .collect();

        let mut total = 0;
        for identifier in identifiers {
            total += self.fetch_closure(&identifier, continue_on_failure, result)?;
        }
        Ok(total)
    }

    /// Fetch by name, where [`ALL_SCHEMAS`] selects the whole catalog
    pub fn fetch(
        &mut self,
        name: &str,
        continue_on_failure: bool,
        result: &mut FetchResult,
    ) -> Result<usize> {
        if name == ALL_SCHEMAS {
            self.fetch_all(continue_on_failure, result)
        } else {
            self.fetch_closure(name, continue_on_failure, result)
        }
    }
}

/// Write every fetched schema to `<dir>/<identifier>.yang`
pub fn write_schemas(dir: &Path, result: &FetchResult) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut written = Vec::with_capacity(result.fetched.len());
    for (identifier, text) in &result.fetched {
        let path = dir.join(format!("{}.yang", identifier));
        fs::write(&path, text)?;
        written.push(path);
    }

    debug!(count = written.len(), dir = %dir.display(), "Wrote yang models");
    Ok(written)
}
