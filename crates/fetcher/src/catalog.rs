//! Schema catalog advertised by `ietf-netconf-monitoring`

use crate::reply::{check_rpc_error, reply_data, XmlElement};
use crate::{FetchError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// One schema advertised by the device
///
/// `identifier` alone is not unique: the same module may be listed in
/// several revisions or formats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaDescriptor {
    pub identifier: String,

    /// Revision date, empty when the device lists none
    pub revision: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Catalog listing plus an identifier → revision index
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    descriptors: Vec<SchemaDescriptor>,
    revisions: HashMap<String, String>,
}

impl SchemaCatalog {
    /// Build a catalog from descriptors in enumeration order
    ///
    /// When an identifier is listed more than once, the last listed revision
    /// is the one used for retrieval.
    pub fn new(descriptors: Vec<SchemaDescriptor>) -> Self {
        let revisions = descriptors
            .iter()
            .map(|d| (d.identifier.clone(), d.revision.clone()))
            .collect();
        Self {
            descriptors,
            revisions,
        }
    }

    /// Parse the reply to the `netconf-state/schemas` subtree query
    pub fn from_reply(xml: &str) -> Result<Self> {
        let root = XmlElement::parse(xml)?;
        check_rpc_error(&root)?;

        let schemas = reply_data(&root)
            .and_then(|data| data.descend(&["netconf-state", "schemas"]))
            .ok_or_else(|| {
                FetchError::MalformedReply("No netconf-state/schemas in catalog reply".to_string())
            })?;

        let mut descriptors = Vec::new();
        for schema in schemas.children_named("schema") {
            let identifier = schema.child_text("identifier").ok_or_else(|| {
                FetchError::MalformedReply("Catalog entry without identifier".to_string())
            })?;

            descriptors.push(SchemaDescriptor {
                identifier: identifier.to_string(),
                revision: schema.child_text("version").unwrap_or_default().to_string(),
                format: schema.child_text("format").map(str::to_string),
                namespace: schema.child_text("namespace").map(str::to_string),
            });
        }

        Ok(Self::new(descriptors))
    }

    /// Descriptors in the order the device listed them
    pub fn descriptors(&self) -> &[SchemaDescriptor] {
        &self.descriptors
    }

    /// Identifiers in enumeration order, duplicates included
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(|d| d.identifier.as_str())
    }

    /// Revision used to retrieve an identifier
    pub fn revision_of(&self, identifier: &str) -> Option<&str> {
        self.revisions.get(identifier).map(String::as_str)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.revisions.contains_key(identifier)
    }

    /// Sorted, de-duplicated identifiers
    pub fn supported_modules(&self) -> Vec<String> {
        let mut modules: Vec<String> = self.revisions.keys().cloned().collect();
        modules.sort();
        modules
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"<rpc-reply message-id="1" xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
      <data>
        <netconf-state xmlns="urn:ietf:params:xml:ns:yang:ietf-netconf-monitoring">
          <schemas>
            <schema>
              <identifier>openconfig-interfaces</identifier>
              <version>2019-11-19</version>
              <format>yang</format>
              <namespace>http://openconfig.net/yang/interfaces</namespace>
            </schema>
            <schema>
              <identifier>ietf-inet-types</identifier>
              <version>2010-09-24</version>
            </schema>
            <schema>
              <identifier>ietf-inet-types</identifier>
              <version>2013-07-15</version>
            </schema>
          </schemas>
        </netconf-state>
      </data>
    </rpc-reply>"#;

    #[test]
    fn test_catalog_from_reply() {
        let catalog = SchemaCatalog::from_reply(REPLY).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.descriptors()[0].namespace.as_deref(),
            Some("http://openconfig.net/yang/interfaces")
        );
        assert_eq!(
            catalog.revision_of("openconfig-interfaces"),
            Some("2019-11-19")
        );
    }

    #[test]
    fn test_last_listed_revision_wins() {
        let catalog = SchemaCatalog::from_reply(REPLY).unwrap();
        assert_eq!(catalog.revision_of("ietf-inet-types"), Some("2013-07-15"));
    }

    #[test]
    fn test_catalog_without_envelope() {
        let xml = r#"<data><netconf-state><schemas>
            <schema><identifier>b-mod</identifier></schema>
            <schema><identifier>a-mod</identifier></schema>
        </schemas></netconf-state></data>"#;
        let catalog = SchemaCatalog::from_reply(xml).unwrap();
        assert_eq!(catalog.revision_of("b-mod"), Some(""));
        assert_eq!(catalog.supported_modules(), vec!["a-mod", "b-mod"]);
    }

    #[test]
    fn test_catalog_reply_without_schemas() {
        let err = SchemaCatalog::from_reply("<rpc-reply><ok/></rpc-reply>").unwrap_err();
        assert!(matches!(err, FetchError::MalformedReply(_)));
    }
}
