//! Serialized schema document types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Root schema document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

/// A module or submodule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub name: String,

    #[serde(default)]
    pub prefix: String,

    /// Owning module, set for submodules
    #[serde(default)]
    pub belongs_to: Option<String>,

    /// Import prefix → module name
    #[serde(default)]
    pub imports: BTreeMap<String, String>,

    #[serde(default)]
    pub typedefs: Vec<TypedefSpec>,

    #[serde(default)]
    pub identities: Vec<IdentitySpec>,

    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedefSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub type_spec: TypeSpec,

    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySpec {
    pub name: String,

    /// Base identities, possibly prefixed
    #[serde(default)]
    pub bases: Vec<String>,

    #[serde(default)]
    pub description: Option<String>,
}

/// A schema node (data node, choice, case or anything else)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub keyword: String,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Explicit `config` statement; inherited from the parent when absent
    #[serde(default)]
    pub config: Option<bool>,

    #[serde(default)]
    pub status: Status,

    #[serde(default)]
    pub mandatory: bool,

    /// `default` statement value(s); only presence matters here
    #[serde(default)]
    pub default: Option<serde_json::Value>,

    #[serde(rename = "type", default)]
    pub type_spec: Option<TypeSpec>,

    /// Module that defined this node, when it came from an augment
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub children: Vec<NodeSpec>,
}

/// A `type` statement with the substatements the converter reads
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSpec {
    /// Built-in type name or (possibly prefixed) typedef name
    pub name: String,

    /// `enum` names in declaration order
    #[serde(default)]
    pub enums: Vec<String>,

    #[serde(default)]
    pub length: Option<String>,

    /// leafref `path`
    #[serde(default)]
    pub path: Option<String>,

    /// identityref `base`
    #[serde(default)]
    pub base: Option<String>,

    /// union member types
    #[serde(default)]
    pub types: Vec<TypeSpec>,
}

impl TypeSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// `status` statement value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

impl Status {
    /// Deprecated and obsolete nodes are not offered as options
    pub fn is_retired(self) -> bool {
        !matches!(self, Status::Current)
    }
}

/// Schema node kinds the converter distinguishes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    Container,
    List,
    Leaf,
    LeafList,
    Choice,
    Case,
    Other(String),
}

impl Keyword {
    /// Choice and case nodes never appear in data paths
    pub fn is_schema_only(&self) -> bool {
        matches!(self, Keyword::Choice | Keyword::Case)
    }

    pub fn is_leafy(&self) -> bool {
        matches!(self, Keyword::Leaf | Keyword::LeafList)
    }
}

impl From<&str> for Keyword {
    fn from(keyword: &str) -> Self {
        match keyword {
            "container" => Keyword::Container,
            "list" => Keyword::List,
            "leaf" => Keyword::Leaf,
            "leaf-list" => Keyword::LeafList,
            "choice" => Keyword::Choice,
            "case" => Keyword::Case,
            other => Keyword::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Container => write!(f, "container"),
            Keyword::List => write!(f, "list"),
            Keyword::Leaf => write!(f, "leaf"),
            Keyword::LeafList => write!(f, "leaf-list"),
            Keyword::Choice => write!(f, "choice"),
            Keyword::Case => write!(f, "case"),
            Keyword::Other(other) => write!(f, "{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_defaults() {
        let json = r#"{ "keyword": "leaf", "name": "mtu", "type": { "name": "uint16" } }"#;
        let node: NodeSpec = serde_json::from_str(json).unwrap();
        assert_eq!(node.status, Status::Current);
        assert_eq!(node.config, None);
        assert!(!node.mandatory);
        assert_eq!(node.type_spec, Some(TypeSpec::named("uint16")));
    }

    #[test]
    fn test_keyword_from_str() {
        assert_eq!(Keyword::from("leaf-list"), Keyword::LeafList);
        assert_eq!(Keyword::from("rpc"), Keyword::Other("rpc".to_string()));
        assert!(Keyword::from("case").is_schema_only());
        assert_eq!(Keyword::LeafList.to_string(), "leaf-list");
    }

    #[test]
    fn test_status_values() {
        let status: Status = serde_json::from_str("\"deprecated\"").unwrap();
        assert!(status.is_retired());
        assert!(!Status::Current.is_retired());
    }
}
