use crate::schema::{Keyword, ModuleId, NodeId, SchemaContext, SchemaNode};
use crate::type_resolver::{ResolvedType, TypeResolver};
use crate::{ConvertError, OptionType, OptionsMap, OptionsNode, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use yang_docgen_common::{normalize_description, option_key};

/// How the `required` flag of a leaf is derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequiredPolicy {
    /// Required iff `mandatory true`
    #[default]
    Mandatory,
    /// Required iff the leaf has no `default`
    NoDefault,
}

/// How a `choice` appears in the options document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChoiceStyle {
    /// Case contents are merged into the parent's options
    #[default]
    Hoist,
    /// One `str` option whose choices are the case names
    Enumerate,
}

/// How option keys are spelled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStyle {
    /// Local name with `-` replaced by `_`
    #[default]
    Local,
    /// YANG-JSON member names (`module:name` where the module changes)
    Qualified,
}

/// Convention flags for one conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    pub required: RequiredPolicy,
    pub choices: ChoiceStyle,
    pub keys: KeyStyle,
    /// Longest typedef/leafref chain followed before giving up
    pub max_type_depth: usize,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            required: RequiredPolicy::default(),
            choices: ChoiceStyle::default(),
            keys: KeyStyle::default(),
            max_type_depth: 32,
        }
    }
}

/// Counters collected while converting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub visited: usize,
    pub leaves: usize,
    pub skipped_deprecated: usize,
    pub skipped_non_config: usize,
    pub skipped_unsupported: usize,
}

/// Result of a conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub options: OptionsMap,
    pub stats: ConversionStats,
}

/// Walks a schema context and builds option documents
pub struct Converter<'a> {
    ctx: &'a SchemaContext,
    options: ConverterOptions,
    resolver: TypeResolver<'a>,
}

impl<'a> Converter<'a> {
    pub fn new(ctx: &'a SchemaContext, options: ConverterOptions) -> Self {
        let resolver = TypeResolver::new(ctx, options.max_type_depth);
        Self {
            ctx,
            options,
            resolver,
        }
    }

    /// Convert the whole data tree of a module
    ///
    /// Submodules convert their owning module.
    pub fn convert_module(&self, module_name: &str) -> Result<Conversion> {
        let module = self.lookup_module(module_name)?;
        let root = self.ctx.root_module_of(module);
        info!("Converting module {}", self.ctx.module(root).name);

        let mut stats = ConversionStats::default();
        let options = self.convert_children(&self.ctx.module(root).children, None, &mut stats)?;
        info!(
            "Converted {} nodes ({} leaves) into {} top-level options",
            stats.visited,
            stats.leaves,
            options.len()
        );
        Ok(Conversion { options, stats })
    }

    /// Convert the subtree below the node at `path`
    ///
    /// The result holds the options of the node's children; a leaf yields a
    /// single option for itself.
    pub fn convert_path(&self, module_name: &str, path: &str) -> Result<Conversion> {
        let module = self.lookup_module(module_name)?;
        let start = self
            .ctx
            .find_by_path(module, path)
            .ok_or_else(|| ConvertError::PathNotFound(path.to_string()))?;
        info!("Converting {} from {}", module_name, path);

        let node = self.ctx.node(start);
        let mut stats = ConversionStats::default();
        let options = if node.keyword.is_leafy() {
            let parent_module = self
                .ctx
                .data_parent(start)
                .map(|p| self.ctx.root_module_of(self.ctx.node(p).module));
            let mut out = OptionsMap::new();
            self.convert_node(start, parent_module, &mut out, &mut stats)?;
            out
        } else {
            let module = Some(self.ctx.root_module_of(node.module));
            self.convert_children(&node.children, module, &mut stats)?
        };
        Ok(Conversion { options, stats })
    }

    fn lookup_module(&self, module_name: &str) -> Result<ModuleId> {
        self.ctx
            .module_by_name(module_name)
            .ok_or_else(|| ConvertError::ModuleNotFound(module_name.to_string()))
    }

    /// `parent_module` is the owning module of the nearest data ancestor
    fn convert_children(
        &self,
        children: &[NodeId],
        parent_module: Option<ModuleId>,
        stats: &mut ConversionStats,
    ) -> Result<OptionsMap> {
        let mut out = OptionsMap::new();
        for child in children {
            self.convert_node(*child, parent_module, &mut out, stats)?;
        }
        Ok(out)
    }

    fn convert_node(
        &self,
        id: NodeId,
        parent_module: Option<ModuleId>,
        out: &mut OptionsMap,
        stats: &mut ConversionStats,
    ) -> Result<()> {
        stats.visited += 1;
        let node = self.ctx.node(id);

        if node.status.is_retired() {
            debug!("Skipping {:?} {}", node.status, self.ctx.node_path(id));
            stats.skipped_deprecated += 1;
            return Ok(());
        }
        if !node.config {
            debug!("Skipping non-config {}", self.ctx.node_path(id));
            stats.skipped_non_config += 1;
            return Ok(());
        }

        let module = Some(self.ctx.root_module_of(node.module));
        let entry = match &node.keyword {
            Keyword::Container => {
                let subs = self.convert_children(&node.children, module, stats)?;
                OptionsNode::new(OptionType::Dict, description(node)).with_suboptions(subs)
            }
            Keyword::List => {
                let subs = self.convert_children(&node.children, module, stats)?;
                OptionsNode::new(OptionType::List, description(node))
                    .with_elements(OptionType::Dict)
                    .with_suboptions(subs)
            }
            Keyword::Leaf => {
                let resolved = self.resolver.resolve_leaf(id)?;
                stats.leaves += 1;
                scalar_option(node, resolved).required(self.is_required(node))
            }
            Keyword::LeafList => {
                let resolved = self.resolver.resolve_leaf(id)?;
                stats.leaves += 1;
                let mut element = OptionsMap::new();
                element.insert(self.key_for(id, parent_module), scalar_option(node, resolved));
                OptionsNode::new(OptionType::List, description(node))
                    .with_elements(OptionType::Dict)
                    .with_suboptions(element)
            }
            Keyword::Choice if self.options.choices == ChoiceStyle::Enumerate => {
                let cases = node
                    .children
                    .iter()
                    .map(|c| self.ctx.node(*c))
                    .filter(|c| !c.status.is_retired() && c.config)
                    .map(|c| c.name.clone())
                    .collect();
                OptionsNode::new(OptionType::Str, description(node))
                    .with_choices(cases)
                    .required(self.is_required(node))
            }
            Keyword::Choice | Keyword::Case => {
                // Transparent: contents land in the parent's map
                for child in &node.children {
                    self.convert_node(*child, parent_module, out, stats)?;
                }
                return Ok(());
            }
            Keyword::Other(keyword) => {
                debug!("Skipping unsupported {} {}", keyword, self.ctx.node_path(id));
                stats.skipped_unsupported += 1;
                return Ok(());
            }
        };

        let key = self.key_for(id, parent_module);
        if out.insert(key.clone(), entry).is_some() {
            warn!("Option '{}' defined twice, keeping the later definition", key);
        }
        Ok(())
    }

    fn is_required(&self, node: &SchemaNode) -> bool {
        match self.options.required {
            RequiredPolicy::Mandatory => node.mandatory,
            RequiredPolicy::NoDefault => !node.has_default,
        }
    }

    fn key_for(&self, id: NodeId, parent_module: Option<ModuleId>) -> String {
        let node = self.ctx.node(id);
        match self.options.keys {
            KeyStyle::Local => option_key(&node.name),
            KeyStyle::Qualified => {
                let module = self.ctx.root_module_of(node.module);
                if parent_module == Some(module) {
                    node.name.clone()
                } else {
                    format!("{}:{}", self.ctx.module(module).name, node.name)
                }
            }
        }
    }
}

fn description(node: &SchemaNode) -> String {
    normalize_description(node.description.as_deref().unwrap_or_default())
}

fn scalar_option(node: &SchemaNode, resolved: ResolvedType) -> OptionsNode {
    let option = OptionsNode::new(resolved.option_type, description(node))
        .with_max_length(resolved.max_length);
    match resolved.choices {
        Some(choices) => option.with_choices(choices),
        None => option,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"{
        "modules": [
            {
                "name": "example-ntp",
                "prefix": "ntp",
                "children": [
                    {
                        "keyword": "container", "name": "ntp",
                        "description": "NTP\n   configuration: servers and peers",
                        "children": [
                            { "keyword": "leaf", "name": "enabled", "type": { "name": "boolean" }, "default": true },
                            {
                                "keyword": "list", "name": "server",
                                "children": [
                                    { "keyword": "leaf", "name": "address", "mandatory": true, "type": { "name": "string" } },
                                    { "keyword": "leaf-list", "name": "key-id", "type": { "name": "uint32" } },
                                    {
                                        "keyword": "choice", "name": "association",
                                        "children": [
                                            {
                                                "keyword": "case", "name": "unicast",
                                                "children": [
                                                    { "keyword": "leaf", "name": "prefer", "type": { "name": "boolean" } }
                                                ]
                                            },
                                            { "keyword": "leaf", "name": "broadcast", "type": { "name": "empty" } }
                                        ]
                                    }
                                ]
                            },
                            { "keyword": "action", "name": "sync" },
                            {
                                "keyword": "container", "name": "vendor-options", "module": "example-ntp-ext",
                                "children": [
                                    { "keyword": "leaf", "name": "burst", "type": { "name": "boolean" } }
                                ]
                            }
                        ]
                    }
                ]
            },
            { "name": "example-ntp-ext", "prefix": "ntpx" }
        ]
    }"#;

    fn convert(options: ConverterOptions) -> Conversion {
        let ctx = SchemaContext::from_json(SCHEMA).unwrap();
        Converter::new(&ctx, options)
            .convert_module("example-ntp")
            .unwrap()
    }

    #[test]
    fn test_default_conventions() {
        let conversion = convert(ConverterOptions::default());
        let ntp = &conversion.options["ntp"];

        assert_eq!(ntp.option_type, OptionType::Dict);
        assert_eq!(ntp.description, "NTP configuration; servers and peers");

        let server = ntp.suboption("server").unwrap();
        assert_eq!(server.option_type, OptionType::List);
        assert_eq!(server.elements, Some(OptionType::Dict));
        assert!(server.suboption("address").unwrap().required);
        // Both case branches are hoisted next to their siblings
        assert!(server.suboption("prefer").is_some());
        assert!(server.suboption("broadcast").is_some());
        assert!(server.suboption("association").is_none());

        assert!(!ntp.suboption("enabled").unwrap().required);
        assert!(ntp.suboption("vendor_options").is_some());
        assert!(ntp.suboption("sync").is_none());
    }

    #[test]
    fn test_leaf_list_wraps_element() {
        let conversion = convert(ConverterOptions::default());
        let key_id = conversion.options["ntp"]
            .suboption("server")
            .and_then(|s| s.suboption("key_id"))
            .unwrap();

        assert_eq!(key_id.option_type, OptionType::List);
        assert_eq!(key_id.elements, Some(OptionType::Dict));
        let element = key_id.suboption("key_id").unwrap();
        assert_eq!(element.option_type, OptionType::Int);
        assert!(!element.required);
    }

    #[test]
    fn test_no_default_policy() {
        let conversion = convert(ConverterOptions {
            required: RequiredPolicy::NoDefault,
            ..Default::default()
        });
        let ntp = &conversion.options["ntp"];

        assert!(!ntp.suboption("enabled").unwrap().required);
        let server = ntp.suboption("server").unwrap();
        assert!(server.suboption("prefer").unwrap().required);
    }

    #[test]
    fn test_enumerated_choice() {
        let conversion = convert(ConverterOptions {
            choices: ChoiceStyle::Enumerate,
            ..Default::default()
        });
        let server = conversion.options["ntp"].suboption("server").unwrap();
        let association = server.suboption("association").unwrap();

        assert_eq!(association.option_type, OptionType::Str);
        assert_eq!(
            association.choices,
            Some(vec!["unicast".to_string(), "broadcast".to_string()])
        );
        assert!(server.suboption("prefer").is_none());
    }

    #[test]
    fn test_qualified_keys() {
        let conversion = convert(ConverterOptions {
            keys: KeyStyle::Qualified,
            ..Default::default()
        });
        let ntp = &conversion.options["example-ntp:ntp"];

        assert!(ntp.suboption("server").is_some());
        assert!(ntp.suboption("example-ntp-ext:vendor-options").is_some());
        let vendor = ntp.suboption("example-ntp-ext:vendor-options").unwrap();
        assert!(vendor.suboption("burst").is_some());
    }

    #[test]
    fn test_stats() {
        let stats = convert(ConverterOptions::default()).stats;

        assert_eq!(stats.leaves, 6);
        assert_eq!(stats.skipped_unsupported, 1);
        assert_eq!(stats.skipped_deprecated, 0);
        // ntp, enabled, server, address, key-id, association, unicast,
        // prefer, broadcast, sync, vendor-options, burst
        assert_eq!(stats.visited, 12);
    }

    #[test]
    fn test_convert_path() {
        let ctx = SchemaContext::from_json(SCHEMA).unwrap();
        let converter = Converter::new(&ctx, ConverterOptions::default());

        let server = converter.convert_path("example-ntp", "/ntp/server").unwrap();
        let keys: Vec<_> = server.options.keys().cloned().collect();
        assert_eq!(keys, vec!["address", "broadcast", "key_id", "prefer"]);

        let leaf = converter
            .convert_path("example-ntp", "/ntp:ntp/server/prefer")
            .unwrap();
        assert_eq!(leaf.options.len(), 1);
        assert_eq!(leaf.options["prefer"].option_type, OptionType::Bool);

        assert!(matches!(
            converter.convert_path("example-ntp", "/ntp/peer"),
            Err(ConvertError::PathNotFound(_))
        ));
        assert!(matches!(
            converter.convert_module("example-missing"),
            Err(ConvertError::ModuleNotFound(_))
        ));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ConverterOptions =
            serde_json::from_str(r#"{ "choices": "enumerate", "keys": "qualified" }"#).unwrap();

        assert_eq!(options.choices, ChoiceStyle::Enumerate);
        assert_eq!(options.keys, KeyStyle::Qualified);
        assert_eq!(options.required, RequiredPolicy::Mandatory);
        assert_eq!(options.max_type_depth, 32);
    }
}
