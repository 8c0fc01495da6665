//! Arena-backed schema context with module and node lookups

use super::types::{Keyword, ModuleSpec, NodeSpec, SchemaDocument, Status, TypeSpec};
use crate::{ConvertError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

/// Index of a module in the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub usize);

/// Index of a schema node in the context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone)]
pub struct Typedef {
    pub name: String,
    pub type_spec: TypeSpec,
}

#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub bases: Vec<String>,
}

/// A module or submodule
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub prefix: String,
    pub belongs_to: Option<ModuleId>,
    pub imports: BTreeMap<String, String>,
    pub typedefs: Vec<Typedef>,
    pub identities: Vec<Identity>,
    /// Top-level nodes; empty for submodules, whose nodes live in the owner
    pub children: Vec<NodeId>,
}

/// A node of the schema tree with its effective properties
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub keyword: Keyword,
    pub name: String,
    pub description: Option<String>,
    /// Effective config flag after inheritance
    pub config: bool,
    pub status: Status,
    pub mandatory: bool,
    pub has_default: bool,
    pub type_spec: Option<TypeSpec>,
    /// Module that defined the node
    pub module: ModuleId,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// All modules of a schema document, linked and validated
#[derive(Debug, Clone, Default)]
pub struct SchemaContext {
    modules: Vec<Module>,
    nodes: Vec<SchemaNode>,
    by_name: HashMap<String, ModuleId>,
}

impl SchemaContext {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let document: SchemaDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Link a parsed document into a context
    ///
    /// Fails with `InvalidSchema` on duplicate module names, a `belongs_to`
    /// or node `module` naming an unknown module, and leaves without a type.
    pub fn from_document(document: SchemaDocument) -> Result<Self> {
        let mut ctx = SchemaContext::default();

        for spec in &document.modules {
            if ctx.by_name.contains_key(&spec.name) {
                return Err(ConvertError::InvalidSchema(format!(
                    "duplicate module '{}'",
                    spec.name
                )));
            }
            let id = ModuleId(ctx.modules.len());
            ctx.by_name.insert(spec.name.clone(), id);
            ctx.modules.push(Module {
                name: spec.name.clone(),
                prefix: spec.prefix.clone(),
                belongs_to: None,
                imports: spec.imports.clone(),
                typedefs: spec
                    .typedefs
                    .iter()
                    .map(|t| Typedef {
                        name: t.name.clone(),
                        type_spec: t.type_spec.clone(),
                    })
                    .collect(),
                identities: spec
                    .identities
                    .iter()
                    .map(|i| Identity {
                        name: i.name.clone(),
                        bases: i.bases.clone(),
                    })
                    .collect(),
                children: Vec::new(),
            });
        }

        for (index, spec) in document.modules.iter().enumerate() {
            if let Some(owner) = &spec.belongs_to {
                let owner_id = ctx.lookup_module(owner, &spec.name)?;
                if owner_id.0 == index {
                    return Err(ConvertError::InvalidSchema(format!(
                        "module '{}' belongs to itself",
                        spec.name
                    )));
                }
                ctx.modules[index].belongs_to = Some(owner_id);
            }
        }

        for (index, spec) in document.modules.iter().enumerate() {
            ctx.attach_module_tree(ModuleId(index), spec)?;
        }

        Ok(ctx)
    }

    fn attach_module_tree(&mut self, module: ModuleId, spec: &ModuleSpec) -> Result<()> {
        let owner = self.root_module_of(module);
        for child in &spec.children {
            let id = self.add_node(child, module, None, true)?;
            self.modules[owner.0].children.push(id);
        }
        Ok(())
    }

    fn add_node(
        &mut self,
        spec: &NodeSpec,
        inherited_module: ModuleId,
        parent: Option<NodeId>,
        parent_config: bool,
    ) -> Result<NodeId> {
        let module = match &spec.module {
            Some(name) => self.lookup_module(name, &spec.name)?,
            None => inherited_module,
        };
        let keyword = Keyword::from(spec.keyword.as_str());
        if keyword.is_leafy() && spec.type_spec.is_none() {
            return Err(ConvertError::InvalidSchema(format!(
                "{} '{}' has no type",
                keyword, spec.name
            )));
        }

        let config = parent_config && spec.config.unwrap_or(true);
        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            keyword,
            name: spec.name.clone(),
            description: spec.description.clone(),
            config,
            status: spec.status,
            mandatory: spec.mandatory,
            has_default: spec.default.is_some(),
            type_spec: spec.type_spec.clone(),
            module,
            parent,
            children: Vec::new(),
        });

        for child in &spec.children {
            let child_id = self.add_node(child, module, Some(id), config)?;
            self.nodes[id.0].children.push(child_id);
        }
        Ok(id)
    }

    fn lookup_module(&self, name: &str, referrer: &str) -> Result<ModuleId> {
        self.by_name.get(name).copied().ok_or_else(|| {
            ConvertError::InvalidSchema(format!(
                "'{}' refers to unknown module '{}'",
                referrer, name
            ))
        })
    }

    pub fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.0]
    }

    pub fn module_by_name(&self, name: &str) -> Option<ModuleId> {
        self.by_name.get(name).copied()
    }

    pub fn modules(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.modules.iter().enumerate().map(|(i, m)| (ModuleId(i), m))
    }

    /// The module a submodule ultimately belongs to (itself for modules)
    pub fn root_module_of(&self, id: ModuleId) -> ModuleId {
        let mut current = id;
        // A belongs-to cycle cannot be longer than the module list
        for _ in 0..self.modules.len() {
            match self.modules[current.0].belongs_to {
                Some(owner) => current = owner,
                None => break,
            }
        }
        current
    }

    /// A module together with all submodules that belong to it
    fn module_family(&self, root: ModuleId) -> impl Iterator<Item = ModuleId> + '_ {
        (0..self.modules.len())
            .map(ModuleId)
            .filter(move |id| self.root_module_of(*id) == root)
    }

    /// Resolve a prefix as seen from `from`
    ///
    /// Own prefix first, then the imports of the module and of its owner,
    /// then any top-level module declaring that prefix.
    pub fn module_by_prefix(&self, from: ModuleId, prefix: &str) -> Option<ModuleId> {
        let root = self.root_module_of(from);
        if self.modules[from.0].prefix == prefix || self.modules[root.0].prefix == prefix {
            return Some(root);
        }
        for scope in [from, root] {
            if let Some(name) = self.modules[scope.0].imports.get(prefix) {
                if let Some(id) = self.module_by_name(name) {
                    return Some(self.root_module_of(id));
                }
            }
        }
        self.modules()
            .find(|(_, m)| m.belongs_to.is_none() && m.prefix == prefix)
            .map(|(id, _)| id)
    }

    /// Find a typedef by (possibly prefixed) name
    ///
    /// Returns the module that declares it, which is the scope for resolving
    /// the typedef's own type.
    pub fn find_typedef(&self, scope: ModuleId, qualified: &str) -> Option<(ModuleId, &Typedef)> {
        let target = self.target_module(scope, qualified)?;
        let name = local_name(qualified);
        self.module_family(target).find_map(|id| {
            self.modules[id.0]
                .typedefs
                .iter()
                .find(|t| t.name == name)
                .map(|t| (id, t))
        })
    }

    /// Find an identity by (possibly prefixed) name
    pub fn find_identity(&self, scope: ModuleId, qualified: &str) -> Option<(ModuleId, &Identity)> {
        let target = self.target_module(scope, qualified)?;
        let name = local_name(qualified);
        self.module_family(target).find_map(|id| {
            self.modules[id.0]
                .identities
                .iter()
                .find(|i| i.name == name)
                .map(|i| (id, i))
        })
    }

    fn target_module(&self, scope: ModuleId, qualified: &str) -> Option<ModuleId> {
        match qualified.split_once(':') {
            Some((prefix, _)) => self.module_by_prefix(scope, prefix),
            None => Some(self.root_module_of(scope)),
        }
    }

    /// Identities transitively derived from `base`, in declaration order
    ///
    /// Only the base's defining module and its submodules are searched. The
    /// base itself is never included, even through a cyclic derivation.
    pub fn derived_identities(&self, base_module: ModuleId, base_name: &str) -> Vec<String> {
        let root = self.root_module_of(base_module);
        let candidates: Vec<(ModuleId, &Identity)> = self
            .module_family(root)
            .flat_map(|id| self.modules[id.0].identities.iter().map(move |i| (id, i)))
            .collect();

        let mut derived: HashSet<&str> = HashSet::new();
        loop {
            let mut grew = false;
            for (module, identity) in &candidates {
                if identity.name == base_name || derived.contains(identity.name.as_str()) {
                    continue;
                }
                let derives = identity.bases.iter().any(|b| {
                    self.target_module(*module, b) == Some(root)
                        && (local_name(b) == base_name || derived.contains(local_name(b)))
                });
                if derives {
                    derived.insert(identity.name.as_str());
                    grew = true;
                }
            }
            if !grew {
                break;
            }
        }

        candidates
            .iter()
            .filter(|(_, i)| derived.contains(i.name.as_str()))
            .map(|(_, i)| i.name.clone())
            .collect()
    }

    /// Nearest ancestor that is a data node (choice and case are skipped)
    pub fn data_parent(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            if !self.nodes[parent.0].keyword.is_schema_only() {
                return Some(parent);
            }
            current = self.nodes[parent.0].parent;
        }
        None
    }

    /// Find a child by name, looking through choice and case nodes
    fn find_child(&self, children: &[NodeId], name: &str) -> Option<NodeId> {
        if let Some(id) = children.iter().find(|c| self.nodes[c.0].name == name) {
            return Some(*id);
        }
        children
            .iter()
            .filter(|c| self.nodes[c.0].keyword.is_schema_only())
            .find_map(|c| self.find_child(&self.nodes[c.0].children, name))
    }

    /// Locate a node by data path (`/a/b/c`) under a module
    ///
    /// Prefixes and list predicates in the path are ignored.
    pub fn find_by_path(&self, module: ModuleId, path: &str) -> Option<NodeId> {
        let mut children = &self.modules[self.root_module_of(module).0].children;
        let mut found = None;
        for segment in path_segments(path) {
            let id = self.find_child(children, segment)?;
            children = &self.nodes[id.0].children;
            found = Some(id);
        }
        found
    }

    /// Resolve a leafref `path` relative to the node that carries it
    pub fn resolve_leafref(&self, from: NodeId, path: &str) -> Option<NodeId> {
        let stripped = strip_predicates(path);
        let trimmed = stripped.trim();
        let origin_module = self.nodes[from.0].module;

        if let Some(absolute) = trimmed.strip_prefix('/') {
            let first = absolute.split('/').find(|s| !s.is_empty())?;
            let module = match first.split_once(':') {
                Some((prefix, _)) => self.module_by_prefix(origin_module, prefix)?,
                None => self.root_module_of(origin_module),
            };
            return self.find_by_path(module, absolute);
        }

        // None stands for the module's top level
        let mut cursor = Some(from);
        for segment in trimmed.split('/').filter(|s| !s.is_empty()) {
            match segment {
                "." => {}
                ".." => cursor = self.data_parent(cursor?),
                name => {
                    let name = local_name(name);
                    let children = match cursor {
                        Some(id) => &self.nodes[id.0].children,
                        None => &self.modules[self.root_module_of(origin_module).0].children,
                    };
                    cursor = Some(self.find_child(children, name)?);
                }
            }
        }
        cursor
    }

    /// `module:name` of a node, using the node's owning module
    pub fn qualified_name(&self, id: NodeId) -> String {
        let node = &self.nodes[id.0];
        let module = self.root_module_of(node.module);
        format!("{}:{}", self.modules[module.0].name, node.name)
    }

    /// Schema path of a node for diagnostics
    pub fn node_path(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            match self.nodes[node.0].parent {
                Some(_) => names.push(self.nodes[node.0].name.clone()),
                None => names.push(self.qualified_name(node)),
            }
            current = self.nodes[node.0].parent;
        }
        names.reverse();
        format!("/{}", names.join("/"))
    }
}

/// Name without its prefix
pub(crate) fn local_name(qualified: &str) -> &str {
    qualified
        .split_once(':')
        .map(|(_, name)| name)
        .unwrap_or(qualified)
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty()).map(local_name)
}

fn strip_predicates(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for ch in path.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}
