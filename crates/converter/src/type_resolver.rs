//! Leaf type resolution down to the option type vocabulary

use crate::schema::{ModuleId, NodeId, SchemaContext, TypeSpec};
use crate::{ConvertError, OptionType, Result};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Target type of a leaf with its refinements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub option_type: OptionType,
    pub choices: Option<Vec<String>>,
    pub max_length: Option<u64>,
}

impl ResolvedType {
    fn scalar(option_type: OptionType) -> Self {
        Self {
            option_type,
            choices: None,
            max_length: None,
        }
    }

    fn with_choices(choices: Vec<String>) -> Self {
        Self {
            option_type: OptionType::Str,
            choices: Some(choices),
            max_length: None,
        }
    }
}

/// State carried along one resolution chain
#[derive(Debug, Clone, Default)]
struct Walk {
    depth: usize,
    typedefs: HashSet<(ModuleId, String)>,
    leafrefs: HashSet<NodeId>,
}

/// Resolves leaf types through typedefs, leafrefs, identities and unions
pub struct TypeResolver<'a> {
    ctx: &'a SchemaContext,
    max_depth: usize,
}

impl<'a> TypeResolver<'a> {
    pub fn new(ctx: &'a SchemaContext, max_depth: usize) -> Self {
        Self { ctx, max_depth }
    }

    /// Resolve the type of a leaf or leaf-list
    pub fn resolve_leaf(&self, leaf: NodeId) -> Result<ResolvedType> {
        let node = self.ctx.node(leaf);
        let type_spec = node
            .type_spec
            .as_ref()
            .ok_or_else(|| self.failure(leaf, "node has no type".to_string()))?;
        let mut walk = Walk::default();
        self.resolve(leaf, leaf, node.module, type_spec, &mut walk)
    }

    /// `origin` is the leaf being converted (for errors), `context` the node
    /// whose type is currently resolved (for relative leafref paths).
    fn resolve(
        &self,
        origin: NodeId,
        context: NodeId,
        scope: ModuleId,
        spec: &TypeSpec,
        walk: &mut Walk,
    ) -> Result<ResolvedType> {
        walk.depth += 1;
        if walk.depth > self.max_depth {
            return Err(self.failure(
                origin,
                format!(
                    "type chain deeper than {} levels at '{}'",
                    self.max_depth, spec.name
                ),
            ));
        }

        let mut resolved = match spec.name.as_str() {
            "string" | "binary" | "bits" | "instance-identifier" => {
                ResolvedType::scalar(OptionType::Str)
            }
            "boolean" | "empty" => ResolvedType::scalar(OptionType::Bool),
            "int8" | "int16" | "int32" | "int64" | "uint8" | "uint16" | "uint32" | "uint64" => {
                ResolvedType::scalar(OptionType::Int)
            }
            "decimal64" => ResolvedType::scalar(OptionType::Float),
            "enumeration" => ResolvedType::with_choices(spec.enums.clone()),
            "identityref" => self.resolve_identityref(origin, scope, spec)?,
            "leafref" => self.resolve_leafref(origin, context, spec, walk)?,
            "union" => self.resolve_union(origin, context, scope, spec, walk)?,
            _ => self.resolve_typedef(origin, context, scope, spec, walk)?,
        };

        // Restrictions nearer the leaf override those of the derived type
        if let Some(length) = &spec.length {
            resolved.max_length = upper_bound(length);
        }
        if spec.name != "enumeration" && !spec.enums.is_empty() {
            resolved.choices = Some(spec.enums.clone());
        }
        Ok(resolved)
    }

    fn resolve_typedef(
        &self,
        origin: NodeId,
        context: NodeId,
        scope: ModuleId,
        spec: &TypeSpec,
        walk: &mut Walk,
    ) -> Result<ResolvedType> {
        let Some((defined_in, typedef)) = self.ctx.find_typedef(scope, &spec.name) else {
            return Err(ConvertError::UnhandledType {
                type_name: spec.name.clone(),
                node: self.ctx.node_path(origin),
            });
        };

        if !walk
            .typedefs
            .insert((defined_in, typedef.name.clone()))
        {
            return Err(self.failure(
                origin,
                format!("typedef '{}' refers back to itself", spec.name),
            ));
        }
        debug!("Following typedef {} for {}", spec.name, self.ctx.node_path(origin));
        self.resolve(origin, context, defined_in, &typedef.type_spec, walk)
    }

    fn resolve_identityref(
        &self,
        origin: NodeId,
        scope: ModuleId,
        spec: &TypeSpec,
    ) -> Result<ResolvedType> {
        let base = spec
            .base
            .as_deref()
            .ok_or_else(|| self.failure(origin, "identityref without base".to_string()))?;
        let (defined_in, identity) = self.ctx.find_identity(scope, base).ok_or_else(|| {
            self.failure(origin, format!("base identity '{}' not found", base))
        })?;

        Ok(ResolvedType::with_choices(
            self.ctx.derived_identities(defined_in, &identity.name),
        ))
    }

    fn resolve_leafref(
        &self,
        origin: NodeId,
        context: NodeId,
        spec: &TypeSpec,
        walk: &mut Walk,
    ) -> Result<ResolvedType> {
        let path = spec.path.as_deref().unwrap_or_default();
        let target = self
            .ctx
            .resolve_leafref(context, path)
            .filter(|id| self.ctx.node(*id).keyword.is_leafy());

        let Some(target) = target else {
            warn!(
                "Leafref path '{}' of {} does not resolve, using str",
                path,
                self.ctx.node_path(origin)
            );
            return Ok(ResolvedType::scalar(OptionType::Str));
        };

        if !walk.leafrefs.insert(target) {
            return Err(self.failure(
                origin,
                format!("leafref '{}' loops back on itself", path),
            ));
        }

        let node = self.ctx.node(target);
        match &node.type_spec {
            Some(target_type) => self.resolve(origin, target, node.module, target_type, walk),
            None => Ok(ResolvedType::scalar(OptionType::Str)),
        }
    }

    fn resolve_union(
        &self,
        origin: NodeId,
        context: NodeId,
        scope: ModuleId,
        spec: &TypeSpec,
        walk: &Walk,
    ) -> Result<ResolvedType> {
        if spec.types.is_empty() {
            return Err(self.failure(origin, "union without member types".to_string()));
        }

        let members = spec
            .types
            .iter()
            .map(|member| self.resolve(origin, context, scope, member, &mut walk.clone()))
            .collect::<Result<Vec<_>>>()?;

        let first = members[0].option_type;
        if members.iter().any(|m| m.option_type != first) {
            return Ok(ResolvedType::scalar(OptionType::Str));
        }

        let choices = if members.iter().all(|m| m.choices.is_some()) {
            let mut merged: Vec<String> = Vec::new();
            for choice in members.iter().flat_map(|m| m.choices.iter().flatten()) {
                if !merged.contains(choice) {
                    merged.push(choice.clone());
                }
            }
            Some(merged)
        } else {
            None
        };

        Ok(ResolvedType {
            option_type: first,
            choices,
            max_length: None,
        })
    }

    fn failure(&self, node: NodeId, reason: String) -> ConvertError {
        ConvertError::TypeResolution {
            node: self.ctx.node_path(node),
            reason,
        }
    }
}

/// Upper bound of a `length` expression
///
/// The integer after the last `..` of the last range part; a single value is
/// its own bound and `max` has none.
pub fn upper_bound(length: &str) -> Option<u64> {
    let last = length.rsplit('|').next()?.trim();
    let bound = last.rsplit("..").next()?.trim();
    bound.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_bound() {
        assert_eq!(upper_bound("1..64"), Some(64));
        assert_eq!(upper_bound("1..10 | 20..max"), None);
        assert_eq!(upper_bound("0..4 | 10..253"), Some(253));
        assert_eq!(upper_bound("8"), Some(8));
        assert_eq!(upper_bound("min..max"), None);
    }

    fn leaf_in(schema: &str, path: &str) -> (SchemaContext, NodeId) {
        let ctx = SchemaContext::from_json(schema).unwrap();
        let module = ctx.module_by_name("m").unwrap();
        let leaf = ctx.find_by_path(module, path).unwrap();
        (ctx, leaf)
    }

    #[test]
    fn test_outer_length_wins() {
        let schema = r#"{ "modules": [ {
            "name": "m", "prefix": "m",
            "typedefs": [
                { "name": "short", "type": { "name": "string", "length": "1..32" } }
            ],
            "children": [
                { "keyword": "leaf", "name": "a", "type": { "name": "short" } },
                { "keyword": "leaf", "name": "b", "type": { "name": "short", "length": "1..8" } }
            ]
        } ] }"#;
        let (ctx, a) = leaf_in(schema, "/a");
        let b = ctx.find_by_path(ctx.module_by_name("m").unwrap(), "/b").unwrap();
        let resolver = TypeResolver::new(&ctx, 32);

        assert_eq!(resolver.resolve_leaf(a).unwrap().max_length, Some(32));
        assert_eq!(resolver.resolve_leaf(b).unwrap().max_length, Some(8));
    }

    #[test]
    fn test_union_of_mixed_members_is_str() {
        let schema = r#"{ "modules": [ {
            "name": "m", "prefix": "m",
            "children": [
                { "keyword": "leaf", "name": "mixed", "type": { "name": "union", "types": [
                    { "name": "uint32" }, { "name": "string" }
                ] } },
                { "keyword": "leaf", "name": "ints", "type": { "name": "union", "types": [
                    { "name": "uint8" }, { "name": "int64" }
                ] } },
                { "keyword": "leaf", "name": "modes", "type": { "name": "union", "types": [
                    { "name": "enumeration", "enums": ["auto", "manual"] },
                    { "name": "enumeration", "enums": ["manual", "off"] }
                ] } }
            ]
        } ] }"#;
        let (ctx, mixed) = leaf_in(schema, "/mixed");
        let module = ctx.module_by_name("m").unwrap();
        let resolver = TypeResolver::new(&ctx, 32);

        assert_eq!(
            resolver.resolve_leaf(mixed).unwrap(),
            ResolvedType::scalar(OptionType::Str)
        );
        let ints = ctx.find_by_path(module, "/ints").unwrap();
        assert_eq!(resolver.resolve_leaf(ints).unwrap().option_type, OptionType::Int);
        let modes = ctx.find_by_path(module, "/modes").unwrap();
        assert_eq!(
            resolver.resolve_leaf(modes).unwrap().choices,
            Some(vec!["auto".to_string(), "manual".to_string(), "off".to_string()])
        );
    }

    #[test]
    fn test_leafref_cycle_terminates() {
        let schema = r#"{ "modules": [ {
            "name": "m", "prefix": "m",
            "children": [
                { "keyword": "leaf", "name": "a", "type": { "name": "leafref", "path": "../b" } },
                { "keyword": "leaf", "name": "b", "type": { "name": "leafref", "path": "../a" } }
            ]
        } ] }"#;
        let (ctx, a) = leaf_in(schema, "/a");
        let err = TypeResolver::new(&ctx, 32).resolve_leaf(a).unwrap_err();

        assert!(matches!(err, ConvertError::TypeResolution { .. }));
    }

    #[test]
    fn test_missing_identity_base() {
        let schema = r#"{ "modules": [ {
            "name": "m", "prefix": "m",
            "children": [
                { "keyword": "leaf", "name": "kind", "type": { "name": "identityref", "base": "nowhere" } }
            ]
        } ] }"#;
        let (ctx, kind) = leaf_in(schema, "/kind");
        let err = TypeResolver::new(&ctx, 32).resolve_leaf(kind).unwrap_err();

        assert!(err.to_string().contains("nowhere"));
    }
}
