//! Rendering option documents and embedding them into module descriptors
//!
//! A module descriptor is a YAML mapping whose `DOCUMENTATION` key holds the
//! module documentation as a YAML string. Generated options land under
//! `options.config` of that inner document.

use crate::{DocgenError, OptionsMap, Result};
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::Path;

const DOCUMENTATION_KEY: &str = "DOCUMENTATION";

/// Render an options map as YAML
pub fn render_options(options: &OptionsMap) -> Result<String> {
    Ok(serde_yaml::to_string(options)?)
}

/// Load and deserialize a YAML file
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| {
        DocgenError::Document(format!("Failed to read {}: {}", path.display(), e))
    })?;

    serde_yaml::from_str(&content).map_err(|e| {
        DocgenError::Document(format!("Failed to parse YAML from {}: {}", path.display(), e))
    })
}

/// Select a value by dotted key path (`interfaces.config`)
///
/// An empty path selects the whole document.
pub fn select_path<'a>(value: &'a Value, path: &str) -> Result<&'a Value> {
    let mut current = value;
    for key in path.split('.').filter(|k| !k.is_empty()) {
        current = current.get(key).ok_or_else(|| {
            DocgenError::Document(format!("Key '{}' not found in '{}'", key, path))
        })?;
    }
    Ok(current)
}

/// Replace `options.config` inside the descriptor's `DOCUMENTATION` string
///
/// Returns the descriptor re-serialized as YAML. The rest of the descriptor
/// and of the documentation is left as found.
pub fn embed_config(descriptor: &str, config: &Value) -> Result<String> {
    let mut root: Value = serde_yaml::from_str(descriptor)?;
    let root_map = root
        .as_mapping_mut()
        .ok_or_else(|| DocgenError::Document("Module descriptor is not a mapping".to_string()))?;

    let documentation = root_map
        .get(DOCUMENTATION_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            DocgenError::Document(format!("Missing '{}' string in descriptor", DOCUMENTATION_KEY))
        })?;

    let mut doc: Value = serde_yaml::from_str(documentation)?;
    let doc_map = doc
        .as_mapping_mut()
        .ok_or_else(|| DocgenError::Document("DOCUMENTATION is not a mapping".to_string()))?;

    let options = doc_map
        .entry(Value::from("options"))
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    let options = options.as_mapping_mut().ok_or_else(|| {
        DocgenError::Document("DOCUMENTATION.options is not a mapping".to_string())
    })?;
    options.insert(Value::from("config"), config.clone());

    let rendered = serde_yaml::to_string(&doc)?;
    root_map.insert(Value::from(DOCUMENTATION_KEY), Value::String(rendered));

    Ok(serde_yaml::to_string(&root)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OptionType, OptionsNode};

    const DESCRIPTOR: &str = r#"
DOCUMENTATION: |
  module: myos_interfaces
  short_description: Manage interfaces
  options:
    state:
      type: str
      choices: [merged, deleted]
EXAMPLES: "- myos_interfaces: {}"
"#;

    #[test]
    fn test_embed_config_keeps_siblings() {
        let mut options = OptionsMap::new();
        options.insert(
            "mtu".to_string(),
            OptionsNode::new(OptionType::Int, "Maximum transmission unit"),
        );
        let config = serde_yaml::to_value(&options).unwrap();

        let result = embed_config(DESCRIPTOR, &config).unwrap();
        let root: Value = serde_yaml::from_str(&result).unwrap();
        assert!(root.get("EXAMPLES").is_some());

        let doc: Value = serde_yaml::from_str(root["DOCUMENTATION"].as_str().unwrap()).unwrap();
        assert_eq!(doc["module"].as_str(), Some("myos_interfaces"));
        assert!(doc["options"].get("state").is_some());
        assert_eq!(doc["options"]["config"]["mtu"]["type"].as_str(), Some("int"));
    }

    #[test]
    fn test_embed_config_requires_documentation() {
        let result = embed_config("EXAMPLES: x\n", &Value::Null);
        assert!(matches!(result, Err(DocgenError::Document(_))));
    }

    #[test]
    fn test_select_path() {
        let value: Value = serde_yaml::from_str("a:\n  b:\n    c: 1\n").unwrap();
        assert_eq!(select_path(&value, "a.b.c").unwrap().as_u64(), Some(1));
        assert_eq!(select_path(&value, "").unwrap(), &value);
        assert!(select_path(&value, "a.x").is_err());
    }

    #[test]
    fn test_load_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.yml");
        fs::write(&path, "mtu:\n  type: int\n  description: MTU\n").unwrap();

        let options: OptionsMap = load_yaml(&path).unwrap();
        assert_eq!(options["mtu"].option_type, OptionType::Int);
        assert!(!options["mtu"].required);
    }
}
