//! Option-document model
//!
//! An options document is a map of option keys to [`OptionsNode`]s, each of
//! which may nest further options under `suboptions`. Field order in the
//! serialized form is fixed: description, type, required, elements, choices,
//! max_length, suboptions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Options keyed by option name
pub type OptionsMap = BTreeMap<String, OptionsNode>;

/// Target type vocabulary of the option document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Str,
    Int,
    Float,
    Bool,
    Dict,
    List,
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OptionType::Str => "str",
            OptionType::Int => "int",
            OptionType::Float => "float",
            OptionType::Bool => "bool",
            OptionType::Dict => "dict",
            OptionType::List => "list",
        };
        f.write_str(name)
    }
}

/// One entry of an options document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionsNode {
    #[serde(default)]
    pub description: String,

    #[serde(rename = "type")]
    pub option_type: OptionType,

    #[serde(default)]
    pub required: bool,

    /// Element type of a list (always `dict` for generated lists)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elements: Option<OptionType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suboptions: Option<OptionsMap>,
}

impl OptionsNode {
    /// Create a node with no refinements
    pub fn new(option_type: OptionType, description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            option_type,
            required: false,
            elements: None,
            choices: None,
            max_length: None,
            suboptions: None,
        }
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn with_elements(mut self, elements: OptionType) -> Self {
        self.elements = Some(elements);
        self
    }

    pub fn with_choices(mut self, choices: Vec<String>) -> Self {
        self.choices = Some(choices);
        self
    }

    pub fn with_max_length(mut self, max_length: Option<u64>) -> Self {
        self.max_length = max_length;
        self
    }

    /// Attach suboptions; an empty map leaves `suboptions` unset
    pub fn with_suboptions(mut self, suboptions: OptionsMap) -> Self {
        self.suboptions = if suboptions.is_empty() {
            None
        } else {
            Some(suboptions)
        };
        self
    }

    /// Look up a direct suboption by key
    pub fn suboption(&self, key: &str) -> Option<&OptionsNode> {
        self.suboptions.as_ref().and_then(|subs| subs.get(key))
    }
}
