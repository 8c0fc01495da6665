//! Integration tests for module conversion and option document rendering

use yang_docgen_common::documentation::render_options;
use yang_docgen_converter::{
    convert_file, ChoiceStyle, Converter, ConverterOptions, OptionType, SchemaContext,
};

const INTERFACES: &str = r#"{
    "modules": [
        {
            "name": "example-interfaces",
            "prefix": "if",
            "imports": { "ianaift": "example-iana-if-type" },
            "typedefs": [
                { "name": "interface-ref", "type": { "name": "leafref", "path": "/if:interfaces/if:interface/if:name" } }
            ],
            "identities": [ { "name": "interface-type" } ],
            "children": [
                {
                    "keyword": "container",
                    "name": "interfaces",
                    "description": "Interface parameters.",
                    "children": [
                        {
                            "keyword": "list",
                            "name": "interface",
                            "description": "The list of interfaces on the device:\n  configured and learned.",
                            "children": [
                                { "keyword": "leaf", "name": "name", "mandatory": true, "type": { "name": "string", "length": "1..64" } },
                                { "keyword": "leaf", "name": "description", "type": { "name": "string" } },
                                { "keyword": "leaf", "name": "type", "mandatory": true, "type": { "name": "identityref", "base": "interface-type" } },
                                { "keyword": "leaf", "name": "enabled", "default": true, "type": { "name": "boolean" } },
                                { "keyword": "leaf", "name": "link-up-down-trap-enable", "status": "deprecated", "type": { "name": "enumeration", "enums": ["enabled", "disabled"] } },
                                { "keyword": "leaf", "name": "admin-status", "config": false, "type": { "name": "enumeration", "enums": ["up", "down", "testing"] } },
                                {
                                    "keyword": "container", "name": "statistics", "config": false,
                                    "children": [
                                        { "keyword": "leaf", "name": "in-octets", "type": { "name": "uint64" } }
                                    ]
                                },
                                { "keyword": "leaf-list", "name": "higher-layer-if", "type": { "name": "interface-ref" } },
                                { "keyword": "notification", "name": "link-flap" }
                            ]
                        }
                    ]
                }
            ]
        },
        {
            "name": "example-iana-if-type",
            "prefix": "ianaift",
            "imports": { "if": "example-interfaces" },
            "identities": [
                { "name": "iana-interface-type", "bases": ["if:interface-type"] },
                { "name": "ethernetCsmacd", "bases": ["iana-interface-type"] }
            ]
        }
    ]
}"#;

#[test]
fn test_config_only_filtering() {
    let ctx = SchemaContext::from_json(INTERFACES).unwrap();
    let conversion = Converter::new(&ctx, ConverterOptions::default())
        .convert_module("example-interfaces")
        .unwrap();

    let interface = conversion.options["interfaces"]
        .suboption("interface")
        .unwrap();
    assert!(interface.suboption("admin_status").is_none());
    assert!(interface.suboption("statistics").is_none());
    assert!(interface.suboption("enabled").is_some());
    // statistics is skipped with its subtree, so in-octets is never visited
    assert_eq!(conversion.stats.skipped_non_config, 2);
    assert_eq!(conversion.stats.skipped_unsupported, 1);
}

#[test]
fn test_deprecated_leaf_skipped_siblings_kept() {
    let ctx = SchemaContext::from_json(INTERFACES).unwrap();
    let conversion = Converter::new(&ctx, ConverterOptions::default())
        .convert_module("example-interfaces")
        .unwrap();

    let interface = conversion.options["interfaces"]
        .suboption("interface")
        .unwrap();
    assert!(interface.suboption("link_up_down_trap_enable").is_none());
    assert_eq!(conversion.stats.skipped_deprecated, 1);

    let keys: Vec<_> = interface
        .suboptions
        .as_ref()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(
        keys,
        vec!["description", "enabled", "higher_layer_if", "name", "type"]
    );
}

#[test]
fn test_interface_options() {
    let ctx = SchemaContext::from_json(INTERFACES).unwrap();
    let conversion = Converter::new(&ctx, ConverterOptions::default())
        .convert_module("example-interfaces")
        .unwrap();
    let interface = conversion.options["interfaces"]
        .suboption("interface")
        .unwrap();

    assert_eq!(
        interface.description,
        "The list of interfaces on the device; configured and learned."
    );

    let name = interface.suboption("name").unwrap();
    assert!(name.required);
    assert_eq!(name.max_length, Some(64));

    // Identities derived in another module are outside the base's module
    let kind = interface.suboption("type").unwrap();
    assert_eq!(kind.option_type, OptionType::Str);
    assert_eq!(kind.choices, Some(vec![]));

    let higher = interface.suboption("higher_layer_if").unwrap();
    assert_eq!(higher.option_type, OptionType::List);
    let element = higher.suboption("higher_layer_if").unwrap();
    assert_eq!(element.option_type, OptionType::Str);
    assert_eq!(element.max_length, Some(64));
}

#[test]
fn test_rendered_document() {
    let ctx = SchemaContext::from_json(INTERFACES).unwrap();
    let conversion = Converter::new(
        &ctx,
        ConverterOptions {
            choices: ChoiceStyle::Enumerate,
            ..Default::default()
        },
    )
    .convert_path("example-interfaces", "/interfaces/interface")
    .unwrap();

    let yaml = render_options(&conversion.options).unwrap();
    let reparsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(reparsed["name"]["type"], "str");
    assert_eq!(reparsed["name"]["required"], true);
    assert_eq!(reparsed["name"]["max_length"], 64);
    assert_eq!(reparsed["enabled"]["type"], "bool");
    assert_eq!(reparsed["higher_layer_if"]["elements"], "dict");
    assert!(reparsed["enabled"].get("choices").is_none());
}

#[test]
fn test_convert_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("interfaces.json");
    std::fs::write(&path, INTERFACES).unwrap();

    let conversion =
        convert_file(&path, "example-interfaces", ConverterOptions::default()).unwrap();
    assert_eq!(conversion.options.len(), 1);
    assert!(conversion.stats.leaves >= 5);
}
