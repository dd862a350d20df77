use schema_split::api::{label_schema, render};
use schema_split::config::{CircularConfig, CircularSite};
use schema_split::error::{
    DereferenceError, LedgerError, ParseError, ResolveError, SplitError, StructureError,
};
use schema_split::splitter::Fragment;
use schema_split::{Config, Ledger};

fn minimal_config() -> Config {
    Config {
        circular: CircularConfig {
            sites: vec![],
            ..Default::default()
        },
        definitions: vec![],
        ..Config::default()
    }
}

#[test]
fn test_invalid_json_is_a_parse_error() {
    let result = label_schema("{ \"properties\": { ", "broken.json", &Config::default());
    assert!(
        matches!(result, Err(SplitError::Parse(ParseError::InvalidJson { .. }))),
        "Expected a parse error, got {:?}",
        result.err()
    );
}

#[test]
fn test_missing_circular_site_is_a_structure_error() {
    let source = r#"{ "properties": { "a": { "type": "string" } } }"#;
    let result = label_schema(source, "schema.json", &Config::default());
    match result {
        Err(SplitError::Structure(StructureError::MissingPath { path })) => {
            assert_eq!(path, "definitions.entryGroup.properties.children.items.oneOf");
        }
        other => panic!("Expected a missing path error, got {other:?}"),
    }
}

#[test]
fn test_alternative_out_of_range() {
    let source = r#"{
        "properties": {},
        "definitions": { "g": { "oneOf": [ { "type": "string" } ] } }
    }"#;
    let config = Config {
        circular: CircularConfig {
            sites: vec![CircularSite {
                path: "definitions.g.oneOf".to_string(),
                remove: 3,
            }],
            ..Default::default()
        },
        ..minimal_config()
    };
    let result = label_schema(source, "schema.json", &config);
    assert!(matches!(
        result,
        Err(SplitError::Structure(StructureError::MissingAlternative {
            index: 3,
            len: 1,
            ..
        }))
    ));
}

#[test]
fn test_unresolved_reference() {
    let source = r##"{
        "properties": { "a": { "$ref": "#/definitions/nowhere" } },
        "definitions": {}
    }"##;
    let result = label_schema(source, "schema.json", &minimal_config());
    match result {
        Err(SplitError::Dereference(DereferenceError::Unresolved { reference })) => {
            assert_eq!(reference, "#/definitions/nowhere");
        }
        other => panic!("Expected an unresolved reference, got {other:?}"),
    }
}

#[test]
fn test_remote_reference_is_rejected() {
    let source = r#"{
        "properties": { "a": { "$ref": "http://example.com/a.json" } },
        "definitions": {}
    }"#;
    let result = label_schema(source, "schema.json", &minimal_config());
    assert!(matches!(
        result,
        Err(SplitError::Dereference(DereferenceError::External { .. }))
    ));
}

#[test]
fn test_unneutralized_cycle_is_reported() {
    let source = r##"{
        "properties": { "g": { "$ref": "#/definitions/g" } },
        "definitions": { "g": { "properties": { "child": { "$ref": "#/definitions/g" } } } }
    }"##;
    let result = label_schema(source, "schema.json", &minimal_config());
    match result {
        Err(SplitError::Dereference(DereferenceError::Circular { chain })) => {
            assert!(chain.contains("#/definitions/g"), "Chain was: {chain}");
        }
        other => panic!("Expected a circular reference error, got {other:?}"),
    }
}

#[test]
fn test_missing_bundled_definition() {
    let source = r#"{ "properties": { "a": { "type": "string" } }, "definitions": {} }"#;
    let config = Config {
        definitions: vec!["entry".to_string()],
        ..minimal_config()
    };
    let labeled = label_schema(source, "schema.json", &config).unwrap();
    let result = labeled.fragments(&config);
    assert!(matches!(
        result,
        Err(StructureError::MissingDefinition { ref name }) if name == "entry"
    ));
}

#[test]
fn test_property_named_definitions_is_rejected() {
    let source = r#"{
        "properties": { "definitions": { "properties": { "entry": { "description": "Top" } } } },
        "definitions": { "entry": { "description": "Shared" } }
    }"#;
    let result = label_schema(source, "schema.json", &minimal_config());
    match result {
        Err(SplitError::Structure(StructureError::FragmentCollision { name })) => {
            assert_eq!(name, "definitions");
        }
        other => panic!("Expected a name collision, got {other:?}"),
    }

    let config = Config {
        label_definitions: false,
        ..minimal_config()
    };
    assert!(label_schema(source, "schema.json", &config).is_ok());
}

#[test]
fn test_missing_ledger_row_fails_resolution() {
    let ledger = Ledger::new(vec!["en".to_string(), "fr".to_string()]).unwrap();
    let fragments = vec![Fragment {
        name: "layer".to_string(),
        text: r#"{"title":"layer.title","enum":["layer.enum.A"]}"#.to_string(),
    }];
    let report = render(&fragments, &ledger, false);
    assert!(report.artifacts.is_empty());
    assert_eq!(report.failures.len(), 2);
    match &report.failures[0].error {
        ResolveError::Completeness { language, labels } => {
            assert_eq!(language, "en");
            assert_eq!(labels, &vec!["layer.title".to_string(), "layer.enum.A".to_string()]);
        }
        other => panic!("Expected a completeness error, got {other:?}"),
    }
}

#[test]
fn test_ledger_with_wrong_language_count() {
    let csv = ",layer.title,[en],0,[fr],0\n";
    let result = Ledger::from_csv(csv, vec!["en".to_string()]);
    assert!(
        matches!(
            result,
            Err(LedgerError::MalformedRow {
                expected: 4,
                found: 6,
                ..
            })
        ),
        "Expected a malformed row, got {:?}",
        result.err()
    );
}

#[test]
fn test_ledger_with_bad_flag() {
    let csv = ",layer.title,Layer,yes,[fr],0\n";
    let result = Ledger::from_csv(csv, vec!["en".to_string(), "fr".to_string()]);
    assert!(matches!(result, Err(LedgerError::InvalidFlag { .. })));
}
