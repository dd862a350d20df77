//! Splits a labeled schema into independently emitted fragments.

use crate::config::Config;
use crate::error::StructureError;
use serde_json::{Map, Value};

/// Name of the fragment holding the schema's top-level fields.
pub const HEADER: &str = "header";

/// One named, serialized section of the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub name: String,
    pub text: String,
}

impl Fragment {
    pub fn new(name: impl Into<String>, value: &Value, pretty: bool) -> Self {
        let text = if pretty {
            format!("{value:#}")
        } else {
            value.to_string()
        };
        Self {
            name: name.into(),
            text,
        }
    }
}

/// Produces the `header` fragment, one fragment per top-level property, and the circular
/// fragment bundling the configured definitions with the circular definition, in that order.
pub fn split(schema: &Value, config: &Config) -> Result<Vec<Fragment>, StructureError> {
    let circular_name = config.circular.name.as_str();
    let properties = schema
        .get("properties")
        .and_then(Value::as_object)
        .ok_or_else(|| StructureError::MissingSection {
            name: "properties".to_string(),
        })?;

    let mut fragments = Vec::with_capacity(properties.len() + 2);

    let header: Map<String, Value> = schema
        .as_object()
        .into_iter()
        .flatten()
        .filter(|(key, _)| key.as_str() != "properties" && key.as_str() != "definitions")
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    fragments.push(Fragment::new(HEADER, &Value::Object(header), config.pretty));

    for (name, property) in properties {
        if name == HEADER || name == circular_name {
            return Err(StructureError::FragmentCollision { name: name.clone() });
        }
        fragments.push(Fragment::new(name.as_str(), property, config.pretty));
    }

    let definitions = schema.get("definitions").and_then(Value::as_object);
    let mut bundle = Map::new();
    for name in config.definitions.iter().map(String::as_str).chain([circular_name]) {
        let definition = definitions
            .and_then(|definitions| definitions.get(name))
            .ok_or_else(|| StructureError::MissingDefinition {
                name: name.to_string(),
            })?;
        bundle.insert(name.to_string(), definition.clone());
    }
    fragments.push(Fragment::new(circular_name, &Value::Object(bundle), config.pretty));

    Ok(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> Config {
        Config {
            definitions: vec!["entry".to_string()],
            ..Config::default()
        }
    }

    fn schema() -> Value {
        json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "title": "Viewer",
            "type": "object",
            "properties": {
                "version": { "type": "string" },
                "map": { "type": "object", "properties": { "extent": {} } }
            },
            "definitions": {
                "entry": { "type": "object" },
                "unused": { "type": "string" },
                "circular": { "type": "object", "properties": { "circRef": "entryGroup" } }
            }
        })
    }

    #[test]
    fn test_split_fragments() {
        let fragments = split(&schema(), &config()).unwrap();
        let names: Vec<_> = fragments.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["header", "version", "map", "circular"]);

        assert_eq!(
            fragments[0].text,
            r#"{"$schema":"http://json-schema.org/draft-04/schema#","title":"Viewer","type":"object"}"#
        );
        assert_eq!(fragments[1].text, r#"{"type":"string"}"#);

        let circular: Value = serde_json::from_str(&fragments[3].text).unwrap();
        assert_eq!(
            circular,
            json!({
                "entry": { "type": "object" },
                "circular": { "type": "object", "properties": { "circRef": "entryGroup" } }
            })
        );
    }

    #[test]
    fn test_pretty_fragments() {
        let config = Config {
            pretty: true,
            ..config()
        };
        let fragments = split(&schema(), &config).unwrap();
        assert_eq!(fragments[1].text, "{\n  \"type\": \"string\"\n}");
    }

    #[test]
    fn test_missing_properties() {
        let err = split(&json!({ "definitions": {} }), &config()).unwrap_err();
        assert_eq!(
            err,
            StructureError::MissingSection {
                name: "properties".to_string()
            }
        );
    }

    #[test]
    fn test_missing_bundled_definition() {
        let mut schema = schema();
        schema["definitions"]
            .as_object_mut()
            .unwrap()
            .remove("circular");
        let err = split(&schema, &config()).unwrap_err();
        assert_eq!(
            err,
            StructureError::MissingDefinition {
                name: "circular".to_string()
            }
        );
    }

    #[test]
    fn test_reserved_property_name() {
        let mut schema = schema();
        schema["properties"]["header"] = json!({});
        assert!(matches!(
            split(&schema, &config()),
            Err(StructureError::FragmentCollision { name }) if name == "header"
        ));
    }
}
