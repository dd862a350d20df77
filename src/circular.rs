//! Neutralizes the schema's known self-references.
//!
//! The viewer schema nests groups inside groups: an entry group's children, and a visibility
//! set's exclusive members, may be entry groups again. Left alone, dereferencing that schema
//! never terminates. Each configured site holds a `oneOf` list whose designated alternative is
//! the self-reference; it is replaced by a reference to a terminal `circular` definition that
//! only names the group it stands in for.

use crate::config::CircularConfig;
use crate::error::StructureError;
use log::info;
use serde_json::{json, Value};

/// Follows a dot-separated path through objects (by key) and arrays (by index).
pub(crate) fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

pub(crate) fn get_path_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
        _ => None,
    })
}

/// The synthetic terminal definition substituted at every self-reference site.
pub fn circular_definition(references: &str) -> Value {
    json!({
        "type": "object",
        "properties": { "circRef": references }
    })
}

/// Replaces the self-reference at every configured site with a `$ref` to the circular
/// definition, which is added to `definitions`.
///
/// All sites are checked before the schema is touched, so on error the schema is unchanged.
pub fn neutralize(schema: &mut Value, config: &CircularConfig) -> Result<(), StructureError> {
    for site in &config.sites {
        let alternatives = get_path(schema, &site.path)
            .ok_or_else(|| StructureError::MissingPath {
                path: site.path.clone(),
            })?
            .as_array()
            .ok_or_else(|| StructureError::NotAnArray {
                path: site.path.clone(),
            })?;
        if site.remove >= alternatives.len() {
            return Err(StructureError::MissingAlternative {
                path: site.path.clone(),
                index: site.remove,
                len: alternatives.len(),
            });
        }
    }

    let definitions = schema
        .get_mut("definitions")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| StructureError::MissingSection {
            name: "definitions".to_string(),
        })?;
    definitions.insert(
        config.name.clone(),
        circular_definition(&config.references),
    );

    let reference = json!({ "$ref": format!("#/definitions/{}", config.name) });
    for site in &config.sites {
        if let Some(Value::Array(alternatives)) = get_path_mut(schema, &site.path) {
            alternatives.remove(site.remove);
            alternatives.insert(0, reference.clone());
        }
        info!("Neutralized self-reference at '{}'", site.path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CircularConfig, CircularSite};

    fn schema() -> Value {
        json!({
            "definitions": {
                "entryGroup": {
                    "properties": {
                        "children": {
                            "items": {
                                "oneOf": [
                                    { "$ref": "#/definitions/entryGroup" },
                                    { "$ref": "#/definitions/entry" }
                                ]
                            }
                        }
                    }
                },
                "visibilitySet": {
                    "properties": {
                        "exclusiveVisibility": {
                            "items": {
                                "oneOf": [
                                    { "$ref": "#/definitions/entryGroup" },
                                    { "$ref": "#/definitions/entry" }
                                ]
                            }
                        }
                    }
                },
                "entry": { "type": "object" }
            }
        })
    }

    #[test]
    fn test_neutralize_both_sites() {
        let mut schema = schema();
        neutralize(&mut schema, &CircularConfig::default()).unwrap();

        let expected_first = json!({ "$ref": "#/definitions/circular" });
        let site1 = get_path(
            &schema,
            "definitions.entryGroup.properties.children.items.oneOf",
        )
        .unwrap();
        let site2 = get_path(
            &schema,
            "definitions.visibilitySet.properties.exclusiveVisibility.items.oneOf",
        )
        .unwrap();
        assert_eq!(site1[0], expected_first);
        assert_eq!(site2[0], expected_first);
        assert_eq!(site1.as_array().unwrap().len(), 2);
        assert_eq!(site1[1], json!({ "$ref": "#/definitions/entry" }));
        assert_eq!(
            schema["definitions"]["circular"],
            json!({ "type": "object", "properties": { "circRef": "entryGroup" } })
        );
    }

    #[test]
    fn test_missing_site_leaves_schema_untouched() {
        let mut schema = schema();
        schema["definitions"]
            .as_object_mut()
            .unwrap()
            .remove("visibilitySet");
        let before = schema.clone();

        let err = neutralize(&mut schema, &CircularConfig::default()).unwrap_err();
        assert!(matches!(err, StructureError::MissingPath { .. }));
        assert_eq!(schema, before);
    }

    #[test]
    fn test_empty_alternatives() {
        let mut schema = json!({ "definitions": { "group": { "oneOf": [] } } });
        let config = CircularConfig {
            sites: vec![CircularSite {
                path: "definitions.group.oneOf".to_string(),
                remove: 0,
            }],
            ..CircularConfig::default()
        };
        let err = neutralize(&mut schema, &config).unwrap_err();
        assert_eq!(
            err,
            StructureError::MissingAlternative {
                path: "definitions.group.oneOf".to_string(),
                index: 0,
                len: 0,
            }
        );
    }

    #[test]
    fn test_site_not_an_array() {
        let mut schema = json!({ "definitions": { "group": { "oneOf": {} } } });
        let config = CircularConfig {
            sites: vec![CircularSite {
                path: "definitions.group.oneOf".to_string(),
                remove: 0,
            }],
            ..CircularConfig::default()
        };
        assert!(matches!(
            neutralize(&mut schema, &config),
            Err(StructureError::NotAnArray { .. })
        ));
    }

    #[test]
    fn test_designated_alternative() {
        let mut schema = json!({
            "definitions": { "group": { "oneOf": [ { "a": 1 }, { "self": true }, { "b": 2 } ] } }
        });
        let config = CircularConfig {
            sites: vec![CircularSite {
                path: "definitions.group.oneOf".to_string(),
                remove: 1,
            }],
            ..CircularConfig::default()
        };
        neutralize(&mut schema, &config).unwrap();
        assert_eq!(
            schema["definitions"]["group"]["oneOf"],
            json!([ { "$ref": "#/definitions/circular" }, { "a": 1 }, { "b": 2 } ])
        );
    }

    #[test]
    fn test_get_path_through_arrays() {
        let value = json!({ "a": [ { "b": 1 } ] });
        assert_eq!(get_path(&value, "a.0.b"), Some(&json!(1)));
        assert_eq!(get_path(&value, "a.1.b"), None);
        assert_eq!(get_path(&value, "a.x"), None);
    }
}
