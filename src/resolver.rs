//! Label resolution: turns a labeled fragment back into a document in one language.
//!
//! The fragment is parsed and rewritten as a tree. Only strings in facet positions
//! (`title`, `description`, `default` and the fields of an object default, `enum` elements)
//! are candidates, and a candidate is replaced only when it is exactly a ledger label. A
//! label can therefore never match inside another label or inside unrelated text, and the
//! order of ledger rows does not matter.

use crate::error::ResolveError;
use crate::label::{self, Facet};
use crate::ledger::Ledger;
use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Keys whose object value maps names to sub-schemas rather than holding keywords.
const SCHEMA_MAPS: [&str; 3] = ["properties", "definitions", "patternProperties"];

pub struct LabelResolver<'a> {
    ledger: &'a Ledger,
    language: usize,
    pretty: bool,
}

impl<'a> LabelResolver<'a> {
    pub fn new(ledger: &'a Ledger, language: usize) -> Result<Self, ResolveError> {
        if language >= ledger.languages().len() {
            return Err(ResolveError::UnknownLanguage {
                index: language,
                count: ledger.languages().len(),
            });
        }
        Ok(Self {
            ledger,
            language,
            pretty: false,
        })
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    #[must_use]
    pub fn language_tag(&self) -> &str {
        &self.ledger.languages()[self.language]
    }

    /// Resolves a serialized fragment and serializes the result.
    pub fn resolve(&self, text: &str) -> Result<String, ResolveError> {
        let mut value: Value = serde_json::from_str(text)?;
        self.resolve_value(&mut value)?;
        Ok(if self.pretty {
            format!("{value:#}")
        } else {
            value.to_string()
        })
    }

    /// Resolves labels in place.
    ///
    /// Every label-shaped string without a ledger row is collected; if there are any, the
    /// whole resolution fails with [`ResolveError::Completeness`] listing them all.
    pub fn resolve_value(&self, value: &mut Value) -> Result<(), ResolveError> {
        let mut missing = Vec::new();
        self.rewrite(value, &mut missing);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ResolveError::Completeness {
                language: self.language_tag().to_string(),
                labels: missing,
            })
        }
    }

    fn rewrite(&self, value: &mut Value, missing: &mut Vec<String>) {
        match value {
            Value::Object(members) => {
                let kinds = DefaultKinds::of(members);
                for (key, member) in members.iter_mut() {
                    if SCHEMA_MAPS.contains(&key.as_str()) {
                        if let Value::Object(children) = &mut *member {
                            for child in children.values_mut() {
                                self.rewrite(child, missing);
                            }
                            continue;
                        }
                    }
                    match (facet_of(key), member) {
                        (Some(Facet::Enum), Value::Array(elements)) => {
                            for element in elements.iter_mut() {
                                self.substitute(element, Facet::Enum, &[], missing);
                            }
                        }
                        (Some(Facet::Default), Value::Object(fields)) => {
                            for (field, slot) in fields.iter_mut() {
                                self.substitute(slot, Facet::Default, kinds.field(field), missing);
                            }
                        }
                        (Some(Facet::Default), slot) if slot.is_string() => {
                            self.substitute(slot, Facet::Default, &kinds.own, missing);
                        }
                        (Some(facet), slot) if slot.is_string() => {
                            self.substitute(slot, facet, &[], missing);
                        }
                        (_, other) => self.rewrite(other, missing),
                    }
                }
            }
            Value::Array(elements) => {
                for element in elements.iter_mut() {
                    self.rewrite(element, missing);
                }
            }
            _ => {}
        }
    }

    fn substitute(&self, slot: &mut Value, facet: Facet, kinds: &[String], missing: &mut Vec<String>) {
        let Value::String(text) = &mut *slot else {
            return;
        };
        match self.ledger.value(text, self.language) {
            Some(resolved) => {
                debug!("Resolved '{text}' for '{}'", self.language_tag());
                *slot = typed(resolved, kinds);
            }
            None => {
                if label::looks_like(facet, text) && !missing.contains(text) {
                    missing.push(text.clone());
                }
            }
        }
    }
}

fn facet_of(key: &str) -> Option<Facet> {
    match key {
        "title" => Some(Facet::Title),
        "description" => Some(Facet::Description),
        "enum" => Some(Facet::Enum),
        "default" => Some(Facet::Default),
        _ => None,
    }
}

/// JSON types declared by the schema that owns a `default`, and by its properties for the
/// fields of an object default.
#[derive(Debug, Default)]
struct DefaultKinds {
    own: Vec<String>,
    fields: HashMap<String, Vec<String>>,
}

impl DefaultKinds {
    fn of(node: &Map<String, Value>) -> Self {
        if !node.contains_key("default") {
            return Self::default();
        }
        let fields = node
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .map(|(name, schema)| (name.clone(), declared_types(schema.get("type"))))
            .collect();
        Self {
            own: declared_types(node.get("type")),
            fields,
        }
    }

    fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

fn declared_types(keyword: Option<&Value>) -> Vec<String> {
    match keyword {
        Some(Value::String(kind)) => vec![kind.clone()],
        Some(Value::Array(kinds)) => kinds
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// The JSON value written for a ledger text.
///
/// Declared types are tried in order: numbers, booleans and arrays (recorded without their
/// brackets) are parsed back, a `string` type keeps the text as is. Text that fits none of
/// them, or has no declared type, stays a string except for the boolean literals.
fn typed(text: &str, kinds: &[String]) -> Value {
    for kind in kinds {
        let parsed = match kind.as_str() {
            "string" => return Value::String(text.to_string()),
            "number" | "integer" => serde_json::from_str::<Value>(text).ok().filter(Value::is_number),
            "boolean" => serde_json::from_str::<Value>(text).ok().filter(Value::is_boolean),
            "array" => serde_json::from_str::<Value>(&format!("[{text}]"))
                .ok()
                .filter(Value::is_array),
            "null" => (text == "null").then_some(Value::Null),
            _ => None,
        };
        if let Some(value) = parsed {
            return value;
        }
    }
    match text {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => Value::String(other.to_string()),
    }
}

/// Resolves `text` for the language at `language` in the ledger, compactly serialized.
pub fn resolve(text: &str, ledger: &Ledger, language: usize) -> Result<String, ResolveError> {
    LabelResolver::new(ledger, language)?.resolve(text)
}
