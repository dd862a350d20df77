//! The schema walker: moves human-readable text out of the schema and into the ledger.
//!
//! Each facet is one recursive pass over a `properties` map. For every property the pass
//! records the facet's text under a generated label and writes the label back in its place,
//! then descends according to the property's [`NodeShape`].

use crate::error::{LabelError, LedgerError};
use crate::label::{self, Facet};
use crate::ledger::Ledger;
use crate::utils::strip_brackets;
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Attributes holding instance data rather than sub-schemas; never scanned for descriptions.
const DATA_KEYWORDS: [&str; 4] = ["default", "enum", "const", "examples"];

/// Label prefix of everything under the `definitions` section.
pub const DEFINITIONS_PREFIX: &str = "definitions.";

/// How the walker descends below a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    /// Has a `properties` map.
    Object,
    /// Has no `properties` map, but `items.properties` is one.
    Array,
    Leaf,
}

impl NodeShape {
    pub fn of(node: &Map<String, Value>) -> Self {
        if node.get("properties").is_some_and(Value::is_object) {
            NodeShape::Object
        } else if node
            .get("items")
            .and_then(|items| items.get("properties"))
            .is_some_and(Value::is_object)
        {
            NodeShape::Array
        } else {
            NodeShape::Leaf
        }
    }
}

/// Owns a dereferenced schema and the ledger its labels are recorded in.
///
/// Every facet can be applied once. A labeled value is an ordinary string, so a second pass
/// would label the labels.
#[derive(Debug)]
pub struct Labeler {
    schema: Value,
    ledger: Ledger,
    applied: BTreeSet<Facet>,
    label_definitions: bool,
    // Definitions left exactly as they are, e.g. the synthetic circular one
    skipped_definitions: BTreeSet<String>,
}

impl Labeler {
    pub fn new(schema: Value, languages: Vec<String>) -> Result<Self, LedgerError> {
        Ok(Self {
            schema,
            ledger: Ledger::new(languages)?,
            applied: BTreeSet::new(),
            label_definitions: false,
            skipped_definitions: BTreeSet::new(),
        })
    }

    /// Also label every entry of `definitions`, under the `definitions.` prefix.
    pub fn label_definitions(mut self, enabled: bool) -> Self {
        self.label_definitions = enabled;
        self
    }

    /// Leaves the definition `name` unlabeled when definitions are labeled.
    pub fn skip_definition(mut self, name: impl Into<String>) -> Self {
        self.skipped_definitions.insert(name.into());
        self
    }

    pub fn apply(&mut self, facet: Facet) -> Result<(), LabelError> {
        if !self.applied.insert(facet) {
            return Err(LabelError::FacetAlreadyApplied {
                facet: facet.to_string(),
            });
        }
        let before = self.ledger.len();

        if facet == Facet::SchemaName {
            if let Some(properties) = self.schema.get_mut("properties").and_then(Value::as_object_mut) {
                label_schema_names(properties);
            }
        } else {
            if let Some(properties) = self.schema.get_mut("properties").and_then(Value::as_object_mut) {
                label_properties(facet, properties, "", &mut self.ledger);
            }
            if self.label_definitions {
                if let Some(definitions) =
                    self.schema.get_mut("definitions").and_then(Value::as_object_mut)
                {
                    for (name, node) in definitions
                        .iter_mut()
                        .filter(|(name, _)| !self.skipped_definitions.contains(name.as_str()))
                    {
                        label_node(facet, name, node, DEFINITIONS_PREFIX, &mut self.ledger);
                    }
                }
            }
        }

        info!(
            "Labeled {facet} facet ({} ledger rows added)",
            self.ledger.len() - before
        );
        Ok(())
    }

    /// Applies every facet in [`Facet::ALL`] order.
    pub fn apply_all(&mut self) -> Result<(), LabelError> {
        for facet in Facet::ALL {
            self.apply(facet)?;
        }
        Ok(())
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn finish(self) -> (Value, Ledger) {
        (self.schema, self.ledger)
    }
}

/// Sets `schema` to the property name on every first-level property.
pub fn label_schema_names(properties: &mut Map<String, Value>) {
    for (name, node) in properties.iter_mut() {
        if let Value::Object(node) = node {
            node.insert("schema".to_string(), Value::String(name.clone()));
        }
    }
}

/// Runs one facet pass over a `properties` map. `prefix` is empty or ends with a dot.
pub fn label_properties(
    facet: Facet,
    properties: &mut Map<String, Value>,
    prefix: &str,
    ledger: &mut Ledger,
) {
    for (name, node) in properties.iter_mut() {
        label_node(facet, name, node, prefix, ledger);
    }
}

/// Runs one facet pass over the property `name` and everything below it.
fn label_node(facet: Facet, name: &str, node: &mut Value, prefix: &str, ledger: &mut Ledger) {
    let Value::Object(node) = node else {
        debug!("Skipping non-schema property '{prefix}{name}'");
        return;
    };

    match facet {
        Facet::SchemaName => {}
        Facet::Title => label_title(node, prefix, name, ledger),
        Facet::Description => label_description(node, prefix, name, ledger),
        Facet::Enum => label_enum(node, prefix, name, ledger),
        Facet::Default => label_default(node, prefix, name, ledger),
    }

    match NodeShape::of(node) {
        NodeShape::Object => {
            if let Some(Value::Object(children)) = node.get_mut("properties") {
                label_properties(facet, children, &label::child_prefix(prefix, name), ledger);
            }
        }
        NodeShape::Array if facet.descends_into_items() => {
            if let Some(Value::Object(children)) = node
                .get_mut("items")
                .and_then(|items| items.get_mut("properties"))
            {
                let prefix = format!("{prefix}{name}.items.");
                label_properties(facet, children, &prefix, ledger);
            }
        }
        NodeShape::Leaf if facet == Facet::Description => {
            label_nested_descriptions(node, prefix, name, ledger);
        }
        _ => {}
    }
}

/// Records the string in `slot` under `label` and replaces it with the label.
fn extract(slot: &mut Value, label: String, ledger: &mut Ledger) {
    if let Value::String(text) = slot {
        ledger.record_source(&label, text.as_str());
        *text = label;
    }
}

fn label_title(node: &mut Map<String, Value>, prefix: &str, name: &str, ledger: &mut Ledger) {
    let label = label::label(prefix, name, Facet::Title, None);
    match node.get("title") {
        Some(Value::String(text)) => ledger.record_source(&label, text),
        _ => ledger.record_placeholder(&label),
    };
    node.insert("title".to_string(), Value::String(label));
}

fn label_description(node: &mut Map<String, Value>, prefix: &str, name: &str, ledger: &mut Ledger) {
    if let Some(slot) = node.get_mut("description") {
        extract(slot, label::label(prefix, name, Facet::Description, None), ledger);
    }
}

/// Descriptions one level below a leaf property, e.g. on its `items`.
fn label_nested_descriptions(
    node: &mut Map<String, Value>,
    prefix: &str,
    name: &str,
    ledger: &mut Ledger,
) {
    for (attribute, value) in node.iter_mut() {
        if DATA_KEYWORDS.contains(&attribute.as_str()) {
            continue;
        }
        if let Some(slot) = value.get_mut("description") {
            let owner = format!("{name}.{attribute}");
            extract(slot, label::label(prefix, &owner, Facet::Description, None), ledger);
        }
    }
}

fn label_enum(node: &mut Map<String, Value>, prefix: &str, name: &str, ledger: &mut Ledger) {
    if let Some(Value::Array(elements)) = node.get_mut("enum") {
        label_elements(elements, prefix, name, ledger);
    }
    if let Some(Value::Array(elements)) = node
        .get_mut("items")
        .and_then(|items| items.get_mut("enum"))
    {
        label_elements(elements, prefix, &format!("{name}.items"), ledger);
    }
}

fn label_elements(elements: &mut [Value], prefix: &str, owner: &str, ledger: &mut Ledger) {
    for element in elements.iter_mut() {
        // Numbers, booleans and null are not text; they stay as they are
        if let Value::String(text) = element {
            let label = label::label(prefix, owner, Facet::Enum, Some(text.as_str()));
            ledger.record_source(&label, text.as_str());
            *text = label;
        }
    }
}

/// Text recorded for a default value, or `None` when the value is not labeled.
fn default_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Object(_) => None,
        Value::Array(_) => Some(strip_brackets(&value.to_string()).to_string()),
        scalar => Some(label::element_text(scalar)),
    }
}

fn label_default(node: &mut Map<String, Value>, prefix: &str, name: &str, ledger: &mut Ledger) {
    if !node.contains_key("default") {
        let label = label::label(prefix, name, Facet::Default, None);
        ledger.record_placeholder(&label);
        node.insert("default".to_string(), Value::String(label));
        return;
    }
    let Some(slot) = node.get_mut("default") else {
        return;
    };

    match slot {
        Value::Object(fields) => {
            // One level only: nested objects are left as they are
            for (key, field) in fields.iter_mut() {
                if let Some(text) = default_text(field) {
                    let label = label::label(prefix, name, Facet::Default, Some(key.as_str()));
                    ledger.record_source(&label, &text);
                    *field = Value::String(label);
                }
            }
        }
        other => {
            if let Some(text) = default_text(other) {
                let label = label::label(prefix, name, Facet::Default, None);
                ledger.record_source(&label, &text);
                *other = Value::String(label);
            }
        }
    }
}
