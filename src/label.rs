//! Label naming.
//!
//! A label is the dot-joined path of ancestor property names followed by a facet suffix,
//! e.g. `layer.title`, `layer.description`, `layer.enum.A` or `layer.default.opacity`.
//! Labels are a pure function of the schema shape, so a ledger produced by one run stays
//! valid for the next run over the same (or a cosmetically edited) schema.

use serde_json::Value;
use std::fmt::Display;

/// One category of labelable schema content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    SchemaName,
    Title,
    Description,
    Enum,
    Default,
}

impl Facet {
    /// Every facet, in the order the labeling passes run.
    pub const ALL: [Facet; 5] = [
        Facet::SchemaName,
        Facet::Title,
        Facet::Description,
        Facet::Enum,
        Facet::Default,
    ];

    /// The schema keyword this facet reads and rewrites.
    pub fn keyword(self) -> &'static str {
        match self {
            Facet::SchemaName => "schema",
            Facet::Title => "title",
            Facet::Description => "description",
            Facet::Enum => "enum",
            Facet::Default => "default",
        }
    }

    /// Whether the pass for this facet follows `items.properties` on array nodes.
    pub fn descends_into_items(self) -> bool {
        matches!(self, Facet::Description)
    }
}

impl Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Builds the label for `property` under `prefix`.
///
/// `prefix` is either empty or ends with a dot. `element` distinguishes the per-element
/// labels of enum arrays and object-shaped defaults.
pub fn label(prefix: &str, property: &str, facet: Facet, element: Option<&str>) -> String {
    let mut label = String::with_capacity(prefix.len() + property.len() + 16);
    label.push_str(prefix);
    label.push_str(property);
    label.push('.');
    label.push_str(facet.keyword());
    if let Some(element) = element {
        label.push('.');
        label.push_str(element);
    }
    label
}

/// Extends a prefix by one property name.
pub fn child_prefix(prefix: &str, property: &str) -> String {
    format!("{prefix}{property}.")
}

/// String form of an enum element or default value as it is recorded in the ledger.
///
/// Strings are taken verbatim; other scalars use their JSON text.
pub fn element_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether `text`, found at a `facet` position, has the shape of a label of that facet.
pub fn looks_like(facet: Facet, text: &str) -> bool {
    let suffix = facet.keyword();
    let dotted = format!(".{suffix}");
    match facet {
        Facet::SchemaName => false,
        Facet::Title | Facet::Description => text.len() > dotted.len() && text.ends_with(&dotted),
        Facet::Enum => text.contains(".enum."),
        Facet::Default => {
            (text.len() > dotted.len() && text.ends_with(&dotted)) || text.contains(".default.")
        }
    }
}
