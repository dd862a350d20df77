use crate::circular;
use crate::config::Config;
use crate::dereference::{Dereference, LocalDereferencer};
use crate::error::{LedgerError, ParseError, ResolveError, SplitError, StructureError};
use crate::ledger::Ledger;
use crate::resolver::LabelResolver;
use crate::splitter::{self, Fragment};
use crate::utils::byte_offset;
use crate::walker::Labeler;
use log::{info, warn};
use miette::NamedSource;
use serde_json::Value;

/// A schema whose text has been moved into a ledger.
///
/// `schema` is dereferenced, with the circular definition in place, and every labelable
/// facet replaced by its label. `ledger` holds one row per label.
#[derive(Debug, Clone)]
pub struct LabeledSchema {
    pub schema: Value,
    pub ledger: Ledger,
}

impl LabeledSchema {
    /// Serializes the labeled schema into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.schema)
    }

    /// Serializes the labeled schema into a YAML string.
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.schema)
    }

    pub fn ledger_csv(&self) -> Result<String, LedgerError> {
        self.ledger.to_csv()
    }

    pub fn fragments(&self, config: &Config) -> Result<Vec<Fragment>, StructureError> {
        splitter::split(&self.schema, config)
    }
}

/// Parses a schema document, reporting syntax errors against the source text.
pub fn parse_schema(source: &str, file_name: &str) -> Result<Value, ParseError> {
    let schema: Value = serde_json::from_str(source).map_err(|err| ParseError::InvalidJson {
        src: NamedSource::new(file_name, source.to_string()),
        span: (byte_offset(source, err.line(), err.column()), 0).into(),
        message: err.to_string(),
    })?;
    if !schema.is_object() {
        return Err(ParseError::RootNotObject);
    }
    Ok(schema)
}

const DEFINITIONS_SECTION: &str = "definitions";

/// A top-level property named like the definitions section would share its label prefix.
fn reject_reserved_property(schema: &Value, name: &str) -> Result<(), StructureError> {
    let taken = schema
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|properties| properties.contains_key(name));
    if taken {
        return Err(StructureError::FragmentCollision {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Labels a JSON Schema source string: parsing, circular reference neutralization,
/// dereferencing and every facet pass.
///
/// This is the primary entry point. The returned [`LabeledSchema`] carries the ledger to
/// persist and the schema to split.
///
/// # Arguments
///
/// * `source` - The JSON Schema document.
/// * `file_name` - The name of the file being labeled (used for error reporting).
/// * `config` - Languages, circular reference sites and definitions to bundle.
///
/// # Errors
///
/// Returns a `SplitError` if parsing, neutralization, dereferencing or labeling fails.
pub fn label_schema(source: &str, file_name: &str, config: &Config) -> Result<LabeledSchema, SplitError> {
    label_schema_with(source, file_name, config, &LocalDereferencer)
}

/// [`label_schema`] with a caller-supplied `$ref` dereferencer.
pub fn label_schema_with(
    source: &str,
    file_name: &str,
    config: &Config,
    dereferencer: &dyn Dereference,
) -> Result<LabeledSchema, SplitError> {
    let mut schema = parse_schema(source, file_name)?;
    if config.label_definitions {
        reject_reserved_property(&schema, DEFINITIONS_SECTION)?;
    }
    circular::neutralize(&mut schema, &config.circular)?;
    let schema = dereferencer.dereference(schema)?;
    info!("Dereferenced {file_name}");

    let mut labeler = Labeler::new(schema, config.languages.clone())?
        .label_definitions(config.label_definitions)
        .skip_definition(config.circular.name.as_str());
    labeler.apply_all()?;
    let (schema, ledger) = labeler.finish();
    info!("Labeled {file_name}: {} ledger rows", ledger.len());

    Ok(LabeledSchema { schema, ledger })
}

/// One fragment resolved into one language.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub section: String,
    pub language: String,
    pub text: String,
}

#[derive(Debug)]
pub struct RenderFailure {
    pub section: String,
    pub language: String,
    pub error: ResolveError,
}

/// Outcome of resolving every fragment in every language.
#[derive(Debug, Default)]
pub struct RenderReport {
    pub artifacts: Vec<Artifact>,
    pub failures: Vec<RenderFailure>,
}

impl RenderReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Resolves each fragment for each ledger language.
///
/// Every (fragment, language) pair is independent: a failure is recorded in the report and
/// the remaining pairs are still resolved.
pub fn render(fragments: &[Fragment], ledger: &Ledger, pretty: bool) -> RenderReport {
    let mut report = RenderReport::default();
    for fragment in fragments {
        for (language, tag) in ledger.languages().iter().enumerate() {
            let resolved = LabelResolver::new(ledger, language)
                .and_then(|resolver| resolver.pretty(pretty).resolve(&fragment.text));
            match resolved {
                Ok(text) => report.artifacts.push(Artifact {
                    section: fragment.name.clone(),
                    language: tag.clone(),
                    text,
                }),
                Err(error) => {
                    warn!("Could not resolve '{}' for '{tag}': {error}", fragment.name);
                    report.failures.push(RenderFailure {
                        section: fragment.name.clone(),
                        language: tag.clone(),
                        error,
                    });
                }
            }
        }
    }
    report
}
