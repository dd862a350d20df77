use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum SplitError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Structure(#[from] StructureError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Dereference(#[from] DereferenceError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Output(#[from] OutputError),
}

#[derive(Error, Debug, Diagnostic)]
pub enum ParseError {
    #[error("Invalid JSON schema")]
    #[diagnostic(
        code(parse::invalid_json),
        help("The schema document must be a single, well-formed JSON value.")
    )]
    InvalidJson {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
    },

    #[error("Schema root is not an object")]
    #[diagnostic(
        code(parse::root_not_object),
        help("A JSON Schema document must be an object at the top level.")
    )]
    RootNotObject,
}

/// An expected schema location is absent or has the wrong shape.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum StructureError {
    #[error("Schema path '{path}' does not exist")]
    #[diagnostic(
        code(structure::missing_path),
        help("The circular reference sites are fixed; check the configured paths against the schema.")
    )]
    MissingPath { path: String },

    #[error("Schema path '{path}' is not an array of alternatives")]
    #[diagnostic(code(structure::not_an_array))]
    NotAnArray { path: String },

    #[error("Schema path '{path}' has no alternative at index {index} (found {len})")]
    #[diagnostic(
        code(structure::missing_alternative),
        help("The self-reference must be present before it can be neutralized.")
    )]
    MissingAlternative {
        path: String,
        index: usize,
        len: usize,
    },

    #[error("Schema has no '{name}' section")]
    #[diagnostic(code(structure::missing_section))]
    MissingSection { name: String },

    #[error("Definition '{name}' is not present in 'definitions'")]
    #[diagnostic(
        code(structure::missing_definition),
        help("Every definition bundled into the circular fragment must exist in the schema.")
    )]
    MissingDefinition { name: String },

    #[error("Top-level property '{name}' collides with a reserved name")]
    #[diagnostic(
        code(structure::fragment_collision),
        help("'header', the circular fragment name and, while definitions are labeled, 'definitions' cannot be used as top-level property names.")
    )]
    FragmentCollision { name: String },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum DereferenceError {
    #[error("Circular reference detected: {chain}")]
    #[diagnostic(
        code(dereference::circular),
        help("Neutralize the self-referential sites before dereferencing.")
    )]
    Circular { chain: String },

    #[error("Reference '{reference}' does not point to anything in the schema")]
    #[diagnostic(code(dereference::unresolved))]
    Unresolved { reference: String },

    #[error("Reference '{reference}' is not a local JSON pointer")]
    #[diagnostic(
        code(dereference::external),
        help("Only references of the form '#/...' are resolved.")
    )]
    External { reference: String },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum LabelError {
    #[error("The {facet} facet has already been labeled on this schema")]
    #[diagnostic(
        code(label::facet_already_applied),
        help("Labels look like ordinary strings, so a second pass would relabel them.")
    )]
    FacetAlreadyApplied { facet: String },
}

#[derive(Error, Debug, Diagnostic)]
pub enum ResolveError {
    #[error("Fragment is not valid JSON: {0}")]
    #[diagnostic(code(resolve::invalid_json))]
    Json(#[from] serde_json::Error),

    #[error("Language index {index} is out of range ({count} languages in the ledger)")]
    #[diagnostic(code(resolve::unknown_language))]
    UnknownLanguage { index: usize, count: usize },

    #[error("Ledger has no entry for {} label(s) while resolving '{language}': {}", .labels.len(), .labels.join(", "))]
    #[diagnostic(
        code(resolve::incomplete_ledger),
        help("Every label present in the schema needs a ledger row; regenerate or complete the ledger.")
    )]
    Completeness {
        language: String,
        labels: Vec<String>,
    },
}

#[derive(Error, Debug, Diagnostic)]
pub enum LedgerError {
    #[error("Ledger CSV error: {0}")]
    #[diagnostic(code(ledger::csv))]
    Csv(#[from] csv::Error),

    #[error("Ledger row {line} has {found} fields, expected {expected}")]
    #[diagnostic(
        code(ledger::malformed_row),
        help("Each row is: empty field, label, then a value and a flag per language.")
    )]
    MalformedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Ledger row {line} has translated flag '{value}', expected 0 or 1")]
    #[diagnostic(code(ledger::invalid_flag))]
    InvalidFlag { line: u64, value: String },

    #[error("Ledger must define at least one language")]
    #[diagnostic(code(ledger::no_languages))]
    NoLanguages,

    #[error("Ledger output is not valid UTF-8")]
    #[diagnostic(code(ledger::encoding))]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Ledger I/O error: {0}")]
    #[diagnostic(code(ledger::io))]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("Could not read config file '{}'", .path.display())]
    #[diagnostic(code(config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    #[diagnostic(code(config::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config: {reason}")]
    #[diagnostic(code(config::invalid))]
    Invalid { reason: String },
}

#[derive(Error, Debug, Diagnostic)]
#[error("Could not {action} '{}'", .path.display())]
#[diagnostic(code(output::io))]
pub struct OutputError {
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
