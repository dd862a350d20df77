pub mod api;
pub mod circular;
pub mod config;
pub mod dereference;
pub mod error;
pub mod label;
pub mod ledger;
pub mod output;
pub mod resolver;
pub mod splitter;
pub mod utils;
pub mod walker;

pub use api::{label_schema, render, LabeledSchema};
pub use config::Config;
pub use ledger::Ledger;
