//! The translation ledger: an ordered, append-only table mapping each label to one value
//! and one "translated" flag per language.
//!
//! On disk the ledger is a CSV file without a header row. Every row reads
//! `"",label,value_0,flag_0,value_1,flag_1,...`; the leading empty field and the flags are
//! part of the format and are preserved on round trip.

use crate::error::LedgerError;
use log::{debug, warn};
use std::collections::HashMap;
use std::io;

/// Number of fixed columns before the per-language pairs: the empty lead field and the label.
const FIXED_COLUMNS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    /// `true` when `text` is real content rather than a `[lang]` placeholder.
    pub translated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRecord {
    pub label: String,
    pub values: Vec<Translation>,
}

impl LedgerRecord {
    #[must_use]
    pub fn value(&self, language: usize) -> Option<&str> {
        self.values.get(language).map(|t| t.text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    languages: Vec<String>,
    records: Vec<LedgerRecord>,
    index: HashMap<String, usize>,
}

impl Ledger {
    /// Creates an empty ledger. The first language is the source language.
    pub fn new(languages: Vec<String>) -> Result<Self, LedgerError> {
        if languages.is_empty() {
            return Err(LedgerError::NoLanguages);
        }
        Ok(Self {
            languages,
            records: Vec::new(),
            index: HashMap::new(),
        })
    }

    #[must_use]
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    #[must_use]
    pub fn language_index(&self, tag: &str) -> Option<usize> {
        self.languages.iter().position(|l| l == tag)
    }

    /// The marker written for a language that has no text yet, e.g. `[fr]`.
    #[must_use]
    pub fn placeholder(&self, language: usize) -> String {
        format!("[{}]", self.languages[language])
    }

    /// Appends a row whose every language is a placeholder.
    ///
    /// Returns `false` if the label already has a row; the existing row is kept.
    pub fn record_placeholder(&mut self, label: &str) -> bool {
        let values = (0..self.languages.len())
            .map(|language| Translation {
                text: self.placeholder(language),
                translated: false,
            })
            .collect();
        self.append(LedgerRecord {
            label: label.to_string(),
            values,
        })
    }

    /// Appends a row carrying `text` in the source language and placeholders elsewhere.
    ///
    /// Returns `false` if the label already has a row; the existing row is kept.
    pub fn record_source(&mut self, label: &str, text: &str) -> bool {
        let values = (0..self.languages.len())
            .map(|language| {
                if language == 0 {
                    Translation {
                        text: text.to_string(),
                        translated: true,
                    }
                } else {
                    Translation {
                        text: self.placeholder(language),
                        translated: false,
                    }
                }
            })
            .collect();
        self.append(LedgerRecord {
            label: label.to_string(),
            values,
        })
    }

    /// Sets the text of `label` in `language` and marks it translated.
    ///
    /// Returns `false` if either the label or the language is unknown.
    pub fn translate(&mut self, label: &str, language: usize, text: &str) -> bool {
        let Some(&position) = self.index.get(label) else {
            return false;
        };
        match self.records[position].values.get_mut(language) {
            Some(slot) => {
                slot.text = text.to_string();
                slot.translated = true;
                true
            }
            None => false,
        }
    }

    fn append(&mut self, record: LedgerRecord) -> bool {
        if self.index.contains_key(&record.label) {
            warn!("Label '{}' already has a ledger row, keeping the first", record.label);
            return false;
        }
        debug!("Ledger row for '{}'", record.label);
        self.index.insert(record.label.clone(), self.records.len());
        self.records.push(record);
        true
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&LedgerRecord> {
        self.index.get(label).map(|&position| &self.records[position])
    }

    #[must_use]
    pub fn value(&self, label: &str, language: usize) -> Option<&str> {
        self.get(label).and_then(|record| record.value(language))
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    #[must_use]
    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn columns(&self) -> usize {
        FIXED_COLUMNS + 2 * self.languages.len()
    }

    /// Writes the ledger as CSV rows, in insertion order.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), LedgerError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        let mut row: Vec<&str> = Vec::with_capacity(self.columns());
        for record in &self.records {
            row.clear();
            row.push("");
            row.push(&record.label);
            for translation in &record.values {
                row.push(&translation.text);
                row.push(if translation.translated { "1" } else { "0" });
            }
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> Result<String, LedgerError> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Reads a ledger written by [`Ledger::write_csv`] (or edited by a translator).
    ///
    /// Every row must have exactly one value/flag pair per language in `languages`.
    pub fn read_csv<R: io::Read>(reader: R, languages: Vec<String>) -> Result<Self, LedgerError> {
        let mut ledger = Ledger::new(languages)?;
        let expected = ledger.columns();
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        for result in csv_reader.records() {
            let row = result?;
            let line = row.position().map_or(0, |p| p.line());
            if row.len() != expected {
                return Err(LedgerError::MalformedRow {
                    line,
                    expected,
                    found: row.len(),
                });
            }

            let label = row[1].to_string();
            let mut values = Vec::with_capacity(ledger.languages.len());
            for pair in 0..ledger.languages.len() {
                let text = &row[FIXED_COLUMNS + 2 * pair];
                let flag = &row[FIXED_COLUMNS + 2 * pair + 1];
                let translated = match flag.trim() {
                    "0" => false,
                    "1" => true,
                    other => {
                        return Err(LedgerError::InvalidFlag {
                            line,
                            value: other.to_string(),
                        })
                    }
                };
                values.push(Translation {
                    text: text.to_string(),
                    translated,
                });
            }
            ledger.append(LedgerRecord { label, values });
        }
        Ok(ledger)
    }

    pub fn from_csv(text: &str, languages: Vec<String>) -> Result<Self, LedgerError> {
        Self::read_csv(text.as_bytes(), languages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn languages() -> Vec<String> {
        vec!["en".to_string(), "fr".to_string()]
    }

    #[test]
    fn test_requires_a_language() {
        assert!(matches!(Ledger::new(Vec::new()), Err(LedgerError::NoLanguages)));
    }

    #[test]
    fn test_placeholder_row() {
        let mut ledger = Ledger::new(languages()).unwrap();
        assert!(ledger.record_placeholder("layer.title"));
        let record = ledger.get("layer.title").unwrap();
        assert_eq!(record.value(0), Some("[en]"));
        assert_eq!(record.value(1), Some("[fr]"));
        assert!(record.values.iter().all(|t| !t.translated));
    }

    #[test]
    fn test_source_row() {
        let mut ledger = Ledger::new(languages()).unwrap();
        ledger.record_source("layer.description", "Map layer name");
        let record = ledger.get("layer.description").unwrap();
        assert_eq!(record.values[0].text, "Map layer name");
        assert!(record.values[0].translated);
        assert_eq!(record.values[1].text, "[fr]");
        assert!(!record.values[1].translated);
    }

    #[test]
    fn test_duplicate_label_keeps_first() {
        let mut ledger = Ledger::new(languages()).unwrap();
        assert!(ledger.record_source("layer.enum.A", "A"));
        assert!(!ledger.record_source("layer.enum.A", "other"));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.value("layer.enum.A", 0), Some("A"));
    }

    #[test]
    fn test_insertion_order_is_kept() {
        let mut ledger = Ledger::new(languages()).unwrap();
        ledger.record_placeholder("b.title");
        ledger.record_placeholder("a.title");
        let labels: Vec<_> = ledger.records().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["b.title", "a.title"]);
    }

    #[test]
    fn test_translate() {
        let mut ledger = Ledger::new(languages()).unwrap();
        ledger.record_source("layer.description", "Map layer name");
        assert!(ledger.translate("layer.description", 1, "Nom de la couche"));
        assert!(!ledger.translate("layer.description", 2, "x"));
        assert!(!ledger.translate("missing.title", 1, "x"));
        assert_eq!(ledger.value("layer.description", 1), Some("Nom de la couche"));
    }

    #[test]
    fn test_csv_row_layout() {
        let mut ledger = Ledger::new(languages()).unwrap();
        ledger.record_placeholder("layer.title");
        ledger.record_source("layer.description", "Name, with a comma");
        let csv = ledger.to_csv().unwrap();
        assert_eq!(
            csv,
            ",layer.title,[en],0,[fr],0\n,layer.description,\"Name, with a comma\",1,[fr],0\n"
        );
    }

    #[test]
    fn test_csv_round_trip() {
        let mut ledger = Ledger::new(languages()).unwrap();
        ledger.record_placeholder("layer.title");
        ledger.record_source("layer.description", "Says \"hi\"\nand more");
        ledger.translate("layer.description", 1, "Dit « salut »");

        let csv = ledger.to_csv().unwrap();
        let loaded = Ledger::from_csv(&csv, languages()).unwrap();
        assert_eq!(loaded, ledger);
    }

    #[test]
    fn test_csv_wrong_column_count() {
        let err = Ledger::from_csv(",layer.title,[en],0\n", languages()).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MalformedRow {
                expected: 6,
                found: 4,
                ..
            }
        ));
    }

    #[test]
    fn test_csv_invalid_flag() {
        let err = Ledger::from_csv(",layer.title,[en],yes,[fr],0\n", languages()).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidFlag { value, .. } if value == "yes"));
    }
}
