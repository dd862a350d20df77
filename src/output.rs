//! Reading pieces and writing artifacts.
//!
//! Files are written to a temporary file in the target directory and renamed into place, so
//! a failed write never leaves a truncated artifact behind.

use crate::api::Artifact;
use crate::error::OutputError;
use crate::splitter::Fragment;
use log::info;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of a resolved artifact, e.g. `map.fr.json`.
pub fn artifact_file_name(section: &str, language: &str) -> String {
    format!("{section}.{language}.json")
}

/// File name of a labeled, unresolved piece, e.g. `map.json`.
pub fn piece_file_name(section: &str) -> String {
    format!("{section}.json")
}

pub fn read_to_string(path: &Path) -> Result<String, OutputError> {
    fs::read_to_string(path).map_err(|source| OutputError {
        action: "read",
        path: path.to_path_buf(),
        source,
    })
}

pub fn ensure_dir(dir: &Path) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(|source| OutputError {
        action: "create directory",
        path: dir.to_path_buf(),
        source,
    })
}

/// Replaces `path` with `contents` atomically.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), OutputError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let error = |source| OutputError {
        action: "write",
        path: path.to_path_buf(),
        source,
    };

    let mut file = NamedTempFile::new_in(dir).map_err(error)?;
    file.write_all(contents.as_bytes()).map_err(error)?;
    file.flush().map_err(error)?;
    file.persist(path).map_err(|e| error(e.error))?;
    Ok(())
}

/// Writes each fragment as `<dir>/<section>.json`.
pub fn write_pieces(dir: &Path, fragments: &[Fragment]) -> Result<(), OutputError> {
    ensure_dir(dir)?;
    for fragment in fragments {
        write_atomic(&dir.join(piece_file_name(&fragment.name)), &fragment.text)?;
    }
    info!("Wrote {} pieces to {}", fragments.len(), dir.display());
    Ok(())
}

/// Loads every `*.json` file in `dir` as a fragment named after the file stem, sorted by name.
pub fn read_pieces(dir: &Path) -> Result<Vec<Fragment>, OutputError> {
    let error = |source| OutputError {
        action: "list",
        path: dir.to_path_buf(),
        source,
    };
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(error)? {
        let path = entry.map_err(error)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| {
            let name = path.file_stem()?.to_string_lossy().to_string();
            Some((name, path))
        })
        .map(|(name, path)| {
            Ok(Fragment {
                name,
                text: read_to_string(&path)?,
            })
        })
        .collect()
}

/// Outcome of writing a batch of artifacts. A failed file does not stop the others.
#[derive(Debug, Default)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub failures: Vec<OutputError>,
}

impl WriteReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> WriteReport {
    let mut report = WriteReport::default();
    if let Err(error) = ensure_dir(dir) {
        report.failures.push(error);
        return report;
    }
    for artifact in artifacts {
        let path = dir.join(artifact_file_name(&artifact.section, &artifact.language));
        match write_atomic(&path, &artifact.text) {
            Ok(()) => report.written.push(path),
            Err(error) => report.failures.push(error),
        }
    }
    info!(
        "Wrote {} artifacts to {}",
        report.written.len(),
        dir.display()
    );
    report
}
