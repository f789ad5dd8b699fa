//! Input discovery.
//!
//! Expands the paths given on the command line into the list of images a
//! batch will process:
//!
//! - **Files** are taken as given, whatever their extension. The decoder is
//!   the judge of whether they are images.
//! - **Directories** are walked recursively. Hidden entries (`.name`) are
//!   skipped, and only files with a decodable extension are kept
//!   (see [`supported_input_extensions`]).
//! - The output directory is never scanned, so processing a folder into a
//!   subfolder of itself does not pick up earlier results.
//!
//! The result is sorted and de-duplicated, so batch order is stable across runs.

use crate::imaging::supported_input_extensions;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("input not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("no images found in the given inputs")]
    NoInputs,
}

/// True when the file extension has a decoder compiled in.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|ext| supported_input_extensions().contains(&ext.as_str()))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Expand files and directories into a sorted list of input images.
///
/// `exclude` names a directory whose contents are skipped (the output directory).
pub fn collect_inputs(
    inputs: &[PathBuf],
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>, ScanError> {
    let excluded = exclude.and_then(|p| p.canonicalize().ok());
    let mut found = BTreeSet::new();

    for input in inputs {
        if input.is_file() {
            found.insert(input.clone());
            continue;
        }
        if !input.is_dir() {
            return Err(ScanError::NotFound(input.clone()));
        }

        let walker = WalkDir::new(input)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                !is_hidden(entry)
                    && !excluded.as_ref().is_some_and(|ex| {
                        entry.path().canonicalize().is_ok_and(|p| &p == ex)
                    })
            });

        for entry in walker {
            let entry = entry.map_err(|source| ScanError::Walk {
                path: input.clone(),
                source,
            })?;
            if entry.file_type().is_file() && is_supported_image(entry.path()) {
                found.insert(entry.into_path());
            }
        }
    }

    if found.is_empty() {
        return Err(ScanError::NoInputs);
    }
    Ok(found.into_iter().collect())
}
