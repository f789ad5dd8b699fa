//! Output cache for repeated batch runs.
//!
//! Detection is cheap; the final encode (AVIF in particular) is not. When a
//! batch is re-run over a folder where most images are unchanged, this module
//! lets [`process`](crate::process) skip every image whose input bytes and
//! normalization settings match a previous run.
//!
//! ## Cache keys
//!
//! Entries are content-addressed by a pair of SHA-256 digests:
//!
//! - **`source_hash`**: the input file's bytes. Renaming or touching a file
//!   does not invalidate it; editing the pixels does.
//! - **`params_hash`**: everything that changes the output for the same input:
//!   profile geometry, crop mode, detection tunables, output format and quality.
//!
//! A hit requires a matching entry whose output file still exists. When the
//! stored output lives under a different name (the input was renamed), the
//! old file is copied to the new name instead of re-encoding.
//!
//! ## Storage
//!
//! `<output_dir>/.whitecrop-cache.json`. `--no-cache` starts from an empty
//! manifest; the previous outputs are simply overwritten.

use crate::imaging::ThresholdParams;
use crate::imaging::operations::EncodeSettings;
use crate::profile::{CropMode, OutputProfile, Placement};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".whitecrop-cache.json";

/// Bump to invalidate every existing cache when the key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// Hashes recorded for one output file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk map from output file name to the hashes that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: HashMap<String, CacheEntry>,
    /// `"{source_hash}:{params_hash}"` → output name. Rebuilt on load.
    #[serde(skip)]
    by_content: HashMap<String, String>,
}

fn content_key(source_hash: &str, params_hash: &str) -> String {
    format!("{source_hash}:{params_hash}")
}

impl CacheManifest {
    /// A manifest with no entries.
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
            by_content: HashMap::new(),
        }
    }

    /// Load from the output directory.
    ///
    /// A missing, unreadable, or outdated manifest yields an empty one.
    pub fn load(output_dir: &Path) -> Self {
        let path = manifest_path(output_dir);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::empty();
        };
        let mut manifest: Self = match serde_json::from_str(&content) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "ignoring unreadable cache manifest");
                return Self::empty();
            }
        };
        if manifest.version != MANIFEST_VERSION {
            return Self::empty();
        }
        manifest.by_content = manifest
            .entries
            .iter()
            .map(|(name, e)| (content_key(&e.source_hash, &e.params_hash), name.clone()))
            .collect();
        manifest
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Output name of a previous result for these hashes, if it is still on disk.
    pub fn find_cached(
        &self,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> Option<String> {
        let stored = self.by_content.get(&content_key(source_hash, params_hash))?;
        output_dir.join(stored).exists().then(|| stored.clone())
    }

    /// Record the hashes that produced `output_name`.
    ///
    /// Whatever the name held before is forgotten, and an older entry for the
    /// same content under another name is dropped.
    pub fn insert(&mut self, output_name: String, source_hash: String, params_hash: String) {
        self.remove(&output_name);
        let key = content_key(&source_hash, &params_hash);
        if let Some(old) = self.by_content.insert(key, output_name.clone()) {
            self.entries.remove(old.as_str());
        }
        self.entries.insert(
            output_name,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }

    /// Forget the entry for `output_name`, if any.
    pub fn remove(&mut self, output_name: &str) {
        let Some(entry) = self.entries.remove(output_name) else {
            return;
        };
        let key = content_key(&entry.source_hash, &entry.params_hash);
        if self.by_content.get(&key).is_some_and(|name| name == output_name) {
            self.by_content.remove(&key);
        }
    }
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}

/// SHA-256 of a byte buffer as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 over every setting that influences a normalized output.
pub fn hash_normalize_params(
    profile: &OutputProfile,
    mode: CropMode,
    threshold: &ThresholdParams,
    encode: &EncodeSettings,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"normalize\0");
    hasher.update(mode.as_str().as_bytes());
    hasher.update(b"\0");
    if mode == CropMode::Crop {
        for value in [
            profile.content.width,
            profile.content.height,
            profile.canvas.width,
            profile.canvas.height,
        ] {
            hasher.update(value.to_le_bytes());
        }
        match profile.placement {
            Placement::Center => hasher.update(b"\x00"),
            Placement::Fixed { left, top } => {
                hasher.update(b"\x01");
                hasher.update(left.to_le_bytes());
                hasher.update(top.to_le_bytes());
            }
        }
        hasher.update(threshold.multiplier.to_le_bytes());
        hasher.update(threshold.ceiling.to_le_bytes());
    }
    hasher.update(encode.format.to_string().as_bytes());
    hasher.update(b"\0");
    hasher.update(encode.quality.value().to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Cache outcome counts for one batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u32,
    pub copies: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn copy(&mut self) {
        self.copies += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.copies + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.hits, self.copies) {
            (0, 0) => write!(f, "{} encoded", self.misses),
            (hits, 0) => write!(
                f,
                "{hits} cached, {} encoded ({} total)",
                self.misses,
                self.total()
            ),
            (hits, copies) => write!(
                f,
                "{hits} cached, {copies} copied, {} encoded ({} total)",
                self.misses,
                self.total()
            ),
        }
    }
}
