//! Batch processing.
//!
//! Takes a set of input paths, runs every discovered image through the crop
//! pipeline, and writes the results into an output directory.
//!
//! ## Output Structure
//!
//! ```text
//! processed/
//! ├── .whitecrop-cache.json     # Cache manifest (see crate::cache)
//! ├── shoe-front.jpg            # <input stem>.<format extension>
//! └── shoe-side.jpg
//! ```
//!
//! ## Two Phases
//!
//! 1. **Compute** (parallel, [rayon](https://docs.rs/rayon)): read, hash,
//!    consult the cache, normalize. Outputs reused under a new name are read
//!    here, so a copy never sees a file rewritten later in the same run.
//! 2. **Write** (sequential, in input order): write outputs, update the cache
//!    manifest, emit progress events.
//!
//! Keeping writes out of the parallel phase is what makes `fail_fast` cheap:
//! when it is set and any image failed, the write phase never runs.
//!
//! ## Batch Policy
//!
//! - `processing.fail_fast = false` (default): every image that succeeds is
//!   written; failures are collected into the [`BatchReport`]. An output that
//!   cannot be written is one more failure at [`Stage::Encoded`].
//! - `processing.fail_fast = true`: a single failure returns
//!   [`ProcessError::BatchFailed`] and nothing is written.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::AppConfig;
use crate::imaging::{
    CompositionPlan, ImageBackend, Normalizer, PipelineError, RustBackend, Stage,
};
use crate::profile::{CropMode, OutputProfile};
use crate::scan::{self, ScanError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("invalid request: {0}")]
    Request(#[from] PipelineError),
    #[error("{} of {total} images failed, nothing was written", .failures.len())]
    BatchFailed {
        total: usize,
        failures: Vec<ImageFailure>,
    },
}

/// One batch to run.
#[derive(Debug, Clone)]
pub struct ProcessRequest {
    /// Files and directories to process.
    pub inputs: Vec<PathBuf>,
    /// Where outputs and the cache manifest are written.
    pub output_dir: PathBuf,
    /// Profile name, looked up in the config's profile table.
    pub profile: String,
    pub mode: CropMode,
}

/// How an output file came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStatus {
    /// Existing output matched the input and settings.
    Cached,
    /// Copied from a previous output with identical content.
    Copied,
    /// Freshly normalized and encoded.
    Encoded,
}

/// A written output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedImage {
    pub source: PathBuf,
    pub output: PathBuf,
    pub status: OutputStatus,
    /// Layout applied; absent for `no-crop` and for cache hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<CompositionPlan>,
}

/// An image that produced no output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageFailure {
    pub source: PathBuf,
    pub stage: Stage,
    pub message: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub profile: String,
    pub mode: CropMode,
    pub processed: Vec<ProcessedImage>,
    pub failures: Vec<ImageFailure>,
    pub cache: CacheStats,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Progress events, sent in input order during the write phase.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    BatchStarted {
        image_count: usize,
        profile: String,
        mode: CropMode,
    },
    ImageProcessed {
        /// 1-based position in the sorted input list.
        index: usize,
        image: ProcessedImage,
    },
    ImageFailed {
        index: usize,
        failure: ImageFailure,
    },
}

pub fn process(
    request: &ProcessRequest,
    config: &AppConfig,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let backend = RustBackend::new();
    process_with_backend(&backend, request, config, use_cache, events)
}

/// Work item for one input.
struct Job {
    index: usize,
    source: PathBuf,
    output_name: String,
}

/// Outcome of the compute phase for one input.
enum Computed {
    /// The output on disk under this job's name is current.
    Cached { source_hash: String },
    /// Contents of an earlier output with identical inputs.
    Copy { bytes: Vec<u8>, source_hash: String },
    Encoded {
        bytes: Vec<u8>,
        plan: Option<CompositionPlan>,
        source_hash: String,
    },
}

/// Process a batch using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    request: &ProcessRequest,
    config: &AppConfig,
    use_cache: bool,
    events: Option<Sender<ProcessEvent>>,
) -> Result<BatchReport, ProcessError> {
    let encode = config.encode_settings();
    let normalizer = Normalizer::new(backend, &config.profiles, config.detection, encode);
    let profile = normalizer.profile(&request.profile)?;

    let sources = scan::collect_inputs(&request.inputs, Some(&request.output_dir))?;
    let total = sources.len();
    let extension = encode.format.extension();
    let params_hash = cache::hash_normalize_params(profile, request.mode, &config.detection, &encode);

    let cache_manifest = if use_cache {
        CacheManifest::load(&request.output_dir)
    } else {
        CacheManifest::empty()
    };

    let (jobs, collisions) = plan_jobs(sources, extension);

    let computed: Vec<(Job, Result<Computed, ImageFailure>)> = jobs
        .into_par_iter()
        .map(|job| {
            let result = compute_one(
                &normalizer,
                profile,
                request,
                &cache_manifest,
                &params_hash,
                &job,
            );
            (job, result)
        })
        .collect();

    let mut outcomes: Vec<(usize, PathBuf, Result<(String, Computed), ImageFailure>)> = computed
        .into_iter()
        .map(|(job, result)| {
            (
                job.index,
                job.source,
                result.map(|c| (job.output_name, c)),
            )
        })
        .chain(
            collisions
                .into_iter()
                .map(|(index, failure)| (index, failure.source.clone(), Err(failure))),
        )
        .collect();
    outcomes.sort_by_key(|(index, _, _)| *index);

    if config.processing.fail_fast {
        let failures: Vec<ImageFailure> = outcomes
            .iter()
            .filter_map(|(_, _, r)| r.as_ref().err().cloned())
            .collect();
        if !failures.is_empty() {
            for failure in &failures {
                warn!(source = %failure.source.display(), stage = %failure.stage, "{}", failure.message);
            }
            return Err(ProcessError::BatchFailed { total, failures });
        }
    }

    std::fs::create_dir_all(&request.output_dir)?;
    emit(
        &events,
        ProcessEvent::BatchStarted {
            image_count: total,
            profile: request.profile.clone(),
            mode: request.mode,
        },
    );

    let mut cache_manifest = cache_manifest;
    let mut stats = CacheStats::default();
    let mut processed = Vec::new();
    let mut failures = Vec::new();

    for (index, source, outcome) in outcomes {
        let (output_name, computed) = match outcome {
            Ok(ok) => ok,
            Err(failure) => {
                warn!(source = %failure.source.display(), stage = %failure.stage, "{}", failure.message);
                emit(
                    &events,
                    ProcessEvent::ImageFailed {
                        index,
                        failure: failure.clone(),
                    },
                );
                failures.push(failure);
                continue;
            }
        };

        let output = request.output_dir.join(&output_name);
        if let Err(e) = write_output(&output, &computed) {
            cache_manifest.remove(&output_name);
            let failure = ImageFailure {
                source,
                stage: Stage::Encoded,
                message: format!("cannot write {}: {e}", output.display()),
            };
            warn!(source = %failure.source.display(), stage = %failure.stage, "{}", failure.message);
            emit(
                &events,
                ProcessEvent::ImageFailed {
                    index,
                    failure: failure.clone(),
                },
            );
            failures.push(failure);
            continue;
        }

        let (status, plan, source_hash) = match computed {
            Computed::Cached { source_hash } => {
                stats.hit();
                (OutputStatus::Cached, None, source_hash)
            }
            Computed::Copy { source_hash, .. } => {
                stats.copy();
                (OutputStatus::Copied, None, source_hash)
            }
            Computed::Encoded {
                plan, source_hash, ..
            } => {
                stats.miss();
                (OutputStatus::Encoded, plan, source_hash)
            }
        };
        cache_manifest.insert(output_name, source_hash, params_hash.clone());
        info!(source = %source.display(), output = %output.display(), ?status, "image written");

        let image = ProcessedImage {
            source,
            output,
            status,
            plan,
        };
        emit(
            &events,
            ProcessEvent::ImageProcessed {
                index,
                image: image.clone(),
            },
        );
        processed.push(image);
    }

    cache_manifest.save(&request.output_dir)?;

    Ok(BatchReport {
        profile: request.profile.clone(),
        mode: request.mode,
        processed,
        failures,
        cache: stats,
    })
}

fn write_output(output: &Path, computed: &Computed) -> std::io::Result<()> {
    match computed {
        Computed::Cached { .. } => Ok(()),
        Computed::Copy { bytes, .. } | Computed::Encoded { bytes, .. } => {
            std::fs::write(output, bytes)
        }
    }
}

fn emit(events: &Option<Sender<ProcessEvent>>, event: ProcessEvent) {
    if let Some(tx) = events {
        tx.send(event).ok();
    }
}

/// Output file name for a source: `<stem>.<extension>`.
pub fn output_name(source: &Path, extension: &str) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    format!("{stem}.{extension}")
}

/// Assign output names. Later inputs whose name is already taken fail.
fn plan_jobs(sources: Vec<PathBuf>, extension: &str) -> (Vec<Job>, Vec<(usize, ImageFailure)>) {
    let mut taken: HashMap<String, PathBuf> = HashMap::new();
    let mut jobs = Vec::new();
    let mut collisions = Vec::new();

    for (i, source) in sources.into_iter().enumerate() {
        let index = i + 1;
        let name = output_name(&source, extension);
        if let Some(first) = taken.get(&name) {
            let message = format!(
                "output name {name} is already used by {}",
                first.display()
            );
            collisions.push((
                index,
                ImageFailure {
                    source,
                    stage: Stage::Received,
                    message,
                },
            ));
            continue;
        }
        taken.insert(name.clone(), source.clone());
        jobs.push(Job {
            index,
            source,
            output_name: name,
        });
    }
    (jobs, collisions)
}

fn compute_one<B: ImageBackend>(
    normalizer: &Normalizer<'_, B>,
    profile: &OutputProfile,
    request: &ProcessRequest,
    cache_manifest: &CacheManifest,
    params_hash: &str,
    job: &Job,
) -> Result<Computed, ImageFailure> {
    let bytes = std::fs::read(&job.source).map_err(|e| ImageFailure {
        source: job.source.clone(),
        stage: Stage::Received,
        message: format!("cannot read input: {e}"),
    })?;
    let source_hash = cache::hash_bytes(&bytes);

    if let Some(stored) = cache_manifest.find_cached(&source_hash, params_hash, &request.output_dir)
    {
        if stored == job.output_name {
            return Ok(Computed::Cached { source_hash });
        }
        match std::fs::read(request.output_dir.join(&stored)) {
            Ok(bytes) => return Ok(Computed::Copy { bytes, source_hash }),
            Err(e) => debug!(stored = %stored, "cached output unreadable, re-encoding: {e}"),
        }
    }

    let normalized = normalizer
        .normalize_with(&bytes, profile, request.mode)
        .map_err(|e| ImageFailure {
            source: job.source.clone(),
            stage: e.stage,
            message: e.kind.to_string(),
        })?;

    Ok(Computed::Encoded {
        bytes: normalized.bytes,
        plan: normalized.plan,
        source_hash,
    })
}
