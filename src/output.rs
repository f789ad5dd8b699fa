//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each image leads with
//! its positional index in the batch and its file name; the source path, the
//! layout that was applied, and the cache outcome follow as indented context
//! lines. Read top to bottom, the output is an inventory of what happened to
//! every input.
//!
//! # Output Format
//!
//! ## Process
//!
//! ```text
//! Processing 3 images with profile default (crop)
//!     001 shoe-front.jpg → shoe-front.jpg
//!         Source: uploads/shoe-front.jpg
//!         Crop: 640x910+212+44
//!         Canvas: 1620x1620, content 1200x1200 at (210, 210)
//!         Output: encoded
//!     002 shoe-side.png → shoe-side.jpg
//!         Source: uploads/shoe-side.png
//!         Output: cached
//!     003 broken.jpg
//!         Source: uploads/broken.jpg
//!         Failed at decoded: unreadable image: ...
//!
//! Processed 2 of 3 images, 1 failed
//! Cache: 1 cached, 1 encoded (2 total)
//! ```
//!
//! ## Profiles
//!
//! ```text
//! alternate
//!     Content: 1620x1300
//!     Canvas: 1620x1620
//!     Placement: fixed at (0, 100)
//! default
//!     Content: 1200x1200
//!     Canvas: 1620x1620
//!     Placement: centered (210, 210)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::process::{BatchReport, OutputStatus, ProcessEvent};
use crate::profile::{Placement, ProfileTable};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Last path component, falling back to the whole path.
fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn status_label(status: OutputStatus) -> &'static str {
    match status {
        OutputStatus::Cached => "cached",
        OutputStatus::Copied => "copied",
        OutputStatus::Encoded => "encoded",
    }
}

// ============================================================================
// Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted {
            image_count,
            profile,
            mode,
        } => {
            let noun = if *image_count == 1 { "image" } else { "images" };
            vec![format!(
                "Processing {} {} with profile {} ({})",
                image_count, noun, profile, mode
            )]
        }
        ProcessEvent::ImageProcessed { index, image } => {
            let mut lines = vec![
                format!(
                    "{}{} {} \u{2192} {}",
                    indent(1),
                    format_index(*index),
                    file_name(&image.source),
                    file_name(&image.output)
                ),
                format!("{}Source: {}", indent(2), image.source.display()),
            ];
            if let Some(plan) = &image.plan {
                lines.push(format!("{}Crop: {}", indent(2), plan.crop));
                lines.push(format!(
                    "{}Canvas: {}, content {} at ({}, {})",
                    indent(2),
                    plan.canvas,
                    plan.resize,
                    plan.offset.left,
                    plan.offset.top
                ));
            }
            lines.push(format!("{}Output: {}", indent(2), status_label(image.status)));
            lines
        }
        ProcessEvent::ImageFailed { index, failure } => vec![
            format!(
                "{}{} {}",
                indent(1),
                format_index(*index),
                file_name(&failure.source)
            ),
            format!("{}Source: {}", indent(2), failure.source.display()),
            format!(
                "{}Failed at {}: {}",
                indent(2),
                failure.stage,
                failure.message
            ),
        ],
    }
}

/// Format the end-of-batch summary.
pub fn format_summary(report: &BatchReport) -> Vec<String> {
    let written = report.processed.len();
    let failed = report.failures.len();
    let total = written + failed;

    let mut lines = vec![String::new()];
    if failed == 0 {
        lines.push(format!("Processed {} of {} images", written, total));
    } else {
        lines.push(format!(
            "Processed {} of {} images, {} failed",
            written, total, failed
        ));
    }
    lines.push(format!("Cache: {}", report.cache));
    lines
}

/// Print the batch summary to stdout.
pub fn print_summary(report: &BatchReport) {
    for line in format_summary(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Profiles output
// ============================================================================

/// Format the profile table, one entry per profile in name order.
pub fn format_profiles(profiles: &ProfileTable) -> Vec<String> {
    let mut lines = Vec::new();
    for (name, profile) in profiles.iter() {
        lines.push(name.to_string());
        lines.push(format!("{}Content: {}", indent(1), profile.content));
        lines.push(format!("{}Canvas: {}", indent(1), profile.canvas));
        let placement = match profile.placement {
            Placement::Center => {
                let offset = profile.paste_offset();
                format!("centered ({}, {})", offset.left, offset.top)
            }
            fixed => fixed.to_string(),
        };
        lines.push(format!("{}Placement: {}", indent(1), placement));
    }
    lines
}

/// Print the profile table to stdout.
pub fn print_profiles(profiles: &ProfileTable) {
    for line in format_profiles(profiles) {
        println!("{}", line);
    }
}
