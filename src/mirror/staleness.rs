//! Preview staleness decision.
//!
//! A preview artifact is refreshed when any of three observations holds:
//! the artifact is missing, it records a prior failed fetch, or the table's
//! definition changed since it was last persisted. The failed-fetch case is
//! what makes errors self-healing: a worker that could not fetch a preview
//! writes the sentinel instead of raising, and the sentinel reads as stale
//! on every subsequent run until a fetch succeeds.

use std::fs;
use std::path::Path;

/// Leading line of a preview artifact produced by a failed fetch.
pub const ERROR_SENTINEL: &str = "-- Error retrieving preview";

/// Classification of the on-disk preview artifact.
///
/// An explicit state tag instead of string-sniffing at decision sites; only
/// `classify_preview` knows the sentinel encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    /// No artifact on disk (or one that cannot be read).
    Missing,
    /// Artifact records a prior failed fetch.
    Error(String),
    /// Artifact holds preview data.
    Ok,
}

/// Classify the preview artifact at `path`.
///
/// An unreadable artifact classifies as `Missing` so it is regenerated.
pub fn classify_preview(path: &Path) -> PreviewState {
    if !path.exists() {
        return PreviewState::Missing;
    }

    match fs::read_to_string(path) {
        Ok(content) => {
            let content = content.trim_start();
            if content.starts_with(ERROR_SENTINEL) {
                let reason = content
                    .lines()
                    .next()
                    .unwrap_or(ERROR_SENTINEL)
                    .trim_start_matches(ERROR_SENTINEL)
                    .trim_start_matches([' ', ':'])
                    .to_string();
                PreviewState::Error(reason)
            } else {
                PreviewState::Ok
            }
        }
        Err(_) => PreviewState::Missing,
    }
}

/// Read the previously persisted definition, if any.
///
/// An unreadable file reads as absent; the definition is rewritten
/// unconditionally afterwards anyway.
pub fn read_persisted_definition(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok()
}

/// The refresh decision.
///
/// `previous_definition` must be the content observed *before* the current
/// run overwrote the definition artifact. With no previously persisted
/// definition and a healthy preview, the preview is kept — there is nothing
/// to compare against.
pub fn needs_refresh(
    preview: &PreviewState,
    previous_definition: Option<&str>,
    current_definition: &str,
) -> bool {
    match preview {
        PreviewState::Missing | PreviewState::Error(_) => true,
        PreviewState::Ok => match previous_definition {
            Some(previous) => previous.trim() != current_definition.trim(),
            None => false,
        },
    }
}
