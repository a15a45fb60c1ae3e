// logvet - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no
// platform dependencies.
//
// These types are the shared vocabulary across all layers.

use chrono::NaiveDateTime;
use serde::Serialize;

// =============================================================================
// Scan Profile (runtime representation)
// =============================================================================

/// Runtime representation of a scan profile after TOML parsing and
/// validation. This is what the extractor runs with.
///
/// Built from `ProfileDefinition` (the raw TOML structure) via validation.
#[derive(Debug, Clone)]
pub struct ScanProfile {
    /// Unique profile identifier (e.g. "apache-error").
    pub id: String,

    /// Human-readable name (e.g. "Apache httpd error log").
    pub name: String,

    /// Description of what this profile covers.
    pub description: String,

    /// Substring a line must contain to be a candidate. Matched
    /// case-insensitively, anywhere in the line.
    pub marker: String,

    /// chrono format string for the bracketed timestamp at the start of a
    /// candidate line. Timestamps are naive; the format must not demand a
    /// UTC offset.
    pub timestamp_format: String,

    /// Where this product's log usually lives, used when the caller gives
    /// no explicit path (e.g. "/var/log/apache2/error.log").
    pub default_path: Option<String>,

    /// Whether this is a built-in profile (true) or user-defined (false).
    pub is_builtin: bool,
}

// =============================================================================
// Matched line
// =============================================================================

/// A log line that satisfied both conditions: it contains the marker and
/// its bracketed timestamp is at or after the cutoff.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedLine {
    /// 1-based line number within the scanned text.
    pub line_number: u64,

    /// The parsed timestamp (naive; compared as-is against the cutoff).
    pub timestamp: NaiveDateTime,

    /// The full original line, byte-identical to the input.
    pub text: String,
}

// =============================================================================
// Scan Report
// =============================================================================

/// Everything known about one scanned source: the surviving lines plus
/// counters that make the silent exclusions observable.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// Display name of the source (path, "user@host:path", or "<stdin>").
    pub source: String,

    /// Profile the scan ran with.
    pub profile_id: String,

    /// Marker substring that was matched.
    pub marker: String,

    /// Cutoff the timestamps were compared against (inclusive).
    pub cutoff: NaiveDateTime,

    /// Lines that matched, in input order.
    pub matches: Vec<MatchedLine>,

    /// Total lines examined.
    pub lines_scanned: u64,

    /// Lines that contained the marker (before timestamp filtering).
    pub marker_hits: u64,

    /// Marker lines excluded because no timestamp could be read from them
    /// (no bracket pair, or the bracketed text did not parse).
    pub excluded_unparsable: u64,

    /// Marker lines excluded because their timestamp was before the cutoff.
    pub excluded_stale: u64,

    /// Wall-clock time spent reading and scanning this source.
    pub duration_ms: u64,
}

impl ScanReport {
    /// True when no recent error lines were found.
    pub fn is_clean(&self) -> bool {
        self.matches.is_empty()
    }
}

// =============================================================================
// Check Outcome
// =============================================================================

/// Result of checking a single source.
///
/// A missing source is a skip, not a failure: the check's verdict is about
/// what the log says, and an absent log says nothing. Callers that want
/// missing logs to fail the run use strict-missing mode, which surfaces
/// the underlying `SourceError` instead of producing this variant.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The source was read and scanned.
    Scanned(ScanReport),

    /// The source was absent; nothing was scanned.
    Skipped { source: String, reason: String },
}

impl CheckOutcome {
    /// Display name of the source this outcome describes.
    pub fn source(&self) -> &str {
        match self {
            Self::Scanned(report) => &report.source,
            Self::Skipped { source, .. } => source,
        }
    }

    /// True when this outcome contributes recent error lines to the verdict.
    pub fn has_findings(&self) -> bool {
        matches!(self, Self::Scanned(report) if !report.is_clean())
    }
}
