// logvet - app/check.rs
//
// Check-run orchestration: turn a plan (profile + cutoff + targets) into an
// ordered list of per-source outcomes.
//
// Cutoff policy lives here, not in the core. The core compares against
// whatever naive instant it is given; this layer is the only place that
// reads the wall clock ("now minus window") or parses a --since string.

use crate::core::extract;
use crate::core::model::{CheckOutcome, ScanProfile, ScanReport};
use crate::platform::{local, remote};
use crate::util::error::{LogVetError, SourceError};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Formats accepted by `--since`, tried in order. A date-only value means
/// midnight at the start of that day.
const CUTOFF_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Where the log text comes from.
#[derive(Debug, Clone)]
pub enum Targets {
    /// Piped standard input.
    Stdin,

    /// Local files, scanned in parallel.
    Files(Vec<PathBuf>),

    /// Paths on a remote host, fetched over one shared SSH session.
    Remote {
        host: String,
        port: u16,
        user: String,
        password: String,
        paths: Vec<String>,
    },
}

/// Everything a check run needs, assembled by the CLI layer.
#[derive(Debug, Clone)]
pub struct CheckPlan {
    /// Profile the scan runs with (marker + timestamp format).
    pub profile: ScanProfile,

    /// Lines at or after this instant are "recent" (inclusive).
    pub cutoff: NaiveDateTime,

    /// When true, a missing source fails the run instead of being skipped.
    pub strict_missing: bool,

    /// The sources to check.
    pub targets: Targets,
}

/// Cutoff for a relative recency window: naive local now minus `minutes`.
///
/// Local (not UTC) because the logs this tool checks stamp lines in the
/// host's local time and carry no offset to convert with.
pub fn cutoff_from_window(minutes: i64) -> NaiveDateTime {
    Local::now().naive_local() - Duration::minutes(minutes)
}

/// Parse an absolute `--since` cutoff.
///
/// Accepts ISO-ish date-times with an optional `T` separator and optional
/// fractional seconds, or a bare date (midnight).
pub fn parse_cutoff(value: &str) -> Result<NaiveDateTime, String> {
    for format in CUTOFF_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(ndt);
        }
    }
    if let Ok(nd) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(ndt) = nd.and_hms_opt(0, 0, 0) {
            return Ok(ndt);
        }
    }
    Err(format!(
        "could not parse '{value}' as a cutoff timestamp \
         (expected e.g. 2025-09-09T12:30:00 or 2025-09-09)"
    ))
}

/// Run the check: acquire each target, scan it, and return one outcome per
/// source in target order.
///
/// A source that does not exist becomes `CheckOutcome::Skipped` unless the
/// plan is strict about missing sources. Any other acquisition failure, and
/// any scan configuration failure, aborts the run.
pub fn run_check(plan: &CheckPlan) -> Result<Vec<CheckOutcome>, LogVetError> {
    tracing::info!(
        profile = %plan.profile.id,
        cutoff = %plan.cutoff,
        strict_missing = plan.strict_missing,
        "Check run starting"
    );

    match &plan.targets {
        Targets::Stdin => {
            let started = Instant::now();
            let text = local::read_stdin()?;
            let outcome = scan_source("<stdin>".to_string(), &text, plan, started)?;
            Ok(vec![outcome])
        }

        Targets::Files(paths) => paths
            .par_iter()
            .map(|path| {
                let started = Instant::now();
                let source = path.display().to_string();
                match local::read_log_file(path) {
                    Ok(text) => scan_source(source, &text, plan, started),
                    Err(e) => skip_or_fail(source, e, plan.strict_missing),
                }
            })
            .collect(),

        Targets::Remote {
            host,
            port,
            user,
            password,
            paths,
        } => {
            let session = remote::RemoteSession::connect(host, *port, user, password)?;
            paths
                .iter()
                .map(|path| {
                    let started = Instant::now();
                    let source = session.source_name(path);
                    match session.fetch_log(path) {
                        Ok(text) => scan_source(source, &text, plan, started),
                        Err(e) => skip_or_fail(source, e, plan.strict_missing),
                    }
                })
                .collect()
        }
    }
}

/// True when any outcome carries recent error lines; this is the process
/// verdict (exit code 1).
pub fn found_recent_errors(outcomes: &[CheckOutcome]) -> bool {
    outcomes.iter().any(CheckOutcome::has_findings)
}

/// Scan acquired text and package the result with its source name and
/// timing.
fn scan_source(
    source: String,
    text: &str,
    plan: &CheckPlan,
    started: Instant,
) -> Result<CheckOutcome, LogVetError> {
    let outcome = extract::scan_text(
        text,
        &plan.profile.marker,
        plan.cutoff,
        &plan.profile.timestamp_format,
    )?;

    Ok(CheckOutcome::Scanned(ScanReport {
        source,
        profile_id: plan.profile.id.clone(),
        marker: plan.profile.marker.clone(),
        cutoff: plan.cutoff,
        matches: outcome.matches,
        lines_scanned: outcome.lines_scanned,
        marker_hits: outcome.marker_hits,
        excluded_unparsable: outcome.excluded_unparsable,
        excluded_stale: outcome.excluded_stale,
        duration_ms: started.elapsed().as_millis() as u64,
    }))
}

/// Missing-source policy: an absent log says nothing about recent errors,
/// so it is a skip unless the caller asked for strictness. Every other
/// acquisition failure is fatal regardless.
fn skip_or_fail(
    source: String,
    error: SourceError,
    strict_missing: bool,
) -> Result<CheckOutcome, LogVetError> {
    match error {
        SourceError::NotFound { .. } if !strict_missing => {
            tracing::warn!(source = %source, "Source missing; skipping");
            Ok(CheckOutcome::Skipped {
                reason: error.to_string(),
                source,
            })
        }
        other => Err(other.into()),
    }
}
