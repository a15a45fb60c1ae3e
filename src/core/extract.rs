// logvet - core/extract.rs
//
// The extraction core: given log text, a marker substring, a cutoff, and a
// timestamp format, keep the lines that mention the marker AND carry a
// bracketed timestamp at or after the cutoff.
//
// Core layer: pure functions over &str. No filesystem, no network, no wall
// clock. The cutoff is always supplied by the caller, so results are
// reproducible for any fixed input.

use crate::core::model::MatchedLine;
use crate::util::error::ScanError;
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write as _;

/// Result of scanning one body of log text.
///
/// Exclusions are silent by contract — a malformed line tells us nothing
/// and must not fail the scan — but they are counted here so callers can
/// log or display how much of the input was actually considered.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Lines that matched, in input order.
    pub matches: Vec<MatchedLine>,
    /// Total lines examined.
    pub lines_scanned: u64,
    /// Lines that contained the marker.
    pub marker_hits: u64,
    /// Marker lines dropped because no timestamp could be read from them.
    pub excluded_unparsable: u64,
    /// Marker lines dropped because their timestamp was before the cutoff.
    pub excluded_stale: u64,
}

/// Scan `text` for recent error lines.
///
/// A line is kept when BOTH hold:
///   1. It contains `marker`, case-insensitively, anywhere (plain substring
///      match — not a regex, not a whole-word match).
///   2. The text between the first `'['` and the first `']'` in the line
///      parses with `timestamp_format`, and the result is at or after
///      `cutoff` (the comparison is inclusive).
///
/// Kept lines are returned byte-identical to the input, in input order.
///
/// The bracket rule is deliberately the first `[` and the first `]` in the
/// whole line, with the `[` required to come first. A line whose timestamp
/// is preceded by some other bracketed token (`[boot] [Tue Sep 09 ...]`)
/// therefore fails to parse and is excluded. Checks built on this tool have
/// relied on that rule for years; do not "fix" it to find the first
/// well-formed pair.
///
/// Lines that satisfy the marker but not the timestamp are excluded
/// silently and counted (`excluded_unparsable` / `excluded_stale`). An
/// unusable `timestamp_format`, by contrast, is a configuration defect:
/// the scan refuses to run and no lines are examined at all.
///
/// Timestamps are parsed as naive date-times and compared to the naive
/// `cutoff` as-is. No timezone conversion is performed anywhere; callers
/// must ensure the cutoff lives in the same implicit timezone the log
/// writes. This is a documented limitation, not an oversight.
pub fn scan_text(
    text: &str,
    marker: &str,
    cutoff: NaiveDateTime,
    timestamp_format: &str,
) -> Result<ScanOutcome, ScanError> {
    if let Err(reason) = validate_timestamp_format(timestamp_format) {
        return Err(ScanError::InvalidTimestampFormat {
            format: timestamp_format.to_string(),
            reason,
        });
    }

    let marker_lower = marker.to_lowercase();
    let mut outcome = ScanOutcome::default();

    for (line_idx, line) in text.lines().enumerate() {
        outcome.lines_scanned += 1;

        if !line.to_lowercase().contains(&marker_lower) {
            continue;
        }
        outcome.marker_hits += 1;

        let Some(raw_stamp) = first_bracketed(line) else {
            outcome.excluded_unparsable += 1;
            continue;
        };
        let Some(stamp) = parse_stamp(raw_stamp, timestamp_format) else {
            outcome.excluded_unparsable += 1;
            continue;
        };
        if stamp < cutoff {
            outcome.excluded_stale += 1;
            continue;
        }

        outcome.matches.push(MatchedLine {
            line_number: (line_idx as u64) + 1,
            timestamp: stamp,
            text: line.to_string(),
        });
    }

    tracing::debug!(
        lines = outcome.lines_scanned,
        marker_hits = outcome.marker_hits,
        matches = outcome.matches.len(),
        unparsable = outcome.excluded_unparsable,
        stale = outcome.excluded_stale,
        "Scan completed"
    );

    Ok(outcome)
}

/// Convenience wrapper around [`scan_text`] returning just the surviving
/// lines, byte-identical and in input order.
pub fn extract_recent_errors(
    text: &str,
    marker: &str,
    cutoff: NaiveDateTime,
    timestamp_format: &str,
) -> Result<Vec<String>, ScanError> {
    let outcome = scan_text(text, marker, cutoff, timestamp_format)?;
    Ok(outcome.matches.into_iter().map(|m| m.text).collect())
}

/// Structural validation of a chrono format string, used both here (before
/// any line is scanned) and at profile load time.
///
/// chrono only surfaces an unknown `%` specifier when the format is
/// exercised, so this renders a fixed probe instant and requires the result
/// to parse back to at least a date. That rejects empty formats, unknown
/// specifiers, offset-demanding formats (timestamps here are naive), and
/// degenerate formats with no usable date fields — everything a scan could
/// never succeed with.
///
/// Returns `Err(reason)` with a human-readable explanation.
pub fn validate_timestamp_format(format: &str) -> Result<(), String> {
    if format.trim().is_empty() {
        return Err("format is empty".to_string());
    }

    // Probe components are compile-time constants; covered by tests.
    let probe = NaiveDate::from_ymd_opt(2001, 7, 8)
        .and_then(|d| d.and_hms_micro_opt(9, 5, 3, 420_137))
        .expect("probe timestamp components are valid");

    let mut rendered = String::new();
    if write!(rendered, "{}", probe.format(format)).is_err() {
        return Err("format contains an unsupported specifier".to_string());
    }

    if parse_stamp(&rendered, format).is_none() {
        return Err(format!(
            "format cannot recover a date from its own output ('{rendered}')"
        ));
    }

    Ok(())
}

/// The text between the first `'['` and the first `']'` in the line,
/// provided the `'['` comes first. `None` otherwise.
fn first_bracketed(line: &str) -> Option<&str> {
    let open = line.find('[')?;
    let close = line.find(']')?;
    if open < close {
        Some(&line[open + 1..close])
    } else {
        None
    }
}

/// Parse a raw bracketed timestamp using a chrono format string.
///
/// Strategy:
///   1. Direct `NaiveDateTime` parse with the given format.
///   2. Weekday-lenient retry. chrono cross-checks a parsed weekday name
///      against the computed date and rejects the whole parse on
///      disagreement, but the day name in a log stamp is decoration —
///      skewed clocks and hand-edited fixtures disagree routinely, and the
///      parsers this tool replaced never enforced consistency. When the
///      format leads with `%a`/`%A` and the value leads with a VALID day
///      name, retry with both stripped. An invalid token ("Xyz") still
///      fails the line.
///   3. `NaiveDate`-only parse for date-only formats such as `%Y-%m-%d`,
///      resolved to midnight.
///
/// The value is parsed exactly as extracted — no trimming, no separator
/// normalisation. A stamp padded with stray whitespace inside its brackets
/// fails, as it always has in the checks this tool replaced.
///
/// Returns `None` on failure; the caller counts and moves on.
fn parse_stamp(raw: &str, format: &str) -> Option<NaiveDateTime> {
    // First try: parse as a full NaiveDateTime with the format string.
    if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, format) {
        return Some(ndt);
    }

    // Second try: drop a leading weekday name from value and format.
    if let Some(ndt) = parse_ignoring_weekday(raw, format) {
        return Some(ndt);
    }

    // Third try: parse as NaiveDate only (for date-only formats like
    // "%Y-%m-%d"). Treat as midnight.
    if let Ok(nd) = NaiveDate::parse_from_str(raw, format) {
        if let Some(ndt) = nd.and_hms_opt(0, 0, 0) {
            return Some(ndt);
        }
    }

    None
}

/// Weekday-lenient parse: strip `%a`/`%A` from the front of the format and
/// the day-name token from the front of the value, then retry.
///
/// Only a LEADING weekday is handled — that is where bracketed log stamps
/// put it. The stripped token must itself be a real English day name
/// (abbreviated or full); arbitrary leading words stay errors.
fn parse_ignoring_weekday(value: &str, format: &str) -> Option<NaiveDateTime> {
    let fmt_rest = format
        .strip_prefix("%a")
        .or_else(|| format.strip_prefix("%A"))?;

    let token_end = value
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(value.len());
    let (token, value_rest) = value.split_at(token_end);
    if !is_weekday_name(token) {
        return None;
    }

    NaiveDateTime::parse_from_str(value_rest, fmt_rest).ok()
}

/// True when `token` is an English day name, full or three-letter,
/// case-insensitive.
fn is_weekday_name(token: &str) -> bool {
    const NAMES: [&str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    if token.is_empty() {
        return false;
    }
    let lower = token.to_ascii_lowercase();
    NAMES
        .iter()
        .any(|name| *name == lower || name.get(..3) == Some(lower.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Apache error_log stamp layout, the format this tool exists for.
    const APACHE_FORMAT: &str = "%a %b %d %H:%M:%S%.f %Y";

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn dt_micro(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, us: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_micro_opt(h, mi, s, us)
            .unwrap()
    }

    // ===== Core inclusion / exclusion =====

    #[test]
    fn test_includes_marker_line_with_recent_stamp() {
        let text = "[Wed Sep 09 12:34:56.789012 2025] [error] something broke";
        let result =
            extract_recent_errors(text, "[error]", dt(2025, 9, 9, 12, 30, 0), APACHE_FORMAT)
                .unwrap();
        assert_eq!(result, vec![text.to_string()], "line must survive verbatim");
    }

    #[test]
    fn test_excludes_stamp_before_cutoff() {
        let text = "[Wed Sep 09 12:34:56.789012 2025] [error] something broke";
        let outcome =
            scan_text(text, "[error]", dt(2025, 9, 9, 13, 0, 0), APACHE_FORMAT).unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.marker_hits, 1);
        assert_eq!(outcome.excluded_stale, 1);
    }

    #[test]
    fn test_excludes_marker_line_without_brackets() {
        let outcome = scan_text(
            "ERROR: disk full",
            "error",
            dt(2025, 9, 9, 12, 0, 0),
            APACHE_FORMAT,
        )
        .unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.marker_hits, 1);
        assert_eq!(outcome.excluded_unparsable, 1);
    }

    #[test]
    fn test_excludes_recent_stamp_without_marker() {
        let outcome = scan_text(
            "[Tue Sep 09 12:34:56.000000 2025] [notice] all fine",
            "[error]",
            dt(2025, 9, 9, 12, 0, 0),
            APACHE_FORMAT,
        )
        .unwrap();
        assert_eq!(outcome.marker_hits, 0);
        assert!(outcome.matches.is_empty());
    }

    #[test]
    fn test_mixed_lines_keep_input_order() {
        let text = "\
[Tue Sep 09 12:31:00.000000 2025] [error] first
[Tue Sep 09 12:32:00.000000 2025] [notice] ignored
[Tue Sep 09 11:00:00.000000 2025] [error] too old
[Tue Sep 09 12:33:00.000000 2025] [ERROR] second";
        let outcome =
            scan_text(text, "[error]", dt(2025, 9, 9, 12, 30, 0), APACHE_FORMAT).unwrap();
        let line_numbers: Vec<u64> = outcome.matches.iter().map(|m| m.line_number).collect();
        assert_eq!(line_numbers, vec![1, 4], "output must be an ordered subsequence");
        assert!(outcome.matches[0].text.ends_with("first"));
        assert!(outcome.matches[1].text.ends_with("second"));
        assert_eq!(outcome.lines_scanned, 4);
        assert_eq!(outcome.excluded_stale, 1);
    }

    #[test]
    fn test_marker_match_is_case_insensitive_substring() {
        let text = "[Tue Sep 09 12:34:56.000000 2025] An ERROR occurred mid-sentence";
        let result = extract_recent_errors(text, "error", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT)
            .unwrap();
        assert_eq!(result.len(), 1, "substring match must not require brackets or word boundaries");
    }

    #[test]
    fn test_empty_marker_makes_every_line_a_candidate() {
        // The core is deliberately permissive; profile validation is where
        // empty markers get rejected.
        let text = "\
[Tue Sep 09 12:34:56.000000 2025] quiet line
no stamp here at all";
        let outcome = scan_text(text, "", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT).unwrap();
        assert_eq!(outcome.marker_hits, 2);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.excluded_unparsable, 1);
    }

    // ===== Cutoff boundary =====

    #[test]
    fn test_cutoff_comparison_is_inclusive() {
        let cutoff = dt(2025, 9, 9, 12, 30, 0);
        let at = "[Tue Sep 09 12:30:00.000000 2025] [error] at cutoff";
        let before = "[Tue Sep 09 12:29:59.999999 2025] [error] just before";
        let after = "[Tue Sep 09 12:30:00.000001 2025] [error] just after";
        let text = format!("{at}\n{before}\n{after}");

        let result = extract_recent_errors(&text, "[error]", cutoff, APACHE_FORMAT).unwrap();
        assert_eq!(
            result,
            vec![at.to_string(), after.to_string()],
            "equal-to-cutoff is included; one microsecond earlier is not"
        );
    }

    #[test]
    fn test_microsecond_precision_survives_parsing() {
        let text = "[Tue Sep 09 12:30:00.000001 2025] [error] x";
        let outcome =
            scan_text(text, "[error]", dt(2025, 9, 9, 12, 30, 0), APACHE_FORMAT).unwrap();
        assert_eq!(
            outcome.matches[0].timestamp,
            dt_micro(2025, 9, 9, 12, 30, 0, 1)
        );
    }

    // ===== Determinism =====

    #[test]
    fn test_scan_is_idempotent() {
        let text = "\
[Tue Sep 09 12:31:00.000000 2025] [error] one
garbage line [error] no stamp
[Tue Sep 09 11:00:00.000000 2025] [error] stale";
        let cutoff = dt(2025, 9, 9, 12, 0, 0);
        let first = scan_text(text, "[error]", cutoff, APACHE_FORMAT).unwrap();
        let second = scan_text(text, "[error]", cutoff, APACHE_FORMAT).unwrap();
        assert_eq!(first.matches, second.matches);
        assert_eq!(first.lines_scanned, second.lines_scanned);
        assert_eq!(first.excluded_unparsable, second.excluded_unparsable);
        assert_eq!(first.excluded_stale, second.excluded_stale);
    }

    // ===== Bracket rule =====

    #[test]
    fn test_first_bracket_pair_wins_even_when_not_the_timestamp() {
        // Long-standing rule: the FIRST pair is taken, so a leading
        // bracketed token shadows the real timestamp and the line drops.
        let text = "[boot] [Tue Sep 09 12:34:56.000000 2025] [error] x";
        let outcome =
            scan_text(text, "[error]", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT).unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.excluded_unparsable, 1);
    }

    #[test]
    fn test_close_bracket_before_open_bracket_excludes_line() {
        let outcome = scan_text(
            "] stray close [error] then nothing",
            "[error]",
            dt(2025, 9, 9, 12, 0, 0),
            APACHE_FORMAT,
        )
        .unwrap();
        assert_eq!(outcome.excluded_unparsable, 1);
    }

    #[test]
    fn test_empty_bracket_pair_excludes_line() {
        let outcome = scan_text(
            "[] [error] nothing inside",
            "[error]",
            dt(2025, 9, 9, 12, 0, 0),
            APACHE_FORMAT,
        )
        .unwrap();
        assert_eq!(outcome.excluded_unparsable, 1);
    }

    // ===== Weekday leniency =====

    #[test]
    fn test_weekday_name_disagreeing_with_date_is_tolerated() {
        // 2025-09-09 is a Tuesday; the stamp says Wed. Apache never checks,
        // so neither do we.
        let text = "[Wed Sep 09 12:34:56.789012 2025] [error] skewed clock";
        let result =
            extract_recent_errors(text, "[error]", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT)
                .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_correct_weekday_name_also_parses() {
        let text = "[Tue Sep 09 12:34:56.789012 2025] [error] x";
        let result =
            extract_recent_errors(text, "[error]", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT)
                .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_invalid_weekday_token_excludes_line() {
        let text = "[Xyz Sep 09 12:34:56.789012 2025] [error] x";
        let outcome =
            scan_text(text, "[error]", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT).unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.excluded_unparsable, 1);
    }

    #[test]
    fn test_full_weekday_names_are_recognised() {
        assert!(is_weekday_name("Wednesday"));
        assert!(is_weekday_name("wed"));
        assert!(is_weekday_name("SUN"));
        assert!(!is_weekday_name("Wednes"));
        assert!(!is_weekday_name("Xyz"));
        assert!(!is_weekday_name(""));
    }

    // ===== Fractional seconds =====

    #[test]
    fn test_fractional_seconds_are_optional() {
        // %.f accepts both ".789012" and no fraction at all.
        let text = "[Tue Sep 09 12:34:56 2025] [error] whole seconds";
        let result =
            extract_recent_errors(text, "[error]", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT)
                .unwrap();
        assert_eq!(result.len(), 1);
    }

    // ===== Date-only formats =====

    #[test]
    fn test_date_only_format_parses_to_midnight() {
        let text = "[2025-09-09] [error] daily log";
        let included =
            extract_recent_errors(text, "[error]", dt(2025, 9, 9, 0, 0, 0), "%Y-%m-%d").unwrap();
        assert_eq!(included.len(), 1);

        let excluded =
            extract_recent_errors(text, "[error]", dt(2025, 9, 9, 0, 0, 1), "%Y-%m-%d").unwrap();
        assert!(excluded.is_empty(), "midnight is before 00:00:01");
    }

    // ===== Fatal format validation =====

    #[test]
    fn test_empty_format_is_fatal_before_any_line_is_scanned() {
        let err = scan_text(
            "[Tue Sep 09 12:34:56 2025] [error] x",
            "[error]",
            dt(2025, 9, 9, 12, 0, 0),
            "",
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::InvalidTimestampFormat { .. }));
    }

    #[test]
    fn test_unknown_specifier_is_fatal() {
        let err = scan_text("", "[error]", dt(2025, 9, 9, 12, 0, 0), "%q %Y").unwrap_err();
        assert!(matches!(err, ScanError::InvalidTimestampFormat { .. }));
    }

    #[test]
    fn test_literal_only_format_is_fatal() {
        let err = scan_text("", "[error]", dt(2025, 9, 9, 12, 0, 0), "hello").unwrap_err();
        assert!(matches!(err, ScanError::InvalidTimestampFormat { .. }));
    }

    #[test]
    fn test_offset_demanding_format_is_fatal() {
        // Timestamps are naive throughout; a format that needs a UTC offset
        // could never be satisfied.
        let err = scan_text(
            "",
            "[error]",
            dt(2025, 9, 9, 12, 0, 0),
            "%Y-%m-%d %H:%M:%S %z",
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::InvalidTimestampFormat { .. }));
    }

    #[test]
    fn test_validate_accepts_working_formats() {
        assert!(validate_timestamp_format(APACHE_FORMAT).is_ok());
        assert!(validate_timestamp_format("%Y-%m-%d %H:%M:%S%.f").is_ok());
        assert!(validate_timestamp_format("%Y-%m-%d").is_ok());
        assert!(validate_timestamp_format("%d-%b-%Y %H:%M:%S UTC").is_ok());
    }

    // ===== Degenerate input =====

    #[test]
    fn test_empty_input_yields_empty_result() {
        let outcome = scan_text("", "[error]", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT).unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.lines_scanned, 0);
        assert_eq!(outcome.marker_hits, 0);
    }

    #[test]
    fn test_padded_stamp_inside_brackets_is_excluded() {
        // The bracketed text is parsed exactly as extracted; stray padding
        // has always failed the parse and still does.
        let text = "[ Tue Sep 09 12:34:56.000000 2025 ] [error] padded stamp";
        let outcome =
            scan_text(text, "[error]", dt(2025, 9, 9, 12, 0, 0), APACHE_FORMAT).unwrap();
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.excluded_unparsable, 1);
    }
}
