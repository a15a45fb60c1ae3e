// logvet - core/report.rs
//
// Text, JSON, and CSV rendering of check outcomes.
// Core layer: writes to any Write trait object; the caller decides where
// the report goes (normally stdout).

use crate::core::model::CheckOutcome;
use crate::util::error::ReportError;
use std::io::Write;
use std::str::FromStr;

/// Report rendering format, selected with `--output`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(format!(
                "unknown output format '{other}' (expected text, json, or csv)"
            )),
        }
    }
}

/// Render the outcomes of a check run in the requested format.
pub fn write_report<W: Write>(
    outcomes: &[CheckOutcome],
    format: OutputFormat,
    writer: W,
) -> Result<(), ReportError> {
    match format {
        OutputFormat::Text => write_text(outcomes, writer),
        OutputFormat::Json => write_json(outcomes, writer),
        OutputFormat::Csv => write_csv(outcomes, writer),
    }
}

/// Human-readable report: one status line per source, the matched lines
/// verbatim beneath it, and a final verdict line.
pub fn write_text<W: Write>(outcomes: &[CheckOutcome], mut writer: W) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io { source };

    for outcome in outcomes {
        match outcome {
            CheckOutcome::Scanned(report) => {
                if report.is_clean() {
                    writeln!(
                        writer,
                        "OK   {}: no recent error lines \
                         (scanned {}, marker hits {}, stale {}, unparsable {})",
                        report.source,
                        report.lines_scanned,
                        report.marker_hits,
                        report.excluded_stale,
                        report.excluded_unparsable,
                    )
                    .map_err(io_err)?;
                } else {
                    writeln!(
                        writer,
                        "FAIL {}: {} recent error line(s) since {} \
                         (scanned {}, marker hits {}, stale {}, unparsable {})",
                        report.source,
                        report.matches.len(),
                        report.cutoff,
                        report.lines_scanned,
                        report.marker_hits,
                        report.excluded_stale,
                        report.excluded_unparsable,
                    )
                    .map_err(io_err)?;
                    for matched in &report.matches {
                        writeln!(writer, "  {}: {}", matched.line_number, matched.text)
                            .map_err(io_err)?;
                    }
                }
            }
            CheckOutcome::Skipped { source, reason } => {
                writeln!(writer, "SKIP {source}: {reason}").map_err(io_err)?;
            }
        }
    }

    let scanned = outcomes
        .iter()
        .filter(|o| matches!(o, CheckOutcome::Scanned(_)))
        .count();
    let skipped = outcomes.len() - scanned;
    let dirty = outcomes.iter().filter(|o| o.has_findings()).count();
    let total_matches: usize = outcomes
        .iter()
        .map(|o| match o {
            CheckOutcome::Scanned(r) => r.matches.len(),
            CheckOutcome::Skipped { .. } => 0,
        })
        .sum();

    writeln!(writer).map_err(io_err)?;
    if dirty > 0 {
        writeln!(
            writer,
            "FOUND {total_matches} recent error line(s) in {dirty} of {scanned} scanned source(s)"
        )
        .map_err(io_err)?;
    } else {
        writeln!(writer, "No recent error lines in {scanned} scanned source(s)").map_err(io_err)?;
    }
    if skipped > 0 {
        writeln!(writer, "{skipped} source(s) skipped").map_err(io_err)?;
    }

    Ok(())
}

/// JSON report: the outcome list serialized as-is, pretty-printed.
/// Each element carries a `status` tag ("scanned" or "skipped").
pub fn write_json<W: Write>(outcomes: &[CheckOutcome], mut writer: W) -> Result<(), ReportError> {
    serde_json::to_writer_pretty(&mut writer, outcomes)
        .map_err(|e| ReportError::Json { source: e })?;
    writeln!(writer).map_err(|e| ReportError::Io { source: e })?;
    Ok(())
}

/// CSV report: one row per matched line. Skipped sources and clean sources
/// contribute no rows.
///
/// Writes: source, line, timestamp, text
pub fn write_csv<W: Write>(outcomes: &[CheckOutcome], writer: W) -> Result<(), ReportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(["source", "line", "timestamp", "text"])
        .map_err(|e| ReportError::Csv { source: e })?;

    for outcome in outcomes {
        let CheckOutcome::Scanned(report) = outcome else {
            continue;
        };
        for matched in &report.matches {
            csv_writer
                .write_record([
                    report.source.as_str(),
                    &matched.line_number.to_string(),
                    &matched.timestamp.to_string(),
                    &matched.text,
                ])
                .map_err(|e| ReportError::Csv { source: e })?;
        }
    }

    csv_writer
        .flush()
        .map_err(|e| ReportError::Io { source: e })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{MatchedLine, ScanReport};
    use chrono::NaiveDate;

    fn sample_report(source: &str, matched: &[(u64, &str)]) -> CheckOutcome {
        let cutoff = NaiveDate::from_ymd_opt(2025, 9, 9)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        CheckOutcome::Scanned(ScanReport {
            source: source.to_string(),
            profile_id: "apache-error".to_string(),
            marker: "[error]".to_string(),
            cutoff,
            matches: matched
                .iter()
                .map(|(line_number, text)| MatchedLine {
                    line_number: *line_number,
                    timestamp: cutoff,
                    text: text.to_string(),
                })
                .collect(),
            lines_scanned: 10,
            marker_hits: matched.len() as u64 + 1,
            excluded_unparsable: 0,
            excluded_stale: 1,
            duration_ms: 3,
        })
    }

    fn sample_skip(source: &str) -> CheckOutcome {
        CheckOutcome::Skipped {
            source: source.to_string(),
            reason: format!("Log source '{source}' does not exist"),
        }
    }

    #[test]
    fn test_text_report_lists_matches_verbatim() {
        let outcomes = vec![
            sample_report("error.log", &[(3, "[Tue Sep 09 12:31:00 2025] [error] boom")]),
            sample_report("clean.log", &[]),
            sample_skip("gone.log"),
        ];
        let mut buf = Vec::new();
        write_text(&outcomes, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains("FAIL error.log: 1 recent error line(s)"));
        assert!(output.contains("  3: [Tue Sep 09 12:31:00 2025] [error] boom"));
        assert!(output.contains("OK   clean.log"));
        assert!(output.contains("SKIP gone.log"));
        assert!(output.contains("FOUND 1 recent error line(s) in 1 of 2 scanned source(s)"));
        assert!(output.contains("1 source(s) skipped"));
    }

    #[test]
    fn test_text_report_all_clean() {
        let outcomes = vec![sample_report("clean.log", &[])];
        let mut buf = Vec::new();
        write_text(&outcomes, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains("No recent error lines in 1 scanned source(s)"));
        assert!(!output.contains("FOUND"));
    }

    #[test]
    fn test_json_report_tags_outcomes_with_status() {
        let outcomes = vec![
            sample_report("error.log", &[(1, "[x] [error] y")]),
            sample_skip("gone.log"),
        ];
        let mut buf = Vec::new();
        write_json(&outcomes, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.contains(r#""status": "scanned""#));
        assert!(output.contains(r#""status": "skipped""#));
        assert!(output.contains(r#""marker": "[error]""#));
        // Must round-trip as JSON.
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_csv_report_one_row_per_match() {
        let outcomes = vec![
            sample_report(
                "error.log",
                &[(3, "[a] [error] one"), (7, "[b] [error] two")],
            ),
            sample_skip("gone.log"),
        ];
        let mut buf = Vec::new();
        write_csv(&outcomes, &mut buf).unwrap();
        let output = String::from_utf8(buf).unwrap();

        assert!(output.starts_with("source,line,timestamp,text"));
        assert_eq!(output.lines().count(), 3, "header plus two match rows");
        assert!(output.contains("error.log,3,"));
        assert!(output.contains("error.log,7,"));
        assert!(!output.contains("gone.log"), "skips contribute no rows");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
