// logvet - platform/local.rs
//
// Local log acquisition: whole-file reads and piped stdin.
//
// Log files are decoded lossily -- a stray invalid byte in a multi-gigabyte
// error log must not abort the check, and the lines the scan cares about
// are plain ASCII anyway. Replacement characters only ever land in lines
// the marker match then ignores.

use crate::util::constants;
use crate::util::error::SourceError;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;

/// Retry limits for transient I/O errors.
const MAX_RETRIES: u32 = 3;
const RETRY_DELAYS_MS: [u64; 3] = [50, 100, 200];

/// Read the full content of a local log file.
///
/// Missing files map to `SourceError::NotFound` so the check runner can
/// downgrade them to a skip. Files larger than the size cap are refused.
/// Large files are memory-mapped; small files use a buffered read with
/// transient-error retries.
pub fn read_log_file(path: &Path) -> Result<String, SourceError> {
    let metadata = std::fs::metadata(path).map_err(|e| io_to_source(path, "stat", e))?;

    if metadata.is_dir() {
        return Err(SourceError::Io {
            path: path.to_path_buf(),
            operation: "open",
            source: io::Error::new(io::ErrorKind::InvalidInput, "is a directory, not a file"),
        });
    }

    let size = metadata.len();
    if size > constants::MAX_SOURCE_BYTES {
        return Err(SourceError::TooLarge {
            path: path.display().to_string(),
            size,
            max: constants::MAX_SOURCE_BYTES,
        });
    }

    if size >= constants::LARGE_FILE_THRESHOLD {
        read_large_file(path)
    } else {
        read_small_file_with_retry(path)
    }
}

/// Read piped standard input to the end.
///
/// The same byte cap that applies to files applies here: a runaway pipe
/// must not exhaust memory just because it has no size to stat up front.
pub fn read_stdin() -> Result<String, SourceError> {
    read_bounded(io::stdin().lock(), constants::MAX_SOURCE_BYTES)
}

/// Bounded read for sources whose size is only known once read. Reads at
/// most `cap + 1` bytes; the extra byte distinguishes "exactly at the cap"
/// from "over it".
fn read_bounded<R: Read>(reader: R, cap: u64) -> Result<String, SourceError> {
    let mut bytes = Vec::new();
    reader
        .take(cap + 1)
        .read_to_end(&mut bytes)
        .map_err(|e| SourceError::Stdin { source: e })?;
    if bytes.len() as u64 > cap {
        return Err(SourceError::TooLarge {
            path: "<stdin>".to_string(),
            size: bytes.len() as u64,
            max: cap,
        });
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read using `memmap2` for large files (avoids allocating an intermediate
/// buffer before decoding).
fn read_large_file(path: &Path) -> Result<String, SourceError> {
    let file = std::fs::File::open(path).map_err(|e| io_to_source(path, "open", e))?;
    // SAFETY: the file is read-only and we do not mutate the map.
    // We accept the documented risk that external modification of the file
    // during the map's lifetime could produce undefined behaviour, which is
    // acceptable for a checker reading already-written log files.
    let mmap =
        unsafe { memmap2::Mmap::map(&file) }.map_err(|e| io_to_source(path, "mmap", e))?;
    Ok(String::from_utf8_lossy(&mmap).into_owned())
}

/// Read a small file with transient-error retries.
fn read_small_file_with_retry(path: &Path) -> Result<String, SourceError> {
    let mut last_err: Option<io::Error> = None;

    for attempt in 0..MAX_RETRIES {
        match std::fs::read(path) {
            Ok(bytes) => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) if is_transient_error(&e) => {
                tracing::debug!(
                    file = %path.display(),
                    attempt = attempt + 1,
                    error = %e,
                    "Transient I/O error, retrying"
                );
                std::thread::sleep(Duration::from_millis(RETRY_DELAYS_MS[attempt as usize]));
                last_err = Some(e);
            }
            Err(e) => return Err(io_to_source(path, "read", e)), // Permanent error; do not retry.
        }
    }

    let source = last_err.unwrap_or_else(|| io::Error::other("Unknown read error"));
    Err(io_to_source(path, "read", source))
}

/// Returns true for transient I/O errors that are worth retrying.
fn is_transient_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted | io::ErrorKind::TimedOut
    )
}

/// Map an `io::Error` to a `SourceError`, keeping NotFound distinct so the
/// caller can treat an absent log as a skip rather than a failure.
fn io_to_source(path: &Path, operation: &'static str, e: io::Error) -> SourceError {
    if e.kind() == io::ErrorKind::NotFound {
        SourceError::NotFound {
            path: path.display().to_string(),
        }
    } else {
        SourceError::Io {
            path: path.to_path_buf(),
            operation,
            source: e,
        }
    }
}
