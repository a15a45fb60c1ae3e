// logvet - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// No string-based error propagation; every error keeps its causal chain
// for diagnostic logging.
//
// Note the split that runs through the whole tool: a log LINE that cannot
// be parsed is never an error (it is silently excluded and counted), while
// a CONFIGURATION that cannot work (bad timestamp format, empty marker) is
// always fatal.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all logvet operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum LogVetError {
    /// Profile loading or validation failed.
    Profile(ProfileError),

    /// The scan was given configuration it cannot honour.
    Scan(ScanError),

    /// A log source could not be acquired.
    Source(SourceError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Report rendering failed.
    Report(ReportError),
}

impl fmt::Display for LogVetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile(e) => write!(f, "Profile error: {e}"),
            Self::Scan(e) => write!(f, "Scan error: {e}"),
            Self::Source(e) => write!(f, "Source error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Report(e) => write!(f, "Report error: {e}"),
        }
    }
}

impl std::error::Error for LogVetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Profile(e) => Some(e),
            Self::Scan(e) => Some(e),
            Self::Source(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Report(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile errors
// ---------------------------------------------------------------------------

/// Errors related to scan profile loading and validation.
#[derive(Debug)]
pub enum ProfileError {
    /// TOML file could not be parsed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Profile file exceeds the maximum allowed size.
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// A required field is missing or empty in the profile definition.
    MissingField {
        profile_id: String,
        field: &'static str,
    },

    /// A text field exceeds the maximum allowed length.
    FieldTooLong {
        profile_id: String,
        field: &'static str,
        length: usize,
        max_length: usize,
    },

    /// A timestamp format string is structurally invalid.
    InvalidTimestampFormat {
        profile_id: String,
        format: String,
        reason: String,
    },

    /// Duplicate profile ID detected (user profile overriding built-in is OK,
    /// but two user profiles with the same ID is an error).
    DuplicateId {
        id: String,
        path1: PathBuf,
        path2: PathBuf,
    },

    /// Maximum number of profiles exceeded.
    TooManyProfiles { count: usize, max: usize },

    /// The requested profile ID is not among the loaded profiles.
    UnknownProfile { id: String },

    /// I/O error reading a profile file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Failed to parse TOML '{}': {source}", path.display())
            }
            Self::FileTooLarge {
                path,
                size,
                max_size,
            } => write!(
                f,
                "Profile '{}' is {size} bytes, exceeds maximum of {max_size} bytes",
                path.display()
            ),
            Self::MissingField { profile_id, field } => {
                write!(
                    f,
                    "Profile '{profile_id}': missing required field '{field}'"
                )
            }
            Self::FieldTooLong {
                profile_id,
                field,
                length,
                max_length,
            } => write!(
                f,
                "Profile '{profile_id}': '{field}' is {length} bytes, \
                 exceeds maximum of {max_length}"
            ),
            Self::InvalidTimestampFormat {
                profile_id,
                format,
                reason,
            } => write!(
                f,
                "Profile '{profile_id}': invalid timestamp format '{format}': {reason}"
            ),
            Self::DuplicateId { id, path1, path2 } => write!(
                f,
                "Duplicate profile ID '{id}' in '{}' and '{}'",
                path1.display(),
                path2.display()
            ),
            Self::TooManyProfiles { count, max } => {
                write!(f, "Too many profiles loaded ({count}), maximum is {max}")
            }
            Self::UnknownProfile { id } => {
                write!(f, "Unknown profile '{id}'")
            }
            Self::Io { path, source } => {
                write!(
                    f,
                    "I/O error reading profile '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ProfileError> for LogVetError {
    fn from(e: ProfileError) -> Self {
        Self::Profile(e)
    }
}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

/// Errors raised by the extraction core.
///
/// Malformed lines never appear here: the core excludes them silently and
/// reports them through counters. Only configuration the scan cannot work
/// with at all is an error, and it is raised before any line is examined.
#[derive(Debug)]
pub enum ScanError {
    /// The timestamp format is empty or cannot parse any timestamp.
    InvalidTimestampFormat { format: String, reason: String },
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTimestampFormat { format, reason } => {
                write!(f, "Invalid timestamp format '{format}': {reason}")
            }
        }
    }
}

impl std::error::Error for ScanError {}

impl From<ScanError> for LogVetError {
    fn from(e: ScanError) -> Self {
        Self::Scan(e)
    }
}

// ---------------------------------------------------------------------------
// Source errors
// ---------------------------------------------------------------------------

/// Errors related to acquiring log text from a source.
///
/// `NotFound` is special: the check runner downgrades it to a skipped
/// outcome unless strict-missing mode is on. Everything else is fatal.
#[derive(Debug)]
pub enum SourceError {
    /// The log file does not exist (locally or on the remote host).
    NotFound { path: String },

    /// The source exceeds the maximum accepted size.
    TooLarge { path: String, size: u64, max: u64 },

    /// The SSH host name did not resolve to any address.
    Resolve { host: String },

    /// TCP connection to the SSH host failed.
    Connect { host: String, source: io::Error },

    /// The SSH server rejected the supplied credentials.
    Auth { host: String, user: String },

    /// An SSH or SFTP operation failed.
    Ssh {
        host: String,
        operation: &'static str,
        source: ssh2::Error,
    },

    /// I/O error on a local file.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },

    /// I/O error reading piped standard input.
    Stdin { source: io::Error },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => {
                write!(f, "Log source '{path}' does not exist")
            }
            Self::TooLarge { path, size, max } => write!(
                f,
                "Log source '{path}' is {size} bytes, exceeds maximum of {max} bytes"
            ),
            Self::Resolve { host } => {
                write!(f, "Could not resolve host '{host}'")
            }
            Self::Connect { host, source } => {
                write!(f, "Could not connect to '{host}': {source}")
            }
            Self::Auth { host, user } => {
                write!(f, "Authentication failed for user '{user}' on '{host}'")
            }
            Self::Ssh {
                host,
                operation,
                source,
            } => write!(f, "SSH {operation} failed on '{host}': {source}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
            Self::Stdin { source } => {
                write!(f, "Failed to read standard input: {source}")
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect { source, .. } => Some(source),
            Self::Ssh { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::Stdin { source } => Some(source),
            _ => None,
        }
    }
}

impl From<SourceError> for LogVetError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration.
///
/// Problems inside `config.toml` itself never land here: `load_config`
/// degrades each bad value to a warning and a default, by contract. What
/// remains fatal is a command line that does not describe a runnable
/// check at all.
#[derive(Debug)]
pub enum ConfigError {
    /// The command line and config together do not describe a runnable
    /// check (nothing to scan, unparsable cutoff, no way to prompt).
    Invalid { message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { message } => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for LogVetError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors related to report rendering.
#[derive(Debug)]
pub enum ReportError {
    /// I/O error writing to the output sink.
    Io { source: io::Error },

    /// CSV serialisation error.
    Csv { source: csv::Error },

    /// JSON serialisation error.
    Json { source: serde_json::Error },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { source } => write!(f, "Report I/O error: {source}"),
            Self::Csv { source } => write!(f, "CSV report error: {source}"),
            Self::Json { source } => write!(f, "JSON report error: {source}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source } => Some(source),
            Self::Csv { source } => Some(source),
            Self::Json { source } => Some(source),
        }
    }
}

impl From<ReportError> for LogVetError {
    fn from(e: ReportError) -> Self {
        Self::Report(e)
    }
}

/// Convenience type alias for logvet results.
pub type Result<T> = std::result::Result<T, LogVetError>;
