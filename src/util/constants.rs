// logvet - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "logvet";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "logvet";

/// Current application version (updated by release script).
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Scan defaults
// =============================================================================

/// Marker substring a line must contain (case-insensitively) to be a
/// candidate. Matches the Apache error_log severity tag.
pub const DEFAULT_MARKER: &str = "[error]";

/// Timestamp format for the leading bracketed stamp of a candidate line.
/// Apache error_log style: `Wed Sep 09 12:34:56.789012 2025`. `%.f` accepts
/// the stamp with or without a fractional-seconds part.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%a %b %d %H:%M:%S%.f %Y";

/// Profile applied when the user does not name one.
pub const DEFAULT_PROFILE_ID: &str = "apache-error";

/// Default recency window in minutes: a line counts as recent when its
/// stamp is at or after now minus this many minutes.
pub const DEFAULT_WINDOW_MINUTES: i64 = 5;

/// Minimum user-configurable recency window (minutes).
pub const MIN_WINDOW_MINUTES: i64 = 1;

/// Maximum user-configurable recency window (minutes). Two years; beyond
/// this a time-based check is no longer meaningfully "recent".
pub const MAX_WINDOW_MINUTES: i64 = 1_051_200;

// =============================================================================
// Source reading limits
// =============================================================================

/// File size threshold in bytes above which reads go through a memory map
/// instead of a buffered read.
pub const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024; // 100 MB

/// Hard cap on bytes accepted from a single source (local, stdin, or
/// remote). Log checks read whole files into memory; the cap keeps a
/// runaway or misconfigured path from exhausting it.
pub const MAX_SOURCE_BYTES: u64 = 1024 * 1024 * 1024; // 1 GiB

// =============================================================================
// SSH transport
// =============================================================================

/// Default SSH port when none is given.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default SSH user when none is given (matches the appliance images this
/// check was written for).
pub const DEFAULT_SSH_USER: &str = "root";

/// TCP connect timeout for the SSH transport (seconds).
pub const SSH_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Timeout applied to blocking SSH/SFTP operations (milliseconds).
/// 0 would mean "block forever"; a stalled SFTP read must not hang a check.
pub const SSH_IO_TIMEOUT_MS: u32 = 30_000; // 30 s

// =============================================================================
// Profile limits
// =============================================================================

/// Maximum number of scan profiles that can be loaded (built-in + user).
pub const MAX_PROFILES: usize = 100;

/// Maximum size of a profile TOML file in bytes.
pub const MAX_PROFILE_FILE_SIZE: u64 = 64 * 1024; // 64 KB

/// Maximum length of a marker substring in bytes.
pub const MAX_MARKER_LENGTH: usize = 256;

/// Maximum length of a timestamp format string in bytes.
pub const MAX_TIMESTAMP_FORMAT_LENGTH: usize = 256;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// User profiles subdirectory name.
pub const PROFILES_DIR_NAME: &str = "profiles";
