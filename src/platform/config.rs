// logvet - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for logvet configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logvet/)
    pub config_dir: PathBuf,

    /// User profile directory (e.g. ~/.config/logvet/profiles/)
    pub user_profiles_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            // config_dir() is already app-scoped (~/.config/logvet on
            // Linux); config.toml and profiles/ both live directly in it.
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let user_profiles_dir = config_dir.join(constants::PROFILES_DIR_NAME);

            tracing::debug!(
                config = %config_dir.display(),
                profiles = %user_profiles_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                user_profiles_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                user_profiles_dir: fallback.join(constants::PROFILES_DIR_NAME),
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[scan]` section.
    pub scan: ScanSection,
    /// `[profiles]` section.
    pub profiles: ProfilesSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[scan]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// Recency window in minutes.
    pub window_minutes: Option<i64>,
    /// Profile id applied when the CLI names none.
    pub profile: Option<String>,
}

/// `[profiles]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ProfilesSection {
    /// Additional profile directory.
    pub user_profile_directory: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// Validated application configuration derived from `config.toml`.
///
/// All values are validated against named constants at load time.
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Recency window in minutes.
    pub window_minutes: i64,

    /// Default profile id (None = built-in default).
    pub profile: Option<String>,

    /// Additional user profile directory (None = platform default only).
    pub user_profile_directory: Option<String>,

    /// Logging level string (applied at logging init).
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window_minutes: constants::DEFAULT_WINDOW_MINUTES,
            profile: None,
            user_profile_directory: None,
            log_level: None,
        }
    }
}

/// Load and validate `config.toml` from the given config directory.
///
/// Returns `AppConfig` with validated values and a list of non-fatal
/// warnings. If the file does not exist, returns defaults with no warnings
/// (first-run). If the file is unparseable, returns defaults with an error
/// warning -- the check still runs but the user is informed.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<String>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    let mut warnings: Vec<String> = Vec::new();

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), warnings);
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!(
                "Could not read config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(e) => {
            let msg = format!(
                "Failed to parse config file '{}': {e}. Using defaults.",
                config_path.display()
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
            return (AppConfig::default(), warnings);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");

    // Validate each field against named constants, accumulating all errors.
    let mut config = AppConfig::default();

    // -- Scan: window_minutes --
    if let Some(minutes) = raw.scan.window_minutes {
        if (constants::MIN_WINDOW_MINUTES..=constants::MAX_WINDOW_MINUTES).contains(&minutes) {
            config.window_minutes = minutes;
        } else {
            warnings.push(format!(
                "[scan] window_minutes = {minutes} is out of range ({}-{}). Using default ({}).",
                constants::MIN_WINDOW_MINUTES,
                constants::MAX_WINDOW_MINUTES,
                constants::DEFAULT_WINDOW_MINUTES,
            ));
        }
    }

    // -- Scan: profile --
    if let Some(ref profile) = raw.scan.profile {
        if profile.is_empty() {
            warnings.push(format!(
                "[scan] profile is empty. Using default ({}).",
                constants::DEFAULT_PROFILE_ID,
            ));
        } else {
            config.profile = Some(profile.clone());
        }
    }

    // -- Profiles: user_profile_directory --
    if let Some(ref dir) = raw.profiles.user_profile_directory {
        if !dir.is_empty() {
            config.user_profile_directory = Some(dir.clone());
        }
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default (info).",
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles_dir_sits_inside_the_config_dir() {
        // config.toml and profiles/ share the app-scoped config directory;
        // neither escapes to the parent (~/.config/profiles was a bug).
        let paths = PlatformPaths::resolve();
        assert_eq!(
            paths.user_profiles_dir.parent(),
            Some(paths.config_dir.as_path())
        );
        assert_eq!(
            paths.user_profiles_dir.file_name().unwrap(),
            constants::PROFILES_DIR_NAME
        );
    }

    #[test]
    fn test_config_file_is_read_from_the_given_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(constants::CONFIG_FILE_NAME),
            "[scan]\nwindow_minutes = 42\n",
        )
        .unwrap();

        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.window_minutes, 42);
    }

    #[test]
    fn test_missing_file_yields_defaults_without_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let (config, warnings) = load_config(dir.path());
        assert_eq!(config.window_minutes, constants::DEFAULT_WINDOW_MINUTES);
        assert!(config.profile.is_none());
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_valid_config_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(constants::CONFIG_FILE_NAME),
            r#"
[scan]
window_minutes = 15
profile = "generic-iso"

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.window_minutes, 15);
        assert_eq!(config.profile.as_deref(), Some("generic-iso"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_out_of_range_window_warns_and_keeps_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(constants::CONFIG_FILE_NAME),
            "[scan]\nwindow_minutes = 0\n",
        )
        .unwrap();

        let (config, warnings) = load_config(dir.path());
        assert_eq!(config.window_minutes, constants::DEFAULT_WINDOW_MINUTES);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("window_minutes"));
    }

    #[test]
    fn test_unparseable_file_warns_and_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(constants::CONFIG_FILE_NAME),
            "not valid toml [[",
        )
        .unwrap();

        let (config, warnings) = load_config(dir.path());
        assert_eq!(config.window_minutes, constants::DEFAULT_WINDOW_MINUTES);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Failed to parse"));
    }
}
