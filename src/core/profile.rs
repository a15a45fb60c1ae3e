// logvet - core/profile.rs
//
// Scan profile loading and validation.
// Core layer: accepts TOML strings, never touches the filesystem.
// I/O is handled by the app::profile_mgr which feeds content here.

use crate::core::extract::validate_timestamp_format;
use crate::core::model::ScanProfile;
use crate::util::constants;
use crate::util::error::ProfileError;
use serde::Deserialize;
use std::path::PathBuf;

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw TOML profile definition as deserialized from a .toml file.
/// This is validated into a `ScanProfile` for runtime use.
#[derive(Debug, Deserialize)]
pub struct ProfileDefinition {
    pub profile: ProfileMeta,
    pub scan: ScanDef,
}

#[derive(Debug, Deserialize)]
pub struct ProfileMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanDef {
    pub marker: String,
    pub timestamp_format: String,
    #[serde(default)]
    pub default_path: Option<String>,
}

// =============================================================================
// Profile validation
// =============================================================================

/// Parse a TOML string into a `ProfileDefinition`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_profile_toml(
    toml_content: &str,
    source_path: &PathBuf,
) -> Result<ProfileDefinition, ProfileError> {
    toml::from_str(toml_content).map_err(|e| ProfileError::TomlParse {
        path: source_path.clone(),
        source: e,
    })
}

/// Validate a `ProfileDefinition` into a runtime `ScanProfile`.
///
/// Validates:
/// - Required fields are present and non-empty
/// - Marker and timestamp format are within size limits
/// - The timestamp format can actually parse a timestamp
///
/// The format check is the load-time face of the scan's own fatal
/// validation: a profile that would make every scan refuse to run is
/// rejected here, where the error message can name the profile.
pub fn validate_and_compile(
    def: ProfileDefinition,
    _source_path: &PathBuf,
    is_builtin: bool,
) -> Result<ScanProfile, ProfileError> {
    let id = &def.profile.id;

    if id.is_empty() {
        return Err(ProfileError::MissingField {
            profile_id: "(empty)".to_string(),
            field: "profile.id",
        });
    }
    if def.profile.name.is_empty() {
        return Err(ProfileError::MissingField {
            profile_id: id.clone(),
            field: "profile.name",
        });
    }

    validate_scan_fields(id, &def.scan.marker, &def.scan.timestamp_format)?;

    // An empty default_path means "no default", same as omitting it.
    let default_path = def.scan.default_path.filter(|p| !p.is_empty());

    Ok(ScanProfile {
        id: id.clone(),
        name: def.profile.name,
        description: def.profile.description,
        marker: def.scan.marker,
        timestamp_format: def.scan.timestamp_format,
        default_path,
        is_builtin,
    })
}

/// Apply command-line overrides to a loaded profile, re-running the same
/// validation the original fields passed. An override that would produce
/// an unusable profile is rejected with the profile's id in the error.
pub fn apply_overrides(
    profile: &ScanProfile,
    marker: Option<&str>,
    timestamp_format: Option<&str>,
) -> Result<ScanProfile, ProfileError> {
    let mut updated = profile.clone();
    if let Some(marker) = marker {
        updated.marker = marker.to_string();
    }
    if let Some(format) = timestamp_format {
        updated.timestamp_format = format.to_string();
    }
    validate_scan_fields(&updated.id, &updated.marker, &updated.timestamp_format)?;
    Ok(updated)
}

/// Shared validation for the fields a scan actually runs with.
fn validate_scan_fields(
    profile_id: &str,
    marker: &str,
    timestamp_format: &str,
) -> Result<(), ProfileError> {
    if marker.is_empty() {
        return Err(ProfileError::MissingField {
            profile_id: profile_id.to_string(),
            field: "scan.marker",
        });
    }
    if marker.len() > constants::MAX_MARKER_LENGTH {
        return Err(ProfileError::FieldTooLong {
            profile_id: profile_id.to_string(),
            field: "scan.marker",
            length: marker.len(),
            max_length: constants::MAX_MARKER_LENGTH,
        });
    }
    if timestamp_format.is_empty() {
        return Err(ProfileError::MissingField {
            profile_id: profile_id.to_string(),
            field: "scan.timestamp_format",
        });
    }
    if timestamp_format.len() > constants::MAX_TIMESTAMP_FORMAT_LENGTH {
        return Err(ProfileError::FieldTooLong {
            profile_id: profile_id.to_string(),
            field: "scan.timestamp_format",
            length: timestamp_format.len(),
            max_length: constants::MAX_TIMESTAMP_FORMAT_LENGTH,
        });
    }
    if let Err(reason) = validate_timestamp_format(timestamp_format) {
        return Err(ProfileError::InvalidTimestampFormat {
            profile_id: profile_id.to_string(),
            format: timestamp_format.to_string(),
            reason,
        });
    }
    Ok(())
}

// =============================================================================
// Built-in profiles (embedded at compile time)
// =============================================================================

/// Embedded TOML content for built-in profiles.
/// Each tuple is (filename, TOML content).
pub fn builtin_profile_sources() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "apache_error.toml",
            include_str!("../../profiles/apache_error.toml"),
        ),
        (
            "php_error.toml",
            include_str!("../../profiles/php_error.toml"),
        ),
        (
            "generic_iso.toml",
            include_str!("../../profiles/generic_iso.toml"),
        ),
    ]
}

/// Load and validate all built-in profiles.
///
/// Invalid profiles are logged as warnings and skipped (non-fatal).
/// Returns the successfully loaded profiles.
pub fn load_builtin_profiles() -> Vec<ScanProfile> {
    let mut profiles = Vec::new();
    let mut errors = Vec::new();

    for (filename, content) in builtin_profile_sources() {
        let path = PathBuf::from(format!("<builtin>/{filename}"));
        match parse_profile_toml(content, &path)
            .and_then(|def| validate_and_compile(def, &path, true))
        {
            Ok(profile) => {
                tracing::debug!(profile_id = %profile.id, "Loaded built-in profile");
                profiles.push(profile);
            }
            Err(e) => {
                // Built-in profile failures are bugs, but we still degrade gracefully
                tracing::error!(file = filename, error = %e, "Failed to load built-in profile");
                errors.push(e);
            }
        }
    }

    if !errors.is_empty() {
        tracing::warn!(
            count = errors.len(),
            "Some built-in profiles failed to load"
        );
    }

    profiles
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_PROFILE_TOML: &str = r#"
[profile]
id = "test-profile"
name = "Test Profile"
description = "A test profile"

[scan]
marker = "[error]"
timestamp_format = "%Y-%m-%d %H:%M:%S"
default_path = "/var/log/test.log"
"#;

    #[test]
    fn test_parse_valid_profile() {
        let path = PathBuf::from("test.toml");
        let def = parse_profile_toml(VALID_PROFILE_TOML, &path).unwrap();
        assert_eq!(def.profile.id, "test-profile");
        assert_eq!(def.profile.name, "Test Profile");
        assert_eq!(def.scan.marker, "[error]");
        assert_eq!(def.scan.default_path.as_deref(), Some("/var/log/test.log"));
    }

    #[test]
    fn test_compile_valid_profile() {
        let path = PathBuf::from("test.toml");
        let def = parse_profile_toml(VALID_PROFILE_TOML, &path).unwrap();
        let profile = validate_and_compile(def, &path, false).unwrap();

        assert_eq!(profile.id, "test-profile");
        assert!(!profile.is_builtin);
        assert_eq!(profile.timestamp_format, "%Y-%m-%d %H:%M:%S");
    }

    #[test]
    fn test_missing_required_field() {
        let toml = r#"
[profile]
id = ""
name = "Empty ID"

[scan]
marker = "[error]"
timestamp_format = "%Y-%m-%d"
"#;
        let path = PathBuf::from("bad.toml");
        let def = parse_profile_toml(toml, &path).unwrap();
        let result = validate_and_compile(def, &path, false);
        match result.unwrap_err() {
            ProfileError::MissingField { field, .. } => assert_eq!(field, "profile.id"),
            other => panic!("Expected MissingField, got: {other:?}"),
        }
    }

    #[test]
    fn test_empty_marker_is_rejected() {
        let toml = r#"
[profile]
id = "no-marker"
name = "No Marker"

[scan]
marker = ""
timestamp_format = "%Y-%m-%d"
"#;
        let path = PathBuf::from("bad.toml");
        let def = parse_profile_toml(toml, &path).unwrap();
        match validate_and_compile(def, &path, false).unwrap_err() {
            ProfileError::MissingField { field, .. } => assert_eq!(field, "scan.marker"),
            other => panic!("Expected MissingField, got: {other:?}"),
        }
    }

    #[test]
    fn test_marker_too_long() {
        let long_marker = "e".repeat(constants::MAX_MARKER_LENGTH + 1);
        let toml = format!(
            r#"
[profile]
id = "long-marker"
name = "Long Marker"

[scan]
marker = "{long_marker}"
timestamp_format = "%Y-%m-%d"
"#
        );
        let path = PathBuf::from("long.toml");
        let def = parse_profile_toml(&toml, &path).unwrap();
        let result = validate_and_compile(def, &path, false);
        assert!(matches!(
            result.unwrap_err(),
            ProfileError::FieldTooLong { .. }
        ));
    }

    #[test]
    fn test_invalid_timestamp_format_is_rejected_at_load() {
        let toml = r#"
[profile]
id = "bad-format"
name = "Bad Format"

[scan]
marker = "[error]"
timestamp_format = "%q"
"#;
        let path = PathBuf::from("bad.toml");
        let def = parse_profile_toml(toml, &path).unwrap();
        let result = validate_and_compile(def, &path, false);
        assert!(matches!(
            result.unwrap_err(),
            ProfileError::InvalidTimestampFormat { .. }
        ));
    }

    #[test]
    fn test_empty_default_path_becomes_none() {
        let toml = r#"
[profile]
id = "no-default"
name = "No Default Path"

[scan]
marker = "[error]"
timestamp_format = "%Y-%m-%d"
default_path = ""
"#;
        let path = PathBuf::from("test.toml");
        let def = parse_profile_toml(toml, &path).unwrap();
        let profile = validate_and_compile(def, &path, false).unwrap();
        assert_eq!(profile.default_path, None);
    }

    #[test]
    fn test_apply_overrides_replaces_marker_and_format() {
        let path = PathBuf::from("test.toml");
        let def = parse_profile_toml(VALID_PROFILE_TOML, &path).unwrap();
        let profile = validate_and_compile(def, &path, false).unwrap();

        let updated = apply_overrides(&profile, Some("fatal"), Some("%Y-%m-%d")).unwrap();
        assert_eq!(updated.marker, "fatal");
        assert_eq!(updated.timestamp_format, "%Y-%m-%d");
        // Untouched fields survive.
        assert_eq!(updated.id, profile.id);
        assert_eq!(updated.default_path, profile.default_path);
    }

    #[test]
    fn test_apply_overrides_rejects_empty_marker() {
        let path = PathBuf::from("test.toml");
        let def = parse_profile_toml(VALID_PROFILE_TOML, &path).unwrap();
        let profile = validate_and_compile(def, &path, false).unwrap();

        let result = apply_overrides(&profile, Some(""), None);
        assert!(matches!(
            result.unwrap_err(),
            ProfileError::MissingField { field, .. } if field == "scan.marker"
        ));
    }

    #[test]
    fn test_apply_overrides_rejects_unusable_format() {
        let path = PathBuf::from("test.toml");
        let def = parse_profile_toml(VALID_PROFILE_TOML, &path).unwrap();
        let profile = validate_and_compile(def, &path, false).unwrap();

        let result = apply_overrides(&profile, None, Some("not a format"));
        assert!(matches!(
            result.unwrap_err(),
            ProfileError::InvalidTimestampFormat { .. }
        ));
    }

    #[test]
    fn test_load_builtin_profiles() {
        let profiles = load_builtin_profiles();
        // All built-in profiles should load successfully
        assert_eq!(profiles.len(), builtin_profile_sources().len());
        assert!(
            profiles.iter().any(|p| p.id == constants::DEFAULT_PROFILE_ID),
            "default profile not found among built-ins"
        );
        assert!(profiles.iter().all(|p| p.is_builtin));
    }

    #[test]
    fn test_builtin_apache_profile_has_expected_fields() {
        let profiles = load_builtin_profiles();
        let apache = profiles
            .iter()
            .find(|p| p.id == "apache-error")
            .expect("apache-error profile");
        assert_eq!(apache.marker, "[error]");
        assert_eq!(apache.timestamp_format, constants::DEFAULT_TIMESTAMP_FORMAT);
        assert_eq!(
            apache.default_path.as_deref(),
            Some("/var/log/apache2/error.log")
        );
    }
}
