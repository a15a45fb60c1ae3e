// logvet - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Configuration and logging initialisation (debug mode support)
// 3. Scan profile loading (built-in + user-defined)
// 4. Check plan assembly, the run itself, and the exit code

use clap::Parser;
use logvet::app::check::{self, CheckPlan, Targets};
use logvet::app::profile_mgr;
use logvet::core::profile;
use logvet::core::report::{self, OutputFormat};
use logvet::platform::config::{self, AppConfig};
use logvet::util::constants;
use logvet::util::error::{ConfigError, LogVetError, Result};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes: the verdict must be distinguishable from operational
/// failure, so "recent errors found" and "the check could not run" never
/// share a code.
const EXIT_CLEAN: u8 = 0;
const EXIT_FINDINGS: u8 = 1;
const EXIT_FAILURE: u8 = 2;

/// logvet - recency-windowed error-line checker for service logs.
///
/// Scans log files (local, piped, or fetched over SSH) for lines that
/// contain an error marker and carry a bracketed timestamp inside the
/// recency window. Exits 1 when any such line is found.
#[derive(Parser, Debug)]
#[command(name = "logvet", version, about)]
struct Cli {
    /// Log files to check. Remote paths when --ssh-host is set; with no
    /// paths, the profile's default path (or piped stdin) is used.
    paths: Vec<PathBuf>,

    /// Scan profile to use (see built-ins: apache-error, php-error, generic-iso).
    #[arg(short = 'P', long = "profile")]
    profile: Option<String>,

    /// Additional directory containing user-defined scan profiles.
    #[arg(short = 'p', long = "profile-dir")]
    profile_dir: Option<PathBuf>,

    /// Recency window in minutes: lines at or after now minus this count.
    #[arg(short = 'w', long = "window", env = "LOGVET_WINDOW_MINUTES")]
    window: Option<i64>,

    /// Absolute cutoff timestamp (e.g. 2025-09-09T12:30:00); replaces --window.
    #[arg(long = "since", conflicts_with = "window")]
    since: Option<String>,

    /// Override the profile's marker substring.
    #[arg(long = "marker")]
    marker: Option<String>,

    /// Override the profile's timestamp format (chrono syntax).
    #[arg(long = "timestamp-format")]
    timestamp_format: Option<String>,

    /// SSH host to fetch logs from (paths become remote paths).
    #[arg(long = "ssh-host", env = "LOGVET_SSH_HOST")]
    ssh_host: Option<String>,

    /// SSH port.
    #[arg(long = "ssh-port", env = "LOGVET_SSH_PORT", default_value_t = constants::DEFAULT_SSH_PORT)]
    ssh_port: u16,

    /// SSH user.
    #[arg(long = "ssh-user", env = "LOGVET_SSH_USER", default_value = constants::DEFAULT_SSH_USER)]
    ssh_user: String,

    /// SSH password (prompted interactively when omitted).
    #[arg(long = "ssh-password", env = "LOGVET_SSH_PASS", hide_env_values = true)]
    ssh_password: Option<String>,

    /// Report format: text, json, or csv.
    #[arg(short = 'o', long = "output", default_value = "text")]
    output: OutputFormat,

    /// Treat a missing log file as a failure instead of a skip.
    #[arg(long = "strict-missing")]
    strict_missing: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Resolve platform paths and load config.toml before logging init so the
    // configured level can apply; warnings are replayed once logging is up.
    let platform_paths = config::PlatformPaths::resolve();
    let (app_config, config_warnings) = config::load_config(&platform_paths.config_dir);

    logvet::util::logging::init(cli.debug, app_config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "logvet starting"
    );

    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    match run(&cli, &app_config, &platform_paths) {
        Ok(found) => {
            if found {
                ExitCode::from(EXIT_FINDINGS)
            } else {
                ExitCode::from(EXIT_CLEAN)
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Check failed");
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Assemble the check plan from CLI + config, run it, and render the
/// report. Returns whether recent error lines were found.
fn run(
    cli: &Cli,
    app_config: &AppConfig,
    platform_paths: &config::PlatformPaths,
) -> Result<bool> {
    // Profile directory: CLI override > config > platform default
    let config_profile_dir = app_config.user_profile_directory.as_deref().map(PathBuf::from);
    let user_profile_dir = cli
        .profile_dir
        .clone()
        .or(config_profile_dir)
        .unwrap_or_else(|| platform_paths.user_profiles_dir.clone());

    let (profiles, profile_errors) = profile_mgr::load_all_profiles(Some(&user_profile_dir));
    for err in &profile_errors {
        tracing::warn!(error = %err, "Profile loading warning");
    }

    // Profile selection: CLI > config > built-in default
    let profile_id = cli
        .profile
        .as_deref()
        .or(app_config.profile.as_deref())
        .unwrap_or(constants::DEFAULT_PROFILE_ID);
    let selected = profile_mgr::select_profile(&profiles, profile_id)?;

    let profile = profile::apply_overrides(
        selected,
        cli.marker.as_deref(),
        cli.timestamp_format.as_deref(),
    )?;

    tracing::info!(
        profile = %profile.id,
        marker = %profile.marker,
        format = %profile.timestamp_format,
        "Profile selected"
    );

    // Cutoff policy: --since wins; otherwise now minus the window.
    let cutoff = match &cli.since {
        Some(value) => check::parse_cutoff(value).map_err(usage_error)?,
        None => {
            let minutes = cli.window.unwrap_or(app_config.window_minutes);
            if !(constants::MIN_WINDOW_MINUTES..=constants::MAX_WINDOW_MINUTES).contains(&minutes)
            {
                return Err(usage_error(format!(
                    "--window {minutes} is out of range ({}-{})",
                    constants::MIN_WINDOW_MINUTES,
                    constants::MAX_WINDOW_MINUTES
                )));
            }
            check::cutoff_from_window(minutes)
        }
    };

    let targets = resolve_targets(cli, &profile.default_path)?;

    let plan = CheckPlan {
        profile,
        cutoff,
        strict_missing: cli.strict_missing,
        targets,
    };

    let outcomes = check::run_check(&plan)?;

    report::write_report(&outcomes, cli.output, std::io::stdout().lock())?;

    Ok(check::found_recent_errors(&outcomes))
}

/// Decide where the log text comes from.
///
/// --ssh-host makes every path remote. With no host and no paths, the
/// profile's default path is used when it has one; otherwise piped stdin;
/// otherwise there is nothing to check and that is a usage error.
fn resolve_targets(cli: &Cli, default_path: &Option<String>) -> Result<Targets> {
    if let Some(host) = &cli.ssh_host {
        let mut paths: Vec<String> = cli
            .paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        if paths.is_empty() {
            match default_path {
                Some(path) => paths.push(path.clone()),
                None => {
                    return Err(usage_error(
                        "no paths given and the selected profile has no default path",
                    ))
                }
            }
        }
        let password = match &cli.ssh_password {
            Some(pw) => pw.clone(),
            None => prompt_password(&cli.ssh_user, host)?,
        };
        return Ok(Targets::Remote {
            host: host.clone(),
            port: cli.ssh_port,
            user: cli.ssh_user.clone(),
            password,
            paths,
        });
    }

    if !cli.paths.is_empty() {
        return Ok(Targets::Files(cli.paths.clone()));
    }

    if let Some(path) = default_path {
        return Ok(Targets::Files(vec![PathBuf::from(path)]));
    }

    if !std::io::stdin().is_terminal() {
        return Ok(Targets::Stdin);
    }

    Err(usage_error(
        "nothing to check: give log paths, pipe text on stdin, \
         or select a profile with a default path",
    ))
}

/// Prompt for the SSH password on the terminal. Refused when stderr is not
/// a TTY: a non-interactive run must pass the password explicitly rather
/// than hang waiting for input.
fn prompt_password(user: &str, host: &str) -> Result<String> {
    if !std::io::stderr().is_terminal() {
        return Err(usage_error(
            "no SSH password given and no terminal to prompt on \
             (use --ssh-password or LOGVET_SSH_PASS)",
        ));
    }
    eprint!("SSH password for {user}@{host}: ");
    rpassword::read_password().map_err(|e| {
        usage_error(format!("could not read password from terminal: {e}"))
    })
}

/// Usage problems are configuration errors: the check never ran, exit 2.
fn usage_error(message: impl Into<String>) -> LogVetError {
    LogVetError::Config(ConfigError::Invalid {
        message: message.into(),
    })
}
