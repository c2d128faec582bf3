//! PhotoPass Fetch - download PhotoPass photos with capture metadata
//!
//! A CLI tool that downloads every photo in a PhotoPass manifest, embeds
//! capture time, timezone offset and park GPS coordinates as EXIF, and sets
//! file timestamps to the capture instant.

use anyhow::Result;
use chrono::Local;
use clap::Parser;
use photopass_fetch::manifest::{Manifest, ParkCoordinates};
use photopass_fetch::process::AssetStatus;
use photopass_fetch::propagate::PropagateStatus;
use photopass_fetch::time::exif::read_embedded;
use photopass_fetch::{Cli, Command, Config, Downloader, HttpFetcher, copy_exif_data};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod cli_output {
    //! Colored console output for run summaries

    use crossterm::{
        ExecutableCommand,
        style::{Color, Print, Stylize, style},
    };
    use std::io::stdout;

    /// CLI theme colors
    pub struct CliTheme;

    impl CliTheme {
        /// Success color (green)
        pub const SUCCESS: Color = Color::Green;
        /// Warning color (yellow)
        pub const WARNING: Color = Color::Yellow;
        /// Error color (red)
        pub const ERROR: Color = Color::Red;
        /// Hint color (dark grey)
        pub const HINT: Color = Color::DarkGrey;
        /// Accent color (cyan)
        pub const ACCENT: Color = Color::Cyan;
    }

    /// Print a separator line
    pub fn print_separator() {
        let _ = stdout().execute(Print(&format!("{}\n", "─".repeat(60))));
    }

    /// Print a centered title
    pub fn print_title(title: &str) {
        let width = 60;
        let padding = width.saturating_sub(title.chars().count()) / 2;
        let left_pad = " ".repeat(padding.saturating_sub(1));

        let _ = stdout().execute(Print(&format!(
            "{}{} {}{}\n",
            left_pad,
            "╔".bold().stylize(),
            title.bold().stylize(),
            "╗".bold().stylize(),
        )));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print an error message
    pub fn print_error(msg: &str) {
        let _ = stdout().execute(Print(style("✗ ").with(CliTheme::ERROR).bold()));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a hint message
    pub fn print_hint(msg: &str) {
        let _ = stdout().execute(Print(style("→ ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", msg)));
    }

    /// Print a key-value pair
    pub fn print_key_value(key: &str, value: &str, value_color: Option<Color>) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = match value_color {
            Some(color) => style(value).with(color),
            None => style(value).bold(),
        };
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print a statistic
    pub fn print_stat(key: &str, value: usize, color: Color) {
        let key_styled = style(key).with(CliTheme::HINT);
        let value_styled = style(value.to_string()).with(color).bold();
        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(key_styled));
        let _ = stdout().execute(Print(": "));
        let _ = stdout().execute(Print(value_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print one per-item result line
    pub fn print_result(status_icon: &str, status_color: Color, name: &str, msg: &str) {
        let icon_styled = style(status_icon).with(status_color).bold();
        let name_styled = style(name).italic();
        let msg_styled = style(msg).with(CliTheme::HINT);

        let _ = stdout().execute(Print("  "));
        let _ = stdout().execute(Print(icon_styled));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(name_styled));
        let _ = stdout().execute(Print(" "));
        let _ = stdout().execute(Print(msg_styled));
        let _ = stdout().execute(Print("\n"));
    }

    /// Print the log file path
    pub fn print_log_path(path: &str) {
        let _ = stdout().execute(Print("\n"));
        let _ = stdout().execute(Print(style("  📁 ").with(CliTheme::ACCENT)));
        let _ = stdout().execute(Print(style("Log file: ").with(CliTheme::HINT)));
        let _ = stdout().execute(Print(format!("{}\n", path)));
    }

    /// Print a blank line
    pub fn print_blank() {
        let _ = stdout().execute(Print("\n"));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir, &cli);
    let _guard = setup_logging(&cli, &log_path)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        command = cli.command_name(),
        "PhotoPass Fetch starting"
    );

    let config = load_config(&cli, &exe_dir)?;
    if config.verbose {
        info!(?config, "Configuration loaded");
    }
    info!(log_file = %log_path.display(), "Log file location");

    let outcome = match cli.command() {
        Command::Download(_) => run_download(&config, config.verbose),
        Command::CopyExif(_) => run_copy_exif(&config, config.verbose),
        Command::Inspect { file } => run_inspect(&file),
        Command::InitConfig { path, current } => run_init_config(&path, current.then_some(&config)),
    };

    if let Err(e) = outcome {
        error!(error = %e, "Run failed");
        cli_output::print_error(&e.to_string());
        cli_output::print_log_path(&log_path.display().to_string());
        std::process::exit(1);
    }

    cli_output::print_separator();
    cli_output::print_log_path(&log_path.display().to_string());
    Ok(())
}

/// Download, tag and time-stamp every photo in the manifest
fn run_download(config: &Config, verbose: bool) -> Result<()> {
    use cli_output::*;

    let manifest = Manifest::load(&config.manifest)?;
    let parks = ParkCoordinates::load_or_empty(&config.park_coordinates);
    info!(
        media = manifest.media_count(),
        parks = parks.len(),
        "Manifest loaded"
    );

    let fetcher = HttpFetcher::new(config.request_timeout());
    let mut downloader = Downloader::new(config, parks, fetcher)?;
    let results = downloader.run(&manifest)?;
    let stats = downloader.stats();

    print_separator();
    print_title("Download Complete");
    print_separator();

    print_blank();
    print_stat("Processed", stats.processed, CliTheme::SUCCESS);
    print_stat("Saved", stats.saved, CliTheme::ACCENT);
    print_stat("Tagged with GPS", stats.tagged, CliTheme::SUCCESS);
    print_stat("Tagged without GPS", stats.tagged_without_gps, CliTheme::ACCENT);
    print_stat("Untagged (bad date)", stats.untagged, CliTheme::WARNING);
    print_stat("Metadata failed", stats.embed_failed, CliTheme::WARNING);
    print_stat("No URI", stats.skipped_no_uri, CliTheme::WARNING);
    print_stat("Retrieval failed", stats.retrieval_failed, CliTheme::ERROR);
    print_stat("Timestamp sync failed", stats.timestamp_sync_failed, CliTheme::WARNING);
    print_blank();

    if verbose {
        print_separator();
        print_hint("Detailed results:");
        print_blank();

        for result in &results {
            let target = result
                .destination
                .as_ref()
                .map(|p| format!("→ {}", p.display()))
                .unwrap_or_default();
            let (icon, color) = match result.status {
                AssetStatus::Tagged => ("✓", CliTheme::SUCCESS),
                AssetStatus::TaggedWithoutGps => ("✓", CliTheme::ACCENT),
                AssetStatus::Untagged | AssetStatus::EmbedFailed => ("~", CliTheme::WARNING),
                AssetStatus::SkippedNoUri => ("⊘", CliTheme::WARNING),
                AssetStatus::RetrievalFailed => ("✗", CliTheme::ERROR),
            };
            let msg = result.error.as_deref().unwrap_or(&target);
            print_result(icon, color, &result.media_id, msg);
        }
    }

    let failed: Vec<_> = results
        .iter()
        .filter(|r| r.status == AssetStatus::RetrievalFailed)
        .collect();
    if !failed.is_empty() {
        print_separator();
        print_error(&format!("Failed downloads: {}", failed.len()));
        print_blank();
        for result in failed {
            print_key_value(
                &result.media_id,
                result.error.as_deref().unwrap_or("unknown error"),
                Some(CliTheme::ERROR),
            );
        }
    }

    Ok(())
}

/// Copy EXIF payloads onto edited copies
fn run_copy_exif(config: &Config, verbose: bool) -> Result<()> {
    use cli_output::*;

    let (results, stats) = copy_exif_data(&config.propagate.source_dir, &config.propagate.target_dir);

    print_separator();
    print_title("EXIF Copy Complete");
    print_separator();

    print_blank();
    print_stat("Found", stats.found, CliTheme::ACCENT);
    print_stat("Updated", stats.updated, CliTheme::SUCCESS);
    print_stat("Source missing", stats.source_missing, CliTheme::WARNING);
    print_stat("No EXIF in source", stats.no_exif, CliTheme::WARNING);
    print_stat("Failed", stats.failed, CliTheme::ERROR);
    print_blank();

    if verbose {
        for result in &results {
            let name = result
                .target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let (icon, color, msg) = match result.status {
                PropagateStatus::Updated => ("✓", CliTheme::SUCCESS, "updated"),
                PropagateStatus::SourceMissing => ("⊘", CliTheme::WARNING, "source not found"),
                PropagateStatus::NoExif => ("⊘", CliTheme::WARNING, "no EXIF in source"),
                PropagateStatus::Failed => (
                    "✗",
                    CliTheme::ERROR,
                    result.error.as_deref().unwrap_or("unknown error"),
                ),
            };
            print_result(icon, color, &name, msg);
        }
    }

    Ok(())
}

/// Print the capture metadata embedded in `file`
fn run_inspect(file: &Path) -> Result<()> {
    use cli_output::*;

    let embedded = read_embedded(file)?;
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());

    print_separator();
    print_title(&file.display().to_string());
    print_key_value("Make", &show(&embedded.make), None);
    print_key_value("Model", &show(&embedded.model), None);
    print_key_value("Software", &show(&embedded.software), None);
    print_key_value(
        "Captured",
        &embedded
            .capture_time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string()),
        Some(CliTheme::ACCENT),
    );
    print_key_value("Offset", &show(&embedded.offset_time), None);
    match (embedded.latitude, embedded.longitude) {
        (Some(lat), Some(lon)) => print_key_value(
            "GPS",
            &format!(
                "{:.6} {} / {:.6} {}",
                lat.abs(),
                show(&embedded.latitude_ref),
                lon.abs(),
                show(&embedded.longitude_ref)
            ),
            Some(CliTheme::SUCCESS),
        ),
        _ => print_key_value("GPS", "-", Some(CliTheme::WARNING)),
    }
    print_key_value("GPS date", &show(&embedded.gps_date_stamp), None);
    Ok(())
}

/// Write the commented sample, or the effective configuration with `--current`
fn run_init_config(path: &Path, current: Option<&Config>) -> Result<()> {
    match current {
        Some(config) => config.save_to_file(path)?,
        None => Config::write_sample(path)?,
    }
    info!(path = %path.display(), current = current.is_some(), "Configuration written");
    cli_output::print_hint(&format!("Configuration written to {}", path.display()));
    Ok(())
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path from the command and config file name
fn get_log_path(exe_dir: &Path, cli: &Cli) -> PathBuf {
    let log_dir = cli.log_dir.clone().unwrap_or_else(|| exe_dir.join("Log"));
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_filename = format!("{}_{}.log", cli.command_name(), timestamp);

    let config_name = cli
        .config
        .as_ref()
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str());

    match config_name {
        Some(name) => log_dir.join(name).join(log_filename),
        None => log_dir.join(log_filename),
    }
}

/// Resolve config path - supports shorthand syntax
///
/// `park` resolves to `park`, `park.toml`, or `Config/park.toml` next to
/// the executable, whichever exists first.
fn resolve_config_path(exe_dir: &Path, config_path: &Path) -> PathBuf {
    if config_path.exists() {
        return config_path.to_path_buf();
    }

    let with_extension = if config_path.extension().is_none() {
        config_path.with_extension("toml")
    } else {
        config_path.to_path_buf()
    };

    if with_extension.exists() {
        return with_extension;
    }

    let config_dir = exe_dir.join("Config");
    let filename = config_path.file_name().unwrap_or(config_path.as_os_str());

    let mut in_config_dir = config_dir.join(filename);
    if in_config_dir.extension().is_none() {
        in_config_dir = in_config_dir.with_extension("toml");
    }

    if in_config_dir.exists() {
        return in_config_dir;
    }

    config_path.to_path_buf()
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli, exe_dir: &Path) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        let resolved_path = resolve_config_path(exe_dir, config_path);
        info!(config_file = %resolved_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(&resolved_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Setup logging (file + console)
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<WorkerGuard> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(guard)
}
