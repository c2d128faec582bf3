//! CLI argument parsing with clap

use crate::config::Config;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// PhotoPass Fetch - download PhotoPass photos with capture metadata
///
/// Downloads every photo listed in a PhotoPass manifest, names it after
/// its capture time, embeds EXIF date, offset and park GPS data, and sets
/// the file timestamps to the capture instant.
#[derive(Parser, Debug)]
#[command(name = "photopass-fetch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long, global = true, env = "PHOTOPASS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long, global = true)]
    pub json_log: bool,

    /// Directory for log files (defaults to Log/ next to the executable)
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download and tag every photo in the manifest (default)
    Download(DownloadArgs),

    /// Copy EXIF data and file times onto same-named edited images
    CopyExif(CopyExifArgs),

    /// Show the capture metadata embedded in an image
    Inspect {
        /// Image to inspect
        file: PathBuf,
    },

    /// Write a commented sample configuration file
    InitConfig {
        /// Destination of the sample file
        path: PathBuf,

        /// Write the effective configuration (file plus flags) instead
        #[arg(long)]
        current: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct DownloadArgs {
    /// Manifest JSON file
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Output directory for downloaded photos
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Park coordinate table JSON file
    #[arg(short, long)]
    pub parks: Option<PathBuf>,

    /// IANA timezone for local EXIF timestamps
    #[arg(short = 'z', long)]
    pub timezone: Option<String>,

    /// Attribution written to Make, Model and Software
    #[arg(long)]
    pub attribution: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CopyExifArgs {
    /// Directory with the tagged originals
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Directory with the images to update
    #[arg(short, long)]
    pub target: Option<PathBuf>,
}

impl Cli {
    /// Subcommand to run; `download` when none was given
    pub fn command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Download(DownloadArgs::default()))
    }

    /// Name used for the log file
    pub fn command_name(&self) -> &'static str {
        match self.command {
            None | Some(Command::Download(_)) => "Download",
            Some(Command::CopyExif(_)) => "CopyExif",
            Some(Command::Inspect { .. }) => "Inspect",
            Some(Command::InitConfig { .. }) => "InitConfig",
        }
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        match &self.command {
            Some(Command::Download(args)) => {
                if let Some(ref manifest) = args.manifest {
                    config.manifest = manifest.clone();
                }
                if let Some(ref output) = args.output {
                    config.output_dir = output.clone();
                }
                if let Some(ref parks) = args.parks {
                    config.park_coordinates = parks.clone();
                }
                if let Some(ref timezone) = args.timezone {
                    config.timezone = timezone.clone();
                }
                if let Some(ref attribution) = args.attribution {
                    config.attribution = attribution.clone();
                }
                if let Some(timeout) = args.timeout {
                    config.request_timeout_secs = timeout;
                }
            }
            Some(Command::CopyExif(args)) => {
                if let Some(ref source) = args.source {
                    config.propagate.source_dir = source.clone();
                }
                if let Some(ref target) = args.target {
                    config.propagate.target_dir = target.clone();
                }
            }
            _ => {}
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
