use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "molframe developers",
    version,
    about = "molframe CLI - Headless driver for the molframe rigid-body molecule scene with remote energy sampling.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scene headlessly for a number of frames while sampling energies.
    Run(RunArgs),
    /// Score the rest geometry of the molecule once.
    Score(ScoreArgs),
    /// Print the atoms and relations of a geometry table.
    Table(TableArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of frames to simulate.
    #[arg(short, long, value_name = "INT")]
    pub frames: Option<u64>,

    /// Geometry table in TOML format to use instead of the built-in molecule.
    #[arg(short, long, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Scoring service endpoint.
    #[arg(long, value_name = "URL", conflicts_with = "offline")]
    pub endpoint: Option<String>,

    /// Disable energy sampling entirely.
    #[arg(long)]
    pub offline: bool,

    /// HTTP timeout for scoring requests, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Pace frames against the wall clock instead of running them back to back.
    #[arg(long)]
    pub real_time: bool,

    /// Keep reversed duplicate relations from the table as separate constraints and sticks.
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Add the free-falling cylinder prop to the scene.
    #[arg(long)]
    pub with_cylinder: bool,

    /// Write the collected energy samples to a CSV file.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S sampler.interval=0.5
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `score` subcommand.
#[derive(Args, Debug)]
pub struct ScoreArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Geometry table in TOML format to use instead of the built-in molecule.
    #[arg(short, long, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Scoring service endpoint.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// HTTP timeout for the scoring request, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,
}

/// Arguments for the `table` subcommand.
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Geometry table in TOML format to use instead of the built-in molecule.
    #[arg(short, long, value_name = "PATH")]
    pub table: Option<PathBuf>,

    /// Show every table entry instead of folding reversed duplicates.
    #[arg(long)]
    pub keep_duplicates: bool,
}
