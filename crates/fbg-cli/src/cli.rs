//! CLI argument definitions for the feedback grid.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "fbg",
    version,
    about = "Feedback grid - annotate a paginated dataset",
    long_about = "Browse a CSV dataset page by page with annotations from a shared,\n\
                  append-only annotation store, and save edits back to it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (default: settings.toml in the platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show one page of the dataset merged with its annotations.
    Page(PageArgs),

    /// Record an unsaved edit.
    Edit(EditArgs),

    /// Save recorded edits to the annotation store.
    Save(SaveArgs),

    /// List every annotation version of one key.
    History(HistoryArgs),
}

#[derive(Parser)]
pub struct PageArgs {
    /// CSV file serving the dataset.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Page to show (1-based).
    #[arg(long = "page", default_value_t = 1)]
    pub page: usize,
}

#[derive(Parser)]
pub struct EditArgs {
    /// CSV file serving the dataset.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Natural key of the row.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Annotation column.
    #[arg(value_name = "OVERLAY")]
    pub overlay: String,

    /// New value.
    #[arg(value_name = "VALUE")]
    pub value: String,
}

#[derive(Parser)]
pub struct SaveArgs {
    /// CSV file serving the dataset.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Natural key of the row.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Dataset id (default: `dataset.id` from the settings).
    #[arg(long = "dataset", value_name = "ID")]
    pub dataset: Option<String>,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
