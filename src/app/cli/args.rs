//! Command line arguments

use crate::core::logging::{LOG_FORMATS, LOG_LEVELS};
use crate::core::version::long_version;
use crate::store::api::Area;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "snapscan")]
#[command(about = "Snapshot container images and scan their filesystems")]
#[command(version, long_version = long_version())]
pub struct Args {
    /// Configuration file path (default: $SNAPSCAN_CONFIG, then the user config directory)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = LOG_LEVELS, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(short = 'o', long = "log-format", value_name = "FORMAT", value_parser = LOG_FORMATS, global = true)]
    pub log_format: Option<String>,

    /// Log file path
    #[arg(short = 'f', long = "log-file", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", action = ArgAction::SetTrue, conflicts_with = "no_color", global = true)]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color", action = ArgAction::SetTrue, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the dispatcher until interrupted
    Serve,

    /// Queue a new scan task
    Submit {
        /// Receiver type, e.g. docker-image
        #[arg(short = 't', long = "type", value_name = "TYPE")]
        target_type: String,

        /// Target descriptor, e.g. busybox:latest
        #[arg(short = 'T', long = "target", value_name = "TARGET")]
        target: String,

        /// Scanner to run (repeat or comma-separate)
        #[arg(short = 's', long = "scanner", value_name = "NAMES", value_delimiter = ',', action = ArgAction::Append)]
        scanners: Vec<String>,
    },

    /// List tasks
    List {
        /// Only show this area (queue, processing, done or failed)
        #[arg(short = 'a', long = "area", value_name = "AREA")]
        area: Option<Area>,
    },

    /// Show a task record
    Show {
        /// Task id
        id: String,
    },

    /// List registered receivers
    Receivers,

    /// List registered scanners
    Scanners,
}

impl Args {
    /// Whether this command reads the configuration file
    pub fn needs_configuration(&self) -> bool {
        !matches!(self.command, Command::Receivers | Command::Scanners)
    }

    /// Resolve `--color`/`--no-color` against terminal detection
    pub fn use_color(&self, is_terminal: bool) -> bool {
        if self.no_color {
            false
        } else {
            self.color || is_terminal
        }
    }
}
