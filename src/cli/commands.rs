//! CLI subcommand definitions

use std::path::PathBuf;

use clap::Subcommand;

use crate::range::TimePreset;

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Show or change the dashboard date range
    Range {
        #[command(subcommand)]
        command: Option<RangeCommands>,
    },
    /// Show tracking daemon status
    Status,
    /// Control the tracking daemon
    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },
    /// Check and import archive files
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Export sessions to an archive file
    Export {
        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Only sessions of this project id
        #[arg(long, value_name = "ID")]
        project: Option<i64>,
        /// First day to include (YYYYMMDD or YYYY-MM-DD)
        #[arg(short, long)]
        since: Option<String>,
        /// Last day to include (YYYYMMDD or YYYY-MM-DD)
        #[arg(short, long)]
        until: Option<String>,
    },
    /// Merge sessions separated by short gaps
    Rebuild {
        /// Largest gap to fill, in minutes (default: sessions setting)
        #[arg(long, value_name = "MINUTES")]
        gap_fill: Option<u32>,
    },
    /// Count sessions (default: the dashboard range)
    Count {
        /// First day to include (YYYYMMDD or YYYY-MM-DD)
        #[arg(short, long)]
        since: Option<String>,
        /// Last day to include (YYYYMMDD or YYYY-MM-DD)
        #[arg(short, long)]
        until: Option<String>,
        /// Only sessions without a project
        #[arg(long)]
        unassigned: bool,
        /// Only sessions at least this long, in seconds
        #[arg(long, value_name = "SECS")]
        min_duration: Option<u64>,
    },
    /// Show or change persisted settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
    /// Poll the tracker and print a line whenever data may have changed
    Watch {
        /// Stop after this many refreshes
        #[arg(long, value_name = "N")]
        iterations: Option<u64>,
    },
}

#[derive(Subcommand)]
pub(crate) enum RangeCommands {
    /// Show the current range (default)
    Show,
    /// Switch to a preset
    Set {
        #[arg(value_enum)]
        preset: TimePreset,
    },
    /// Use explicit dates
    Custom { from: String, to: String },
    /// Move one period back
    Prev,
    /// Move one period forward
    Next,
}

#[derive(Subcommand, Clone, Copy)]
pub(crate) enum DaemonCommands {
    Start,
    Stop,
    Restart,
}

#[derive(Subcommand)]
pub(crate) enum ImportCommands {
    /// Check a file without changing any data
    Validate { path: PathBuf },
    /// Check a file and import it when valid
    Run { path: PathBuf },
    /// List files waiting in the import directory
    Pending,
}

#[derive(Subcommand)]
pub(crate) enum SettingsCommands {
    /// Show one record or all of them (default)
    Show { name: Option<String> },
    /// Store a record given as JSON
    Set { name: String, value: String },
    /// Restore a record's defaults
    Reset { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[test]
    fn range_set_parses_preset() {
        let cli = Cli::try_parse_from(["timeflow", "range", "set", "month"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Range {
                command: Some(RangeCommands::Set {
                    preset: TimePreset::Month
                })
            })
        ));
    }

    #[test]
    fn unknown_preset_is_rejected() {
        assert!(Cli::try_parse_from(["timeflow", "range", "set", "year"]).is_err());
    }

    #[test]
    fn export_requires_output() {
        assert!(Cli::try_parse_from(["timeflow", "export"]).is_err());
        let cli = Cli::try_parse_from(["timeflow", "export", "-o", "out.json", "--project", "3"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Export {
                project: Some(3),
                ..
            })
        ));
    }
}
