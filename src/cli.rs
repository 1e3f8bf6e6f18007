//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use magnet_sync_core::Settings;
use magnet_sync_core::config::{DEFAULT_DATABASE_PATH, DEFAULT_LOCATION};

/// Watch torrent-tracker topic pages and re-sync releases when they change.
///
/// Every option can also be set through the environment or a `.env` file.
#[derive(Parser, Debug)]
#[command(name = "magnet-sync")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// SQLite database file
    #[arg(long = "db", global = true, env = "DATABASE_PATH", default_value = DEFAULT_DATABASE_PATH)]
    pub database_path: PathBuf,

    /// Persist metadata but never create download tasks
    #[arg(
        long,
        global = true,
        env = "DRY_MODE",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub dry_mode: bool,

    /// Download folder for items without an explicit location
    #[arg(long, global = true, env = "DOWNLOAD_DESTINATION", default_value = DEFAULT_LOCATION)]
    pub default_location: String,

    /// Total timeout per page fetch in seconds (1-600)
    #[arg(long, global = true, env = "FETCH_TIMEOUT_SECS", default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub fetch_timeout_secs: u64,

    /// Connect timeout per page fetch in seconds (1-600)
    #[arg(long, global = true, env = "FETCH_CONNECT_TIMEOUT_SECS", default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=600))]
    pub connect_timeout_secs: u64,

    /// Attempts per database operation while the database is locked (1-50)
    #[arg(long, global = true, env = "STORE_MAX_ATTEMPTS", default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub store_max_attempts: u32,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Parse a topic page, store it and create its download task
    Add {
        /// Topic page URL
        url: String,

        /// Download folder for this item
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Re-check every tracked item, or one item by id
    Sync {
        /// Only re-check this id
        #[arg(long)]
        id: Option<String>,
    },

    /// Re-check every tracked item periodically until interrupted
    Watch {
        /// Seconds between sweeps
        #[arg(long, env = "SYNC_INTERVAL_SECS", default_value_t = 3600, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: u64,
    },

    /// List tracked items, most recently updated first
    List,

    /// Show one item by id, including removed ones
    Show {
        /// Item id
        id: String,
    },

    /// Stop tracking an item
    Remove {
        /// Item id
        id: String,
    },

    /// Change the download folder of an item
    Relocate {
        /// Item id
        id: String,

        /// New download folder
        location: String,
    },

    /// List download folders offered by the download client
    Locations,
}

impl Args {
    /// Library settings from the parsed arguments.
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings {
            dry_mode: self.dry_mode,
            database_path: self.database_path.clone(),
            default_location: self.default_location.clone(),
            fetch_connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            store_max_attempts: self.store_max_attempts,
            ..Settings::default()
        }
    }

    /// Default log level: quiet beats verbose.
    #[must_use]
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_subcommand_is_required() {
        let result = Args::try_parse_from(["magnet-sync"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_list_uses_defaults() {
        let args = Args::try_parse_from(["magnet-sync", "list"]).unwrap();
        assert_eq!(args.command, Command::List);
        assert_eq!(args.fetch_timeout_secs, 30);
        assert_eq!(args.store_max_attempts, 5);
        assert_eq!(args.default_log_level(), "info");
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["magnet-sync", "-vv", "list"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.default_log_level(), "trace");
    }

    #[test]
    fn test_cli_quiet_wins_over_verbose() {
        let args = Args::try_parse_from(["magnet-sync", "list", "-q", "-v"]).unwrap();
        assert_eq!(args.default_log_level(), "error");
    }

    #[test]
    fn test_cli_add_with_location() {
        let args = Args::try_parse_from([
            "magnet-sync",
            "add",
            "https://rutracker.org/forum/viewtopic.php?t=1",
            "--location",
            "/downloads/movies",
        ])
        .unwrap();
        assert_eq!(
            args.command,
            Command::Add {
                url: "https://rutracker.org/forum/viewtopic.php?t=1".to_string(),
                location: Some("/downloads/movies".to_string()),
            }
        );
    }

    #[test]
    fn test_cli_sync_single_id() {
        let args = Args::try_parse_from(["magnet-sync", "sync", "--id", "42"]).unwrap();
        assert_eq!(
            args.command,
            Command::Sync {
                id: Some("42".to_string())
            }
        );
    }

    #[test]
    fn test_cli_relocate_positional_args() {
        let args =
            Args::try_parse_from(["magnet-sync", "relocate", "42", "/downloads/anime"]).unwrap();
        assert_eq!(
            args.command,
            Command::Relocate {
                id: "42".to_string(),
                location: "/downloads/anime".to_string(),
            }
        );
    }

    #[test]
    fn test_cli_fetch_timeout_range_enforced() {
        let result = Args::try_parse_from(["magnet-sync", "--fetch-timeout-secs", "0", "list"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_settings_mapping() {
        let args = Args::try_parse_from([
            "magnet-sync",
            "--db",
            "/tmp/x.db",
            "--dry-mode",
            "--fetch-timeout-secs",
            "12",
            "list",
        ])
        .unwrap();
        let settings = args.settings();
        assert!(settings.dry_mode);
        assert_eq!(settings.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(settings.fetch_timeout, Duration::from_secs(12));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["magnet-sync", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
