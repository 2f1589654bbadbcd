use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

// constants (used as defaults)
pub const DB_PATH: &str = "./ip_country.db";

/// Per-download timeout in seconds. Delegation files run to tens of MB.
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 120;

// Retry strategy
/// Initial delay in milliseconds before first retry
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;
/// Factor by which retry delay is multiplied on each attempt
pub const RETRY_FACTOR: u64 = 2;
/// Maximum delay between retries in seconds
pub const RETRY_MAX_DELAY_SECS: u64 = 20;
/// Download attempts per registry before it is reported unavailable
pub const RETRY_MAX_ATTEMPTS: usize = 3;

/// Rows inserted per statement when persisting ranges.
pub const INSERT_CHUNK_SIZE: usize = 500;

/// Logging level for the application.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Command-line options.
#[derive(Debug, Parser)]
#[command(
    name = "ip_country",
    about = "Builds and queries an IP-to-country index from RIR delegation data."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Database path (SQLite file)
    #[arg(long, value_parser, default_value = DB_PATH)]
    pub db_path: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download delegation data from all registries and rebuild the index
    Build {
        /// Read delegated-<rir>-extended-latest files from a local
        /// directory instead of downloading
        #[arg(long)]
        from_dir: Option<PathBuf>,
    },
    /// Look up the country allocation for a single IP address
    Lookup {
        /// IPv4 or IPv6 address
        address: String,

        /// Emit the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export stored ranges to CSV, ordered by range start
    ExportCsv {
        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Export IPv6 prefixes instead of IPv4 ranges
        #[arg(long)]
        ipv6: bool,
    },
    /// Export IPv4 ranges as a JSON array of {start, end, country}
    ExportJson {
        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Export per-country allocation statistics to CSV
    Stats {
        /// Output file (stdout if omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }
}
