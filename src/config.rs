//! Command-line configuration for the merge tool.

use crate::merger::MergeOptions;
use clap::Parser;
use std::path::PathBuf;

/// Default store path.
pub const DEFAULT_DB_PATH: &str = "./goggles.db";

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "team_merge=info";

/// Resolved merge configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    /// SQLite file read to build the script.
    pub db_path: PathBuf,

    /// Team to retire.
    pub source_id: i64,

    /// Surviving team.
    pub dest_id: i64,

    pub options: MergeOptions,

    /// Script destination; `None` writes to stdout.
    pub output: Option<PathBuf>,

    /// Print the comparison report as JSON instead of text.
    pub json_report: bool,
}

impl MergeConfig {
    pub fn new(source_id: i64, dest_id: i64) -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            source_id,
            dest_id,
            options: MergeOptions::default(),
            output: None,
            json_report: false,
        }
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }

    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_json_report(mut self, json_report: bool) -> Self {
        self.json_report = json_report;
        self
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "team-merge")]
#[command(version, about = "Compiles the SQL script merging a duplicate team into its survivor", long_about = None)]
pub struct Args {
    /// Path to the SQLite store.
    #[arg(long, default_value = DEFAULT_DB_PATH)]
    pub db: PathBuf,

    /// Id of the duplicate team to retire.
    #[arg(long)]
    pub source: i64,

    /// Id of the surviving team.
    #[arg(long)]
    pub dest: i64,

    /// Overwrite the destination's name, display name, variations and city.
    #[arg(long)]
    pub full_overwrite: bool,

    /// Merge badges even when their categories differ.
    #[arg(long)]
    pub force: bool,

    /// Only describe duplicate results instead of deleting them.
    #[arg(long)]
    pub no_autofix: bool,

    /// Write the script to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the comparison report as JSON.
    #[arg(long)]
    pub json_report: bool,
}

impl Args {
    /// Convert command-line arguments to a merge configuration.
    pub fn into_config(self) -> MergeConfig {
        let options = MergeOptions {
            full_overwrite: self.full_overwrite,
            force: self.force,
            autofix: !self.no_autofix,
        };

        let mut config = MergeConfig::new(self.source, self.dest)
            .with_db_path(self.db)
            .with_options(options)
            .with_json_report(self.json_report);

        if let Some(output) = self.output {
            config = config.with_output(output);
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["team-merge", "--source", "10", "--dest", "20"]);
        let config = args.into_config();

        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!((config.source_id, config.dest_id), (10, 20));
        assert_eq!(config.options, MergeOptions::default());
        assert!(config.options.autofix);
        assert!(config.output.is_none());
    }

    #[test]
    fn test_flags() {
        let args = Args::parse_from([
            "team-merge",
            "--db",
            "/tmp/x.db",
            "--source",
            "10",
            "--dest",
            "20",
            "--full-overwrite",
            "--force",
            "--no-autofix",
            "-o",
            "merge.sql",
            "--json-report",
        ]);
        let config = args.into_config();

        assert!(config.options.full_overwrite);
        assert!(config.options.force);
        assert!(!config.options.autofix);
        assert_eq!(config.output, Some(PathBuf::from("merge.sql")));
        assert!(config.json_report);
    }
}
