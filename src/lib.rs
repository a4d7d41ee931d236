// Team Merge - Core Library
// Compiles the SQL script that folds a duplicate team into its survivor

pub mod badge_merger;
pub mod checker;
pub mod cleaner;
pub mod config;
pub mod db;
pub mod error;
pub mod merger;
pub mod overwrite;
pub mod schema_links;
pub mod script;

// Re-export commonly used types
pub use badge_merger::{BadgeMerger, SubMerger};
pub use checker::{BadgeCouple, Checker, ComparisonReport, TeamChecker};
pub use cleaner::{DuplicateCleaner, ResultCleaner};
pub use config::{Args, MergeConfig};
pub use db::{
    Badge, DuplicateGroup, Season, Team, TeamAffiliation,
    find_team, find_affiliation, find_season, team_affiliations, setup_database,
};
pub use error::MergeError;
pub use merger::{Delegates, MergeOptions, SeasonTarget, StoreDelegates, TeamMerger};
pub use overwrite::{destination_update, ColumnOverwrite};
pub use schema_links::{LinkTable, SCHEMA_LINKS_VERSION};
pub use script::Script;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
