use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::{Connection, OpenFlags};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use team_merge::config::DEFAULT_LOG_FILTER;
use team_merge::{Args, TeamMerger};

fn main() -> Result<()> {
    // Logs go to stderr: stdout may carry the script
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Args::parse().into_config();

    tracing::info!(
        version = team_merge::VERSION,
        schema_links = team_merge::SCHEMA_LINKS_VERSION,
        db = %config.db_path.display(),
        source = config.source_id,
        dest = config.dest_id,
        "starting team merge"
    );

    let conn = Connection::open_with_flags(&config.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;

    let mut merger = TeamMerger::from_ids(&conn, config.source_id, config.dest_id, config.options)?;
    let prepared = merger.prepare();

    // The report is always shown, whatever the outcome
    if config.json_report {
        eprintln!("{}", serde_json::to_string_pretty(merger.report())?);
    } else {
        eprintln!("{}", merger.report_text());
    }
    prepared?;

    let script = merger.script();
    match &config.output {
        Some(path) => {
            script.write_to(path)?;
            tracing::info!(path = %path.display(), "script written");
        }
        None => print!("{}", script),
    }

    tracing::info!(lines = script.len(), checksum = %script.checksum(), "done");

    Ok(())
}
