// 🧹 Duplicate Result Cleaner - removes repeated result rows in a season
//
// After two teams are merged, the same swimmer can end up with two result
// rows for the same program. The lowest id of each group is kept.
// Statements are keyed by explicit ids, so running them twice is harmless.

use crate::db::{self, Season};
use crate::error::Result;
use crate::script::{id_list, Script};
use rusqlite::Connection;

pub trait DuplicateCleaner {
    fn prepare(&mut self) -> Result<()>;

    /// Possibly empty when there is nothing to clean
    fn script(&self) -> &Script;
}

pub struct ResultCleaner<'a> {
    conn: &'a Connection,
    season: Season,

    /// Emit deletions; otherwise only describe the duplicates
    autofix: bool,

    prepared: bool,
    script: Script,
}

impl<'a> ResultCleaner<'a> {
    pub fn new(conn: &'a Connection, season: &Season, autofix: bool) -> Self {
        ResultCleaner {
            conn,
            season: season.clone(),
            autofix,
            prepared: false,
            script: Script::new(),
        }
    }
}

impl DuplicateCleaner for ResultCleaner<'_> {
    fn prepare(&mut self) -> Result<()> {
        if self.prepared {
            return Ok(());
        }
        self.prepared = true;

        let groups = db::duplicate_result_groups(self.conn, self.season.id)?;
        if groups.is_empty() {
            return Ok(());
        }

        let mut doomed: Vec<i64> = groups
            .iter()
            .flat_map(|g| g.duplicate_ids.iter().copied())
            .collect();
        doomed.sort_unstable();

        let mut script = Script::new();
        script.comment(format!(
            "Duplicate results in season {} ({}): {} groups, {} rows",
            self.season.id,
            self.season.description,
            groups.len(),
            doomed.len()
        ));

        for group in &groups {
            script.comment(format!(
                "program {}, swimmer {}: keep {}, drop {}",
                group.meeting_program_id,
                group.swimmer_id,
                group.keeper_id,
                id_list(&group.duplicate_ids)
            ));
        }

        if self.autofix {
            let ids = id_list(&doomed);
            script.push(format!(
                "DELETE FROM laps WHERE meeting_individual_result_id IN ({});",
                ids
            ));
            script.push(format!(
                "DELETE FROM meeting_individual_results WHERE id IN ({});",
                ids
            ));
        }
        script.blank();

        tracing::debug!(
            season_id = self.season.id,
            rows = doomed.len(),
            autofix = self.autofix,
            "duplicate results found"
        );

        self.script = script;
        Ok(())
    }

    fn script(&self) -> &Script {
        &self.script
    }
}
