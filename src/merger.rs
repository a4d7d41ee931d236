// 🔀 Team Merger - compiles the SQL script that folds a duplicate team
// into its survivor
//
// Nothing is written to the store: the output is a single transaction for
// an operator to review and apply.
//
// Phases, in order:
//   1. transaction header
//   2. retired reservation rows of the source team
//   3. per season of the source team (ascending season id):
//        destination affiliation present → merge branch
//        destination affiliation absent  → recycle branch
//   4. team-only links
//   5. duplicate result cleanup for every shared season
//   6. destination column overwrite
//   7. source alias + team deletion, commit

use crate::badge_merger::{BadgeMerger, SubMerger};
use crate::checker::{Checker, ComparisonReport, TeamChecker};
use crate::cleaner::{DuplicateCleaner, ResultCleaner};
use crate::db::{self, Badge, Season, Team, TeamAffiliation};
use crate::error::{MergeError, Result};
use crate::overwrite::{destination_update, ColumnOverwrite};
use crate::schema_links::{self, AFFILIATION_LINKS, RESERVATION_TABLES, TEAM_LINKS};
use crate::script::{id_list, Script};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

// ============================================================================
// OPTIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOptions {
    /// Overwrite the destination's descriptive columns with the source's
    pub full_overwrite: bool,

    /// Passed to every badge merger
    pub force: bool,

    /// Let the duplicate cleaner emit deletions
    pub autofix: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        MergeOptions {
            full_overwrite: false,
            force: false,
            autofix: true,
        }
    }
}

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Builds the transient collaborators used during `prepare()`
pub trait Delegates {
    fn badge_merger(
        &self,
        source: &Badge,
        dest: &Badge,
        keep_dest_team: bool,
        force: bool,
    ) -> Box<dyn SubMerger + '_>;

    fn cleaner(&self, season: &Season, autofix: bool) -> Box<dyn DuplicateCleaner + '_>;
}

/// Default collaborators backed by the store
pub struct StoreDelegates<'a> {
    conn: &'a Connection,
}

impl<'a> StoreDelegates<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        StoreDelegates { conn }
    }
}

impl Delegates for StoreDelegates<'_> {
    fn badge_merger(
        &self,
        source: &Badge,
        dest: &Badge,
        keep_dest_team: bool,
        force: bool,
    ) -> Box<dyn SubMerger + '_> {
        Box::new(BadgeMerger::new(source, dest, keep_dest_team, force))
    }

    fn cleaner(&self, season: &Season, autofix: bool) -> Box<dyn DuplicateCleaner + '_> {
        Box::new(ResultCleaner::new(self.conn, season, autofix))
    }
}

/// How a season of the source team is merged
#[derive(Debug, Clone, PartialEq)]
pub enum SeasonTarget {
    /// The destination already has an affiliation for the season
    Merge(TeamAffiliation),

    /// Only the source has one: it is handed over to the destination
    Recycle,
}

// ============================================================================
// TEAM MERGER
// ============================================================================

pub struct TeamMerger<'a> {
    conn: &'a Connection,
    source: Team,
    dest: Team,
    options: MergeOptions,
    checker: Box<dyn Checker + 'a>,
    delegates: Box<dyn Delegates + 'a>,
    script: Script,
}

impl<'a> TeamMerger<'a> {
    pub fn new(conn: &'a Connection, source: Team, dest: Team, options: MergeOptions) -> Result<Self> {
        if source.id == dest.id {
            return Err(MergeError::InvalidArgument(format!(
                "source and destination are the same team ({})",
                source.id
            )));
        }

        let checker: Box<dyn Checker + 'a> = Box::new(TeamChecker::new(conn, &source, &dest));

        Ok(TeamMerger {
            conn,
            source,
            dest,
            options,
            checker,
            delegates: Box::new(StoreDelegates::new(conn)),
            script: Script::new(),
        })
    }

    /// Resolves both teams from the store first
    pub fn from_ids(conn: &'a Connection, source_id: i64, dest_id: i64, options: MergeOptions) -> Result<Self> {
        let source = db::find_team(conn, source_id)?
            .ok_or_else(|| MergeError::InvalidArgument(format!("source team {} not found", source_id)))?;
        let dest = db::find_team(conn, dest_id)?
            .ok_or_else(|| MergeError::InvalidArgument(format!("destination team {} not found", dest_id)))?;

        Self::new(conn, source, dest, options)
    }

    pub fn with_checker(mut self, checker: impl Checker + 'a) -> Self {
        self.checker = Box::new(checker);
        self
    }

    pub fn with_delegates(mut self, delegates: impl Delegates + 'a) -> Self {
        self.delegates = Box::new(delegates);
        self
    }

    pub fn source(&self) -> &Team {
        &self.source
    }

    pub fn dest(&self) -> &Team {
        &self.dest
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn report(&self) -> &ComparisonReport {
        self.checker.report()
    }

    pub fn report_text(&self) -> String {
        self.checker.display_report()
    }

    /// Builds the whole script. A second call is a no-op.
    ///
    /// Badge merge failures are written into the script as warnings and do
    /// not stop the run; only store read failures are returned.
    pub fn prepare(&mut self) -> Result<()> {
        if !self.script.is_empty() {
            return Ok(());
        }

        tracing::info!(source = self.source.id, dest = self.dest.id, "preparing team merge");

        let clean = self.checker.run()?;
        if !clean {
            tracing::warn!("comparison reported warnings; review the report before applying");
        }
        tracing::info!(summary = %self.checker.report().summary(), "comparison done");
        tracing::debug!("{}", self.checker.display_report());

        let mut script = Script::new();
        self.write_header(&mut script);
        self.write_reservation_deletions(&mut script);

        for source_ta in db::team_affiliations(self.conn, self.source.id)? {
            match self.season_target(&source_ta)? {
                SeasonTarget::Merge(dest_ta) => self.write_merge_branch(&mut script, &source_ta, &dest_ta),
                SeasonTarget::Recycle => self.write_recycle_branch(&mut script, &source_ta),
            }
        }

        self.write_team_links(&mut script);
        self.write_cleanup(&mut script)?;
        self.write_footer(&mut script);

        tracing::info!(lines = script.len(), checksum = %script.checksum(), "merge script ready");
        self.script = script;
        Ok(())
    }

    fn season_target(&self, source_ta: &TeamAffiliation) -> Result<SeasonTarget> {
        let target = match db::find_affiliation(self.conn, self.dest.id, source_ta.season_id)? {
            Some(dest_ta) => SeasonTarget::Merge(dest_ta),
            None => SeasonTarget::Recycle,
        };
        Ok(target)
    }

    // ------------------------------------------------------------------------
    // Phases
    // ------------------------------------------------------------------------

    fn write_header(&self, script: &mut Script) {
        script.push("SET AUTOCOMMIT = 0;");
        script.push("START TRANSACTION;");
        script.blank();
        script.comment(format!(
            "Merge team ({}) {} |=> ({}) {}",
            self.source.id, self.source.name, self.dest.id, self.dest.name
        ));
        script.blank();
    }

    fn write_reservation_deletions(&self, script: &mut Script) {
        script.comment("Retired reservations");
        for link in RESERVATION_TABLES.iter() {
            script.push(schema_links::delete_by(link, self.source.id));
        }
        script.blank();
    }

    fn write_merge_branch(&self, script: &mut Script, source_ta: &TeamAffiliation, dest_ta: &TeamAffiliation) {
        let season_id = source_ta.season_id;
        script.comment(format!(
            "Season {}: merge TA ({}) |=> TA ({})",
            season_id, source_ta.id, dest_ta.id
        ));

        let couples = self.checker.shared_badges().get(&season_id);
        for (source_badge, dest_badge) in couples.into_iter().flatten().filter_map(|c| c.pair()) {
            let mut merger = self
                .delegates
                .badge_merger(source_badge, dest_badge, true, self.options.force);

            match merger.prepare() {
                Ok(()) => script.append(merger.script()),
                Err(e) => {
                    tracing::warn!(
                        season_id,
                        source_badge = source_badge.id,
                        dest_badge = dest_badge.id,
                        error = %e,
                        "badge merge failed"
                    );
                    script.comment(format!(
                        "WARNING: badge merge ({}) |=> ({}) failed: {}. Resolve this pair manually.",
                        source_badge.id, dest_badge.id, e
                    ));
                }
            }
        }

        let orphan_ids: Vec<i64> = self
            .checker
            .orphan_badges()
            .get(&season_id)
            .into_iter()
            .flatten()
            .map(|b| b.id)
            .collect();
        if !orphan_ids.is_empty() {
            script.comment(format!("Orphan badges of season {}", season_id));
            script.push(format!(
                "UPDATE badges SET team_id={}, team_affiliation_id={} WHERE id IN ({});",
                self.dest.id,
                dest_ta.id,
                id_list(&orphan_ids)
            ));
        }

        for link in AFFILIATION_LINKS.iter() {
            script.push(schema_links::redirect(link, source_ta.id, dest_ta.id, &[self.dest.id]));
        }
        script.push(format!("DELETE FROM team_affiliations WHERE id={};", source_ta.id));
        script.blank();
    }

    fn write_recycle_branch(&self, script: &mut Script, source_ta: &TeamAffiliation) {
        script.comment(format!(
            "Season {}: TA ({}) moves to team ({})",
            source_ta.season_id, source_ta.id, self.dest.id
        ));

        for link in AFFILIATION_LINKS.iter() {
            if let Some(sql) = schema_links::reassign_cascade(link, source_ta.id, &[self.dest.id]) {
                script.push(sql);
            }
        }
        script.push(format!(
            "UPDATE team_affiliations SET team_id={} WHERE id={};",
            self.dest.id, source_ta.id
        ));
        script.blank();
    }

    fn write_team_links(&self, script: &mut Script) {
        script.comment("Team-only links");
        for link in TEAM_LINKS.iter() {
            script.push(schema_links::redirect(link, self.source.id, self.dest.id, &[]));
        }
        script.blank();
    }

    fn write_cleanup(&self, script: &mut Script) -> Result<()> {
        for &season_id in self.checker.shared_season_ids() {
            let Some(season) = db::find_season(self.conn, season_id)? else {
                tracing::debug!(season_id, "shared season not found, cleanup skipped");
                continue;
            };

            let mut cleaner = self.delegates.cleaner(&season, self.options.autofix);
            match cleaner.prepare() {
                Ok(()) => script.append(cleaner.script()),
                Err(e) => {
                    tracing::warn!(season_id, error = %e, "duplicate cleanup failed");
                    script.comment(format!(
                        "WARNING: duplicate cleanup for season {} failed: {}",
                        season_id, e
                    ));
                }
            }
        }
        Ok(())
    }

    fn write_footer(&self, script: &mut Script) {
        let policy = ColumnOverwrite::from_flag(self.options.full_overwrite);
        script.push(destination_update(policy, &self.source, &self.dest));
        script.push(format!("DELETE FROM team_aliases WHERE team_id={};", self.source.id));
        script.push(format!("DELETE FROM teams WHERE id={};", self.source.id));
        script.blank();
        script.push("COMMIT;");
    }
}
