// 🏅 Badge Merger - folds one source badge into its destination twin
//
// Produces a fragment only: no transaction markers, the caller owns those.

use crate::db::Badge;
use crate::error::{MergeError, Result};
use crate::schema_links::{self, BADGE_LINKS};
use crate::script::Script;

/// Merges one pair of season-scoped sub-entities into a script fragment
pub trait SubMerger {
    fn prepare(&mut self) -> Result<()>;

    fn script(&self) -> &Script;
}

pub struct BadgeMerger {
    source: Badge,
    dest: Badge,

    /// Rows moved to the destination badge take the destination team and
    /// affiliation; otherwise the destination badge moves onto the source's
    keep_dest_team: bool,

    /// Merge even when the category types differ
    force: bool,

    script: Script,
}

impl BadgeMerger {
    pub fn new(source: &Badge, dest: &Badge, keep_dest_team: bool, force: bool) -> Self {
        BadgeMerger {
            source: source.clone(),
            dest: dest.clone(),
            keep_dest_team,
            force,
            script: Script::new(),
        }
    }

    fn check(&self) -> Result<()> {
        if self.source.id == self.dest.id {
            return Err(MergeError::BadgeConflict(format!(
                "badge {} cannot be merged with itself",
                self.source.id
            )));
        }

        if self.source.swimmer_id != self.dest.swimmer_id {
            return Err(MergeError::BadgeConflict(format!(
                "badges {} and {} belong to different swimmers ({} vs {})",
                self.source.id, self.dest.id, self.source.swimmer_id, self.dest.swimmer_id
            )));
        }

        if self.source.season_id != self.dest.season_id {
            return Err(MergeError::BadgeConflict(format!(
                "badges {} and {} belong to different seasons ({} vs {})",
                self.source.id, self.dest.id, self.source.season_id, self.dest.season_id
            )));
        }

        if self.source.category_type_id != self.dest.category_type_id && !self.force {
            return Err(MergeError::BadgeConflict(format!(
                "badges {} and {} have different categories ({} vs {}); use force to override",
                self.source.id, self.dest.id, self.source.category_type_id, self.dest.category_type_id
            )));
        }

        Ok(())
    }
}

impl SubMerger for BadgeMerger {
    fn prepare(&mut self) -> Result<()> {
        if !self.script.is_empty() {
            return Ok(());
        }

        self.check()?;

        let (team_id, team_affiliation_id) = if self.keep_dest_team {
            (self.dest.team_id, self.dest.team_affiliation_id)
        } else {
            (self.source.team_id, self.source.team_affiliation_id)
        };

        let mut script = Script::new();
        script.comment(format!(
            "Merge badge ({}) |=> ({}), swimmer {}",
            self.source.id, self.dest.id, self.source.swimmer_id
        ));

        if !self.keep_dest_team {
            script.push(format!(
                "UPDATE badges SET team_id={}, team_affiliation_id={} WHERE id={};",
                team_id, team_affiliation_id, self.dest.id
            ));
        }

        for link in BADGE_LINKS.iter() {
            script.push(schema_links::redirect(
                link,
                self.source.id,
                self.dest.id,
                &[team_id, team_affiliation_id],
            ));
        }

        script.push(format!("DELETE FROM badges WHERE id={};", self.source.id));
        script.blank();

        self.script = script;
        Ok(())
    }

    fn script(&self) -> &Script {
        &self.script
    }
}
