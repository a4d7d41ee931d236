// 🔎 Team Checker - compares two team records before a merge
//
// Finds the seasons both teams took part in, pairs up the badges that
// belong to the same swimmer in the same season, and lists the source
// badges with no destination counterpart.

use crate::db::{self, Badge, Team};
use crate::error::Result;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// COMPARISON REPORT
// ============================================================================

/// Two badges describing the same logical item; either side may be missing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeCouple {
    pub source: Option<Badge>,
    pub dest: Option<Badge>,
}

impl BadgeCouple {
    pub fn new(source: Badge, dest: Badge) -> Self {
        BadgeCouple {
            source: Some(source),
            dest: Some(dest),
        }
    }

    /// Both sides, if present
    pub fn pair(&self) -> Option<(&Badge, &Badge)> {
        match (&self.source, &self.dest) {
            (Some(source), Some(dest)) => Some((source, dest)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub source_id: i64,
    pub dest_id: i64,

    /// Seasons where both teams have any participation
    pub shared_season_ids: BTreeSet<i64>,

    /// season_id → badge pairs for the same swimmer
    pub shared_badges: BTreeMap<i64, Vec<BadgeCouple>>,

    /// season_id → source badges without a destination counterpart
    pub orphan_badges: BTreeMap<i64, Vec<Badge>>,

    /// Anything the operator should look at before applying the script
    pub warnings: Vec<String>,
}

impl ComparisonReport {
    pub fn new(source_id: i64, dest_id: i64) -> Self {
        ComparisonReport {
            source_id,
            dest_id,
            ..Default::default()
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "Team ({}) |=> ({}): {} shared seasons, {} badge couples, {} orphan badges, {} warnings",
            self.source_id,
            self.dest_id,
            self.shared_season_ids.len(),
            self.shared_badges.values().map(Vec::len).sum::<usize>(),
            self.orphan_badges.values().map(Vec::len).sum::<usize>(),
            self.warnings.len()
        )
    }

    /// Multi-line, human readable rendering
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        out.push(self.summary());

        for season_id in &self.shared_season_ids {
            out.push(format!("Season {}:", season_id));

            for couple in self.shared_badges.get(season_id).into_iter().flatten() {
                out.push(format!(
                    "  couple: {} |=> {}",
                    describe(couple.source.as_ref()),
                    describe(couple.dest.as_ref())
                ));
            }
            for badge in self.orphan_badges.get(season_id).into_iter().flatten() {
                out.push(format!("  orphan: {}", describe(Some(badge))));
            }
        }

        for warning in &self.warnings {
            out.push(format!("WARNING: {}", warning));
        }

        out.join("\n")
    }
}

fn describe(badge: Option<&Badge>) -> String {
    match badge {
        Some(b) => format!("badge {} (swimmer {}, TA {})", b.id, b.swimmer_id, b.team_affiliation_id),
        None => "-".to_string(),
    }
}

// ============================================================================
// CHECKER
// ============================================================================

pub trait Checker {
    /// Computes the report. Returns `false` when the report carries warnings;
    /// the result is advisory and never blocks a merge.
    fn run(&mut self) -> Result<bool>;

    fn report(&self) -> &ComparisonReport;

    fn display_report(&self) -> String {
        self.report().render()
    }

    fn shared_season_ids(&self) -> &BTreeSet<i64> {
        &self.report().shared_season_ids
    }

    fn shared_badges(&self) -> &BTreeMap<i64, Vec<BadgeCouple>> {
        &self.report().shared_badges
    }

    fn orphan_badges(&self) -> &BTreeMap<i64, Vec<Badge>> {
        &self.report().orphan_badges
    }
}

/// Store-backed checker
pub struct TeamChecker<'a> {
    conn: &'a Connection,
    source: Team,
    dest: Team,
    report: ComparisonReport,
}

impl<'a> TeamChecker<'a> {
    pub fn new(conn: &'a Connection, source: &Team, dest: &Team) -> Self {
        TeamChecker {
            conn,
            source: source.clone(),
            dest: dest.clone(),
            report: ComparisonReport::new(source.id, dest.id),
        }
    }
}

impl Checker for TeamChecker<'_> {
    fn run(&mut self) -> Result<bool> {
        let mut report = ComparisonReport::new(self.source.id, self.dest.id);

        let source_seasons = db::participating_season_ids(self.conn, self.source.id)?;
        let dest_seasons = db::participating_season_ids(self.conn, self.dest.id)?;
        report.shared_season_ids = source_seasons.intersection(&dest_seasons).copied().collect();

        let dest_badges = db::badges_for_team(self.conn, self.dest.id)?;
        let mut dest_by_key: BTreeMap<(i64, i64), Vec<Badge>> = BTreeMap::new();
        for badge in dest_badges {
            dest_by_key
                .entry((badge.season_id, badge.swimmer_id))
                .or_default()
                .push(badge);
        }

        for badge in db::badges_for_team(self.conn, self.source.id)? {
            let key = (badge.season_id, badge.swimmer_id);
            match dest_by_key.get(&key).map(Vec::as_slice) {
                None | Some([]) => {
                    report.orphan_badges.entry(badge.season_id).or_default().push(badge);
                }
                Some([dest]) => {
                    report
                        .shared_badges
                        .entry(badge.season_id)
                        .or_default()
                        .push(BadgeCouple::new(badge, dest.clone()));
                }
                Some(many) => {
                    report.warnings.push(format!(
                        "swimmer {} has {} destination badges in season {}: badge {} paired with badge {}",
                        badge.swimmer_id,
                        many.len(),
                        badge.season_id,
                        badge.id,
                        many[0].id
                    ));
                    // Ambiguous: lowest destination id wins
                    report
                        .shared_badges
                        .entry(badge.season_id)
                        .or_default()
                        .push(BadgeCouple::new(badge, many[0].clone()));
                }
            }
        }

        if self.source.name == self.dest.name {
            report
                .warnings
                .push(format!("both teams are named '{}'", self.source.name));
        }

        tracing::debug!(summary = %report.summary(), "team comparison done");

        let ok = !report.has_warnings();
        self.report = report;
        Ok(ok)
    }

    fn report(&self) -> &ComparisonReport {
        &self.report
    }
}
