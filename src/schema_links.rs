// Schema coupling for team merges
//
// Every foreign key that can point at a team, a team affiliation or a badge
// is listed here. When the schema gains a new referencing table, it must be
// added to the matching list below and SCHEMA_LINKS_VERSION bumped.

/// Bumped whenever one of the link lists changes
pub const SCHEMA_LINKS_VERSION: u32 = 3;

/// A table holding a foreign key plus the columns rewritten together with it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkTable {
    pub table: &'static str,

    /// Foreign key matched in the WHERE clause
    pub column: &'static str,

    /// Denormalized columns that must follow the foreign key
    pub cascade: &'static [&'static str],
}

impl LinkTable {
    const fn new(
        table: &'static str,
        column: &'static str,
        cascade: &'static [&'static str],
    ) -> Self {
        LinkTable {
            table,
            column,
            cascade,
        }
    }

    pub fn has_cascade(&self) -> bool {
        !self.cascade.is_empty()
    }
}

// ============================================================================
// LINK LISTS
// ============================================================================

/// Retired reservation tables: rows are deleted, never migrated
pub const RESERVATION_TABLES: [LinkTable; 3] = [
    LinkTable::new("meeting_event_reservations", "team_id", &[]),
    LinkTable::new("meeting_relay_reservations", "team_id", &[]),
    LinkTable::new("meeting_reservations", "team_id", &[]),
];

/// Tables pointing at the team directly, not through an affiliation
pub const TEAM_LINKS: [LinkTable; 8] = [
    LinkTable::new("computed_season_rankings", "team_id", &[]),
    LinkTable::new("goggle_cups", "team_id", &[]),
    LinkTable::new("individual_records", "team_id", &[]),
    LinkTable::new("laps", "team_id", &[]),
    LinkTable::new("relay_laps", "team_id", &[]),
    LinkTable::new("relay_records", "team_id", &[]),
    LinkTable::new("team_lap_templates", "team_id", &[]),
    LinkTable::new("user_workshops", "team_id", &[]),
];

/// Season-scoped tables keyed by team affiliation
pub const AFFILIATION_LINKS: [LinkTable; 6] = [
    LinkTable::new("badges", "team_affiliation_id", &["team_id"]),
    LinkTable::new("managed_affiliations", "team_affiliation_id", &[]),
    LinkTable::new("meeting_entries", "team_affiliation_id", &["team_id"]),
    LinkTable::new("meeting_individual_results", "team_affiliation_id", &["team_id"]),
    LinkTable::new("meeting_relay_results", "team_affiliation_id", &["team_id"]),
    LinkTable::new("meeting_team_scores", "team_affiliation_id", &["team_id"]),
];

/// Tables referencing a badge; cascade carries the owning team and affiliation
pub const BADGE_LINKS: [LinkTable; 4] = [
    LinkTable::new("badge_payments", "badge_id", &[]),
    LinkTable::new("meeting_entries", "badge_id", &["team_id", "team_affiliation_id"]),
    LinkTable::new(
        "meeting_individual_results",
        "badge_id",
        &["team_id", "team_affiliation_id"],
    ),
    LinkTable::new("meeting_relay_swimmers", "badge_id", &[]),
];

// ============================================================================
// STATEMENT RENDERING
// ============================================================================

/// `UPDATE <table> SET <column>=<to>[, <cascade>=<value>...] WHERE <column>=<from>;`
///
/// `cascade_values` pairs positionally with `link.cascade`; missing values
/// leave the corresponding column untouched.
pub fn redirect(link: &LinkTable, from: i64, to: i64, cascade_values: &[i64]) -> String {
    let mut assignments = vec![format!("{}={}", link.column, to)];
    assignments.extend(
        link.cascade
            .iter()
            .zip(cascade_values)
            .map(|(column, value)| format!("{}={}", column, value)),
    );

    format!(
        "UPDATE {} SET {} WHERE {}={};",
        link.table,
        assignments.join(", "),
        link.column,
        from
    )
}

/// Rewrites only the cascade columns of the rows matching `key`: the
/// foreign key itself is kept. Returns `None` for tables without cascade.
pub fn reassign_cascade(link: &LinkTable, key: i64, cascade_values: &[i64]) -> Option<String> {
    if !link.has_cascade() {
        return None;
    }

    let assignments: Vec<String> = link
        .cascade
        .iter()
        .zip(cascade_values)
        .map(|(column, value)| format!("{}={}", column, value))
        .collect();

    if assignments.is_empty() {
        return None;
    }

    Some(format!(
        "UPDATE {} SET {} WHERE {}={};",
        link.table,
        assignments.join(", "),
        link.column,
        key
    ))
}

pub fn delete_by(link: &LinkTable, key: i64) -> String {
    format!("DELETE FROM {} WHERE {}={};", link.table, link.column, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_team_links_are_eight_distinct_tables() {
        let tables: HashSet<&str> = TEAM_LINKS.iter().map(|l| l.table).collect();
        assert_eq!(tables.len(), 8);
        assert!(TEAM_LINKS.iter().all(|l| l.column == "team_id" && !l.has_cascade()));
    }

    #[test]
    fn test_affiliation_links_cover_badges() {
        assert!(AFFILIATION_LINKS
            .iter()
            .any(|l| l.table == "badges" && l.cascade == ["team_id"]));
        assert!(AFFILIATION_LINKS
            .iter()
            .all(|l| l.column == "team_affiliation_id"));
    }

    #[test]
    fn test_redirect_with_cascade() {
        let sql = redirect(&AFFILIATION_LINKS[0], 105, 205, &[20]);
        assert_eq!(
            sql,
            "UPDATE badges SET team_affiliation_id=205, team_id=20 WHERE team_affiliation_id=105;"
        );
    }

    #[test]
    fn test_redirect_without_cascade() {
        let sql = redirect(&TEAM_LINKS[0], 10, 20, &[]);
        assert_eq!(
            sql,
            "UPDATE computed_season_rankings SET team_id=20 WHERE team_id=10;"
        );
    }

    #[test]
    fn test_reassign_cascade_keeps_foreign_key() {
        let sql = reassign_cascade(&AFFILIATION_LINKS[2], 106, &[20]).unwrap();
        assert_eq!(
            sql,
            "UPDATE meeting_entries SET team_id=20 WHERE team_affiliation_id=106;"
        );

        // managed_affiliations has nothing to rewrite
        assert!(reassign_cascade(&AFFILIATION_LINKS[1], 106, &[20]).is_none());
    }

    #[test]
    fn test_delete_by() {
        assert_eq!(
            delete_by(&RESERVATION_TABLES[2], 10),
            "DELETE FROM meeting_reservations WHERE team_id=10;"
        );
    }
}
