use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Root entity: the aggregate being deduplicated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,

    /// Primary name
    pub name: String,

    /// Display name editable by team managers
    pub editable_name: Option<String>,

    /// Alternate names, `;`-delimited
    pub name_variations: Option<String>,

    pub city_id: Option<i64>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Linking entity: one row per (team, season)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAffiliation {
    pub id: i64,
    pub team_id: i64,
    pub season_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    pub id: i64,
    pub description: String,
}

/// Season-scoped sub-entity owned through a team affiliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: i64,
    pub swimmer_id: i64,
    pub team_id: i64,
    pub team_affiliation_id: i64,
    pub season_id: i64,
    pub category_type_id: i64,
    pub number: Option<String>,
}

/// Result rows sharing the same program and swimmer within a season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub meeting_program_id: i64,
    pub swimmer_id: i64,

    /// Lowest id of the group: the row that survives
    pub keeper_id: i64,

    /// Every other id of the group, ascending
    pub duplicate_ids: Vec<i64>,
}

impl Team {
    /// Alternate names as a list, blanks dropped
    pub fn variations(&self) -> Vec<&str> {
        self.name_variations
            .as_deref()
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .collect()
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Create the tables the merge tooling reads (plus the ones the generated
/// script writes to). Used for fixtures and local dry-runs against SQLite.
pub fn setup_database(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            editable_name TEXT,
            name_variations TEXT,
            city_id INTEGER,
            updated_at TEXT
        );
        CREATE TABLE IF NOT EXISTS team_aliases (
            id INTEGER PRIMARY KEY,
            team_id INTEGER NOT NULL,
            name TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS seasons (
            id INTEGER PRIMARY KEY,
            description TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS team_affiliations (
            id INTEGER PRIMARY KEY,
            team_id INTEGER NOT NULL,
            season_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            updated_at TEXT,
            UNIQUE (team_id, season_id)
        );
        CREATE TABLE IF NOT EXISTS badges (
            id INTEGER PRIMARY KEY,
            swimmer_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            team_affiliation_id INTEGER NOT NULL,
            season_id INTEGER NOT NULL,
            category_type_id INTEGER NOT NULL,
            number TEXT,
            updated_at TEXT
        );
        CREATE TABLE IF NOT EXISTS meeting_programs (
            id INTEGER PRIMARY KEY,
            season_id INTEGER NOT NULL
        );
        CREATE TABLE IF NOT EXISTS meeting_individual_results (
            id INTEGER PRIMARY KEY,
            meeting_program_id INTEGER NOT NULL,
            swimmer_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            team_affiliation_id INTEGER NOT NULL,
            badge_id INTEGER,
            updated_at TEXT
        );
        CREATE TABLE IF NOT EXISTS laps (
            id INTEGER PRIMARY KEY,
            meeting_individual_result_id INTEGER NOT NULL,
            team_id INTEGER NOT NULL,
            updated_at TEXT
        );",
    )
    .context("Failed to create merge schema")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_badges_team_season ON badges(team_id, season_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_mir_program ON meeting_individual_results(meeting_program_id, swimmer_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// ROW MAPPERS
// ============================================================================

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    let updated_at_str: Option<String> = row.get(5)?;
    let updated_at = updated_at_str
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(Team {
        id: row.get(0)?,
        name: row.get(1)?,
        editable_name: row.get(2)?,
        name_variations: row.get(3)?,
        city_id: row.get(4)?,
        updated_at,
    })
}

fn affiliation_from_row(row: &Row<'_>) -> rusqlite::Result<TeamAffiliation> {
    Ok(TeamAffiliation {
        id: row.get(0)?,
        team_id: row.get(1)?,
        season_id: row.get(2)?,
        name: row.get(3)?,
    })
}

fn badge_from_row(row: &Row<'_>) -> rusqlite::Result<Badge> {
    Ok(Badge {
        id: row.get(0)?,
        swimmer_id: row.get(1)?,
        team_id: row.get(2)?,
        team_affiliation_id: row.get(3)?,
        season_id: row.get(4)?,
        category_type_id: row.get(5)?,
        number: row.get(6)?,
    })
}

// ============================================================================
// QUERIES (read-only)
// ============================================================================

pub fn find_team(conn: &Connection, id: i64) -> Result<Option<Team>> {
    let team = conn
        .query_row(
            "SELECT id, name, editable_name, name_variations, city_id, updated_at
             FROM teams WHERE id = ?1",
            params![id],
            team_from_row,
        )
        .optional()
        .with_context(|| format!("Failed to load team {}", id))?;

    Ok(team)
}

/// Affiliations of a team, ordered by season so the script is reproducible
pub fn team_affiliations(conn: &Connection, team_id: i64) -> Result<Vec<TeamAffiliation>> {
    let mut stmt = conn.prepare(
        "SELECT id, team_id, season_id, name
         FROM team_affiliations
         WHERE team_id = ?1
         ORDER BY season_id ASC, id ASC",
    )?;

    let affiliations = stmt
        .query_map(params![team_id], affiliation_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(affiliations)
}

pub fn find_affiliation(
    conn: &Connection,
    team_id: i64,
    season_id: i64,
) -> Result<Option<TeamAffiliation>> {
    let affiliation = conn
        .query_row(
            "SELECT id, team_id, season_id, name
             FROM team_affiliations
             WHERE team_id = ?1 AND season_id = ?2",
            params![team_id, season_id],
            affiliation_from_row,
        )
        .optional()?;

    Ok(affiliation)
}

pub fn find_season(conn: &Connection, id: i64) -> Result<Option<Season>> {
    let season = conn
        .query_row(
            "SELECT id, description FROM seasons WHERE id = ?1",
            params![id],
            |row| {
                Ok(Season {
                    id: row.get(0)?,
                    description: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(season)
}

pub fn badges_for_team(conn: &Connection, team_id: i64) -> Result<Vec<Badge>> {
    let mut stmt = conn.prepare(
        "SELECT id, swimmer_id, team_id, team_affiliation_id, season_id, category_type_id, number
         FROM badges
         WHERE team_id = ?1
         ORDER BY season_id ASC, swimmer_id ASC, id ASC",
    )?;

    let badges = stmt
        .query_map(params![team_id], badge_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(badges)
}

/// Seasons in which a team took part at all (affiliation or badge)
pub fn participating_season_ids(conn: &Connection, team_id: i64) -> Result<BTreeSet<i64>> {
    let mut stmt = conn.prepare(
        "SELECT season_id FROM team_affiliations WHERE team_id = ?1
         UNION
         SELECT season_id FROM badges WHERE team_id = ?1",
    )?;

    let ids = stmt
        .query_map(params![team_id], |row| row.get(0))?
        .collect::<Result<BTreeSet<i64>, _>>()?;

    Ok(ids)
}

pub fn duplicate_result_groups(conn: &Connection, season_id: i64) -> Result<Vec<DuplicateGroup>> {
    let mut stmt = conn.prepare(
        "SELECT mir.meeting_program_id, mir.swimmer_id, mir.id
         FROM meeting_individual_results mir
         JOIN meeting_programs mp ON mp.id = mir.meeting_program_id
         WHERE mp.season_id = ?1
           AND (mir.meeting_program_id, mir.swimmer_id) IN (
               SELECT d.meeting_program_id, d.swimmer_id
               FROM meeting_individual_results d
               GROUP BY d.meeting_program_id, d.swimmer_id
               HAVING COUNT(*) > 1
           )
         ORDER BY mir.meeting_program_id ASC, mir.swimmer_id ASC, mir.id ASC",
    )?;

    let rows = stmt
        .query_map(params![season_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: Vec<DuplicateGroup> = Vec::new();
    for (program_id, swimmer_id, id) in rows {
        match groups.last_mut() {
            Some(group)
                if group.meeting_program_id == program_id && group.swimmer_id == swimmer_id =>
            {
                group.duplicate_ids.push(id);
            }
            _ => groups.push(DuplicateGroup {
                meeting_program_id: program_id,
                swimmer_id,
                keeper_id: id,
                duplicate_ids: Vec::new(),
            }),
        }
    }

    Ok(groups)
}
