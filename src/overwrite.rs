// Destination column overwrite policy for the trailing `UPDATE teams`

use crate::db::Team;
use crate::script::sql_string;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnOverwrite {
    /// Replace the destination's descriptive columns with the source's
    /// non-empty ones (the primary name always)
    Full,

    /// Only add the source name to the destination's name variations
    Minimal,
}

impl ColumnOverwrite {
    pub fn from_flag(full_overwrite: bool) -> Self {
        if full_overwrite {
            ColumnOverwrite::Full
        } else {
            ColumnOverwrite::Minimal
        }
    }

    /// SET clause entries, `updated_at` included
    pub fn assignments(&self, source: &Team, dest: &Team) -> Vec<String> {
        let mut assignments = Vec::new();

        match self {
            ColumnOverwrite::Full => {
                assignments.push(format!("name={}", sql_string(&source.name)));

                if let Some(editable_name) = non_empty(source.editable_name.as_deref()) {
                    assignments.push(format!("editable_name={}", sql_string(editable_name)));
                }
                if let Some(variations) = non_empty(source.name_variations.as_deref()) {
                    assignments.push(format!("name_variations={}", sql_string(variations)));
                }
                if let Some(city_id) = source.city_id {
                    assignments.push(format!("city_id={}", city_id));
                }
            }
            ColumnOverwrite::Minimal => {
                if let Some(variations) = merged_variations(source, dest) {
                    assignments.push(format!("name_variations={}", sql_string(&variations)));
                }
            }
        }

        assignments.push("updated_at=NOW()".to_string());
        assignments
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Destination variations with the source name appended, or `None` when it
/// is already listed
fn merged_variations(source: &Team, dest: &Team) -> Option<String> {
    let name = source.name.trim();
    let mut variations = dest.variations();
    if name.is_empty() || variations.iter().any(|v| *v == name) {
        return None;
    }

    variations.push(name);
    Some(variations.join(";"))
}

/// Full `UPDATE teams ...` statement for the destination row
pub fn destination_update(policy: ColumnOverwrite, source: &Team, dest: &Team) -> String {
    format!(
        "UPDATE teams SET {} WHERE id={};",
        policy.assignments(source, dest).join(", "),
        dest.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(id: i64, name: &str, editable: Option<&str>, variations: Option<&str>, city: Option<i64>) -> Team {
        Team {
            id,
            name: name.to_string(),
            editable_name: editable.map(String::from),
            name_variations: variations.map(String::from),
            city_id: city,
            updated_at: None,
        }
    }

    #[test]
    fn test_full_overwrite_copies_present_values() {
        let source = team(10, "Rome SC", Some("Rome Swim Club"), None, Some(7));
        let dest = team(20, "Rome Swim", Some("Old"), Some("Roma Nuoto"), Some(3));

        let sql = destination_update(ColumnOverwrite::Full, &source, &dest);
        assert_eq!(
            sql,
            "UPDATE teams SET name=\"Rome SC\", editable_name=\"Rome Swim Club\", city_id=7, updated_at=NOW() WHERE id=20;"
        );
    }

    #[test]
    fn test_full_overwrite_skips_empty_source_values() {
        let source = team(10, "Rome SC", Some("  "), Some(""), None);
        let dest = team(20, "Rome Swim", Some("Old"), Some("Roma Nuoto"), Some(3));

        let assignments = ColumnOverwrite::Full.assignments(&source, &dest);
        assert_eq!(assignments, vec!["name=\"Rome SC\"", "updated_at=NOW()"]);
    }

    #[test]
    fn test_minimal_appends_source_name() {
        let source = team(10, "Rome SC", None, None, None);
        let dest = team(20, "Rome Swim", None, Some("Roma Nuoto"), None);

        let sql = destination_update(ColumnOverwrite::Minimal, &source, &dest);
        assert_eq!(
            sql,
            "UPDATE teams SET name_variations=\"Roma Nuoto;Rome SC\", updated_at=NOW() WHERE id=20;"
        );
        assert!(!sql.contains("name=\""));
    }

    #[test]
    fn test_minimal_with_no_variations() {
        let source = team(10, "Rome SC", None, None, None);
        let dest = team(20, "Rome Swim", None, None, None);

        let assignments = ColumnOverwrite::Minimal.assignments(&source, &dest);
        assert_eq!(assignments[0], "name_variations=\"Rome SC\"");
    }

    #[test]
    fn test_minimal_does_not_duplicate_variation() {
        let source = team(10, "Roma Nuoto", None, None, None);
        let dest = team(20, "Rome Swim", None, Some("Rome;Roma Nuoto"), None);

        let assignments = ColumnOverwrite::Minimal.assignments(&source, &dest);
        assert_eq!(assignments, vec!["updated_at=NOW()"]);
    }

    #[test]
    fn test_minimal_ignores_blank_source_name() {
        let source = team(10, "   ", None, None, None);
        let dest = team(20, "Rome Swim", None, Some("Roma Nuoto"), None);

        let assignments = ColumnOverwrite::Minimal.assignments(&source, &dest);
        assert_eq!(assignments, vec!["updated_at=NOW()"]);
    }

    #[test]
    fn test_from_flag() {
        assert_eq!(ColumnOverwrite::from_flag(true), ColumnOverwrite::Full);
        assert_eq!(ColumnOverwrite::from_flag(false), ColumnOverwrite::Minimal);
    }
}
