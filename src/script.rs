// 📜 Script Accumulator - append-only SQL statement list
//
// Fragments produced by sub-mergers and cleaners are spliced in verbatim:
// they never carry their own transaction markers.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    lines: Vec<String>,
}

impl Script {
    pub fn new() -> Self {
        Script { lines: Vec::new() }
    }

    /// Append one statement line
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Append a `-- ` annotation. Line breaks are flattened so the text
    /// cannot end the comment.
    pub fn comment(&mut self, text: impl AsRef<str>) {
        let flat = text.as_ref().replace(['\r', '\n'], " ");
        self.lines.push(format!("-- {}", flat));
    }

    pub fn blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Splice another script's lines at the end, in order
    pub fn append(&mut self, other: &Script) {
        self.lines.extend(other.lines.iter().cloned());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of lines equal to `statement` (exact match)
    pub fn count_of(&self, statement: &str) -> usize {
        self.lines.iter().filter(|l| l.as_str() == statement).count()
    }

    pub fn to_sql(&self) -> String {
        let mut sql = self.lines.join("\n");
        sql.push('\n');
        sql
    }

    /// SHA-256 of the rendered script, for the operator to check that the
    /// reviewed file is the one being applied
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_sql());
        format!("{:x}", hasher.finalize())
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_sql())
            .with_context(|| format!("Failed to write script to {}", path.display()))?;
        Ok(())
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Double-quoted SQL string literal, escaping `\`, `"` and line breaks
pub fn sql_string(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r");
    format!("\"{}\"", escaped)
}

/// `1, 2, 3` for IN-lists
pub fn id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_order() {
        let mut main = Script::new();
        main.push("START TRANSACTION;");

        let mut fragment = Script::new();
        fragment.comment("fragment");
        fragment.push("DELETE FROM badges WHERE id=1;");

        main.append(&fragment);
        main.push("COMMIT;");

        assert_eq!(
            main.lines(),
            &[
                "START TRANSACTION;",
                "-- fragment",
                "DELETE FROM badges WHERE id=1;",
                "COMMIT;"
            ]
        );
        // The fragment is untouched
        assert_eq!(fragment.len(), 2);
    }

    #[test]
    fn test_comment_flattens_line_breaks() {
        let mut script = Script::new();
        script.comment("Rome SC\nDROP TABLE swimmers;\r\nx");

        assert_eq!(script.len(), 1);
        assert_eq!(script.lines()[0], "-- Rome SC DROP TABLE swimmers;  x");
        assert_eq!(script.to_sql().lines().count(), 1);
    }

    #[test]
    fn test_no_deduplication() {
        let mut script = Script::new();
        script.push("COMMIT;");
        script.push("COMMIT;");

        assert_eq!(script.count_of("COMMIT;"), 2);
    }

    #[test]
    fn test_checksum_is_stable() {
        let mut a = Script::new();
        a.push("SELECT 1;");
        let b = a.clone();

        assert_eq!(a.checksum(), b.checksum());
        assert_eq!(a.checksum().len(), 64);

        a.blank();
        assert_ne!(a.checksum(), b.checksum());
    }

    #[test]
    fn test_display_matches_sql() {
        let mut script = Script::new();
        script.push("SELECT 1;");
        script.blank();

        assert_eq!(script.to_string(), script.to_sql());
        assert_eq!(script.to_sql(), "SELECT 1;\n\n");
    }

    #[test]
    fn test_sql_string_escapes() {
        assert_eq!(sql_string("Rome SC"), "\"Rome SC\"");
        assert_eq!(sql_string("A \"B\""), "\"A \\\"B\\\"\"");
        assert_eq!(sql_string("C:\\x"), "\"C:\\\\x\"");
        assert_eq!(sql_string("a\nb\r"), "\"a\\nb\\r\"");
    }

    #[test]
    fn test_write_to() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merge.sql");

        let mut script = Script::new();
        script.push("COMMIT;");
        script.write_to(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "COMMIT;\n");
    }

    #[test]
    fn test_id_list() {
        assert_eq!(id_list(&[3, 1, 2]), "3, 1, 2");
        assert_eq!(id_list(&[]), "");
    }
}
