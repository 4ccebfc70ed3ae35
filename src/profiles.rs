//! The profile table and its CSV mirror.
//!
//! [`ProfileTable`] is the source of truth for profile data. It is keyed on
//! the normalized (trimmed, lower-cased) email and is persisted by rewriting
//! the whole backing file on every mutation.
//!
//! The table keeps the header it was loaded with. Columns beyond the fixed
//! seven (`grade`, `location`, ...) are carried in [`ProfileRecord::extra`]
//! and written back in their original position; rows created here leave
//! them empty.
//!
//! # Merge rules
//!
//! | Case | Result |
//! |------|--------|
//! | email blank | rejected, no mutation |
//! | email known | non-blank incoming fields overwrite, blank ones keep the stored value |
//! | email new, name blank | rejected, no mutation |
//! | email new, name present | appended, unset fields stored as `""` |

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::error::FinderError;
use crate::models::{ProfileInput, ProfileRecord, PROFILE_COLUMNS};

/// Trim and lower-case an email so it can be used as the table key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Returns the trimmed value if it carries any content.
fn provided(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn merge_field(target: &mut String, incoming: &Option<String>) {
    if let Some(v) = provided(incoming) {
        *target = v.to_string();
    }
}

/// Whether an upsert created a row or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertKind {
    Created,
    Updated,
}

/// The row as it stands after a successful upsert.
#[derive(Debug, Clone)]
pub struct Upserted {
    pub kind: UpsertKind,
    pub record: ProfileRecord,
}

impl Upserted {
    /// Human-readable confirmation shown to the user.
    pub fn message(&self) -> String {
        match self.kind {
            UpsertKind::Created => format!(
                "New profile added for {} ({})",
                self.record.name, self.record.email
            ),
            UpsertKind::Updated => format!(
                "Profile updated for {} ({})",
                self.record.name, self.record.email
            ),
        }
    }
}

/// In-memory profile rows in insertion order, plus the file's column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileTable {
    columns: Vec<String>,
    rows: Vec<ProfileRecord>,
}

impl Default for ProfileTable {
    fn default() -> Self {
        Self {
            columns: PROFILE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

impl ProfileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `header` as the column order. Fixed columns it lacks are
    /// appended at the end.
    pub fn with_columns(mut self, header: impl IntoIterator<Item = String>) -> Self {
        let mut columns: Vec<String> = header.into_iter().collect();
        for fixed in PROFILE_COLUMNS {
            if !columns.iter().any(|c| c == fixed) {
                columns.push(fixed.to_string());
            }
        }
        self.columns = columns;
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Build a table from raw rows, normalizing emails.
    ///
    /// Rows without an email are dropped. When the same email appears more
    /// than once the first row wins.
    pub fn from_rows(rows: impl IntoIterator<Item = ProfileRecord>) -> Self {
        let mut seen = HashSet::new();
        let mut table = Vec::new();
        for mut row in rows {
            row.email = normalize_email(&row.email);
            if row.email.is_empty() {
                tracing::warn!(name = %row.name, "dropping profile row without email");
                continue;
            }
            if !seen.insert(row.email.clone()) {
                tracing::warn!(email = %row.email, "dropping duplicate profile row");
                continue;
            }
            table.push(row);
        }
        Self {
            rows: table,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[ProfileRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a row by email (normalized before comparison).
    pub fn get(&self, email: &str) -> Option<&ProfileRecord> {
        let key = normalize_email(email);
        self.rows.iter().find(|r| r.email == key)
    }

    /// Insert a new profile or merge into an existing one.
    ///
    /// Returns [`FinderError::Validation`] without touching the table when
    /// the email is blank, or when the email is new and the name is blank.
    pub fn upsert(&mut self, input: &ProfileInput) -> Result<Upserted, FinderError> {
        let email = provided(&input.email)
            .map(normalize_email)
            .ok_or_else(|| FinderError::validation("Error: Email is required"))?;

        if let Some(existing) = self.rows.iter_mut().find(|r| r.email == email) {
            merge_field(&mut existing.name, &input.name);
            merge_field(&mut existing.job_title, &input.job_title);
            merge_field(&mut existing.department, &input.department);
            merge_field(&mut existing.team, &input.team);
            merge_field(&mut existing.skills, &input.skills);
            merge_field(&mut existing.experience, &input.experience);
            return Ok(Upserted {
                kind: UpsertKind::Updated,
                record: existing.clone(),
            });
        }

        let name = provided(&input.name)
            .ok_or_else(|| FinderError::validation("Error: Name is required for new profiles"))?;

        let field = |v: &Option<String>| provided(v).unwrap_or_default().to_string();
        let record = ProfileRecord {
            name: name.to_string(),
            email,
            job_title: field(&input.job_title),
            department: field(&input.department),
            team: field(&input.team),
            skills: field(&input.skills),
            experience: field(&input.experience),
            extra: BTreeMap::new(),
        };
        self.rows.push(record.clone());

        Ok(Upserted {
            kind: UpsertKind::Created,
            record,
        })
    }
}

/// Load the table from a CSV file, creating the file with just a header row
/// if it does not exist yet.
///
/// Cells are matched to fields by header name. Missing columns and short
/// rows load as empty strings.
pub fn load_table(path: &Path) -> Result<ProfileTable> {
    if !path.exists() {
        let table = ProfileTable::new();
        save_table(path, &table)?;
        tracing::info!(path = %path.display(), "created empty profile file");
        return Ok(table);
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open profile file: {}", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Failed to parse row {} of {}", i + 1, path.display()))?;
        let mut row = ProfileRecord::default();
        for (column, value) in header.iter().zip(record.iter()) {
            row.set_column(column, value.to_string());
        }
        rows.push(row);
    }

    Ok(ProfileTable::from_rows(rows).with_columns(header))
}

/// Rewrite the whole CSV file from the table, keeping its column order.
///
/// Writes to a sibling temp file first and renames it over the target so a
/// failed write never leaves a truncated file behind.
pub fn save_table(path: &Path, table: &ProfileTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)
            .with_context(|| format!("Failed to create {}", tmp.display()))?;
        writer.write_record(table.columns())?;
        for row in table.rows() {
            writer.write_record(table.columns().iter().map(|c| row.column(c)))?;
        }
        writer.flush()?;
    }

    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace profile file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn input(name: &str, email: &str) -> ProfileInput {
        ProfileInput {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_blank_email_rejected() {
        let mut table = ProfileTable::new();
        let err = table.upsert(&input("Jane", "   ")).unwrap_err();
        assert!(matches!(err, FinderError::Validation(_)));
        assert!(table.is_empty());

        let err = table
            .upsert(&ProfileInput {
                name: Some("Jane".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, FinderError::Validation(_)));
    }

    #[test]
    fn test_new_profile_requires_name() {
        let mut table = ProfileTable::new();
        let err = table.upsert(&input(" ", "jane@x.com")).unwrap_err();
        assert_eq!(err.to_string(), "Error: Name is required for new profiles");
        assert!(table.is_empty());
    }

    #[test]
    fn test_create_normalizes_email() {
        let mut table = ProfileTable::new();
        let up = table
            .upsert(&ProfileInput {
                skills: Some("Go".into()),
                ..input("Jane Doe", "  JANE@X.COM ")
            })
            .unwrap();
        assert_eq!(up.kind, UpsertKind::Created);
        assert_eq!(up.message(), "New profile added for Jane Doe (jane@x.com)");
        assert_eq!(table.len(), 1);
        let row = table.get("jane@x.com").unwrap();
        assert_eq!(row.email, "jane@x.com");
        assert_eq!(row.skills, "Go");
        assert_eq!(row.team, "");
    }

    #[test]
    fn test_update_keeps_blank_fields() {
        let mut table = ProfileTable::new();
        table
            .upsert(&ProfileInput {
                skills: Some("Go".into()),
                team: Some("Platform".into()),
                ..input("Jane Doe", "jane@x.com")
            })
            .unwrap();

        let up = table
            .upsert(&ProfileInput {
                name: Some("".into()),
                email: Some("Jane@X.com".into()),
                department: Some("Eng".into()),
                skills: Some("   ".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(up.kind, UpsertKind::Updated);
        assert_eq!(up.message(), "Profile updated for Jane Doe (jane@x.com)");
        assert_eq!(table.len(), 1);
        let row = table.get("jane@x.com").unwrap();
        assert_eq!(row.name, "Jane Doe");
        assert_eq!(row.department, "Eng");
        assert_eq!(row.skills, "Go");
        assert_eq!(row.team, "Platform");
    }

    #[test]
    fn test_update_trims_incoming_values() {
        let mut table = ProfileTable::new();
        table.upsert(&input("Jane", "jane@x.com")).unwrap();
        table
            .upsert(&ProfileInput {
                email: Some("jane@x.com".into()),
                job_title: Some("  Staff Engineer ".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(table.get("jane@x.com").unwrap().job_title, "Staff Engineer");
    }

    #[test]
    fn test_from_rows_drops_blank_and_duplicate_emails() {
        let rows = vec![
            ProfileRecord {
                name: "A".into(),
                email: "A@x.com".into(),
                ..Default::default()
            },
            ProfileRecord {
                name: "No email".into(),
                ..Default::default()
            },
            ProfileRecord {
                name: "A again".into(),
                email: "a@x.com ".into(),
                ..Default::default()
            },
        ];
        let table = ProfileTable::from_rows(rows);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].name, "A");
    }

    #[test]
    fn test_csv_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("profiles.csv");

        let mut table = ProfileTable::new();
        table
            .upsert(&ProfileInput {
                skills: Some("Python, SQL".into()),
                experience: Some("Led the \"retention\" model\nand more".into()),
                ..input("John Doe", "john.doe@example.com")
            })
            .unwrap();
        table.upsert(&input("Jane Doe", "jane@x.com")).unwrap();

        save_table(&path, &table).unwrap();
        let loaded = load_table(&path).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn test_save_writes_header_for_empty_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/profiles.csv");
        let table = load_table(&path).unwrap();
        assert!(table.is_empty());
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.trim(),
            "name,email,job_title,department,team,skills,experience"
        );
    }

    #[test]
    fn test_load_tolerates_missing_columns_and_empty_cells() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("profiles.csv");
        std::fs::write(
            &path,
            "name,email,skills\nJane,JANE@X.COM,\nBob, bob@x.com ,Rust\n",
        )
        .unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.len(), 2);
        let jane = table.get("jane@x.com").unwrap();
        assert_eq!(jane.skills, "");
        assert_eq!(jane.experience, "");
        assert_eq!(table.get("bob@x.com").unwrap().skills, "Rust");
    }

    #[test]
    fn test_rewrite_keeps_extra_columns() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("profiles.csv");
        std::fs::write(
            &path,
            "name,email,job_title,department,team,skills,experience,grade,location\n\
             Ann,ann@x.com,,,,Go,,G7,London\n",
        )
        .unwrap();

        let mut table = load_table(&path).unwrap();
        assert_eq!(table.get("ann@x.com").unwrap().extra["grade"], "G7");

        table
            .upsert(&ProfileInput {
                email: Some("ann@x.com".into()),
                team: Some("Core".into()),
                ..Default::default()
            })
            .unwrap();
        table.upsert(&input("Bob", "bob@x.com")).unwrap();
        save_table(&path, &table).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "name,email,job_title,department,team,skills,experience,grade,location",
                "Ann,ann@x.com,,,Core,Go,,G7,London",
                "Bob,bob@x.com,,,,,,,",
            ]
        );
    }

    #[test]
    fn test_header_order_is_kept_and_fixed_columns_filled_in() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("profiles.csv");
        std::fs::write(&path, "email,help,name\nann@x.com,Ask me about Go,Ann\n").unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(&table.columns()[..3], &["email", "help", "name"]);
        assert_eq!(table.columns().len(), 8);

        save_table(&path, &table).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().next(),
            Some("email,help,name,job_title,department,team,skills,experience")
        );
        assert_eq!(
            load_table(&path).unwrap().get("ann@x.com").unwrap().extra["help"],
            "Ask me about Go"
        );
    }
}
