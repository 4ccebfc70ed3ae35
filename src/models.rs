//! Core data models used throughout People Finder.
//!
//! These types represent the profile rows, the documents derived from them
//! for the vector index, and the explained matches returned by search.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Columns every profile file has, in the order used for a new file.
pub const PROFILE_COLUMNS: [&str; 7] = [
    "name",
    "email",
    "job_title",
    "department",
    "team",
    "skills",
    "experience",
];

/// One employee profile. Unset fields are empty strings, never null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub experience: String,
    /// Cells of any other column in the backing file, keyed by header name.
    /// Carried through rewrites untouched; not part of the indexed text.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl ProfileRecord {
    /// Cell value for a CSV column. Unknown columns read as `""`.
    pub fn column(&self, column: &str) -> &str {
        match column {
            "name" => &self.name,
            "email" => &self.email,
            "job_title" => &self.job_title,
            "department" => &self.department,
            "team" => &self.team,
            "skills" => &self.skills,
            "experience" => &self.experience,
            other => self.extra.get(other).map(String::as_str).unwrap_or(""),
        }
    }

    pub fn set_column(&mut self, column: &str, value: String) {
        match column {
            "name" => self.name = value,
            "email" => self.email = value,
            "job_title" => self.job_title = value,
            "department" => self.department = value,
            "team" => self.team = value,
            "skills" => self.skills = value,
            "experience" => self.experience = value,
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }
}

/// Fields submitted by a user when creating or updating a profile.
///
/// `None`, empty, and whitespace-only values are all treated as "not
/// provided".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
}

/// Document metadata stored alongside each indexed profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    pub email: String,
}

/// A document derived from a [`ProfileRecord`] for the vector index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorDocument {
    /// The profile's normalized email.
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl VectorDocument {
    pub fn from_record(record: &ProfileRecord) -> Self {
        let text = format!(
            "Name: {}\nEmail: {}\nTitle: {}\nDepartment: {}\nTeam: {}\nSkills: {}\nExperience: {}",
            record.name,
            record.email,
            record.job_title,
            record.department,
            record.team,
            record.skills,
            record.experience,
        );
        Self {
            id: record.email.clone(),
            text,
            metadata: DocumentMetadata {
                name: record.name.clone(),
                email: record.email.clone(),
            },
        }
    }
}

/// A document as returned by the index, with its similarity score when it
/// came from a query.
#[derive(Debug, Clone, Serialize)]
pub struct IndexedDocument {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// One explained match produced by the reasoning capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub name: String,
    pub email: String,
    pub relevance_explanation: String,
}
