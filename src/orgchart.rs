//! Org chart rows for the chart view.
//!
//! The org CSV has its own schema (`id, parentId, name, imageUrl, title,
//! department`). Every column is read as a string and empty cells become
//! `None`, so the JSON handed to the chart has `null` instead of `""` for
//! the root's `parentId`.

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgNode {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub id: Option<String>,
    #[serde(rename = "parentId", default, deserialize_with = "empty_as_none")]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(rename = "imageUrl", default, deserialize_with = "empty_as_none")]
    pub image_url: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub department: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

pub fn load_org_chart(path: &Path) -> Result<Vec<OrgNode>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open org chart file: {}", path.display()))?;

    let mut nodes = Vec::new();
    for (i, row) in reader.deserialize::<OrgNode>().enumerate() {
        nodes.push(row.with_context(|| format!("Failed to parse org chart row {}", i + 1))?);
    }
    Ok(nodes)
}
