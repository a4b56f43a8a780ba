//! Bundle-scoped file access.
//!
//! Every path funnels through the resolver, so a caller can never be
//! handed content from outside the bundle it named. Reads past the
//! configured limit return a truncated prefix plus the true total length,
//! so a caller can request a narrower path if it needs more.

use crate::manifest::SkillMetadata;
use crate::resolver;
use skillbox_core::{SkillError, SkillResult};
use std::path::Path;
use tracing::info;

/// Subdirectory holding a bundle's read-only supporting documents.
pub const REFERENCES_DIR: &str = "references";
/// Subdirectory holding a bundle's executable helper scripts.
pub const SCRIPTS_DIR: &str = "scripts";

/// Outcome of a bounded resource read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The whole file fit within the limit.
    Full(String),
    /// The file was longer than the limit; `content` is exactly the first
    /// `max_chars` characters and `total_chars` is the true length.
    Truncated {
        /// Truncated prefix of the file.
        content: String,
        /// Total character count of the untruncated file.
        total_chars: usize,
    },
}

/// Sorted listing of a bundle's supporting files.
#[derive(Debug, Clone, Default)]
pub struct ResourceListing {
    /// File names under `references/`.
    pub references: Vec<String>,
    /// File names under `scripts/`.
    pub scripts: Vec<String>,
}

/// Read/write access to files inside a skill bundle.
pub struct ResourceStore {
    max_preview_chars: usize,
}

impl ResourceStore {
    /// Create a store with the given default read limit.
    pub fn new(max_preview_chars: usize) -> Self {
        Self { max_preview_chars }
    }

    /// Read a bundle file, truncating past `max_chars` (the configured
    /// preview limit when `None`). Truncation counts characters, not
    /// bytes, so multi-byte content never splits mid-character.
    pub async fn read(
        &self,
        skill: &SkillMetadata,
        relative: &str,
        max_chars: Option<usize>,
    ) -> SkillResult<ReadOutcome> {
        let path = resolver::resolve(&skill.root_path, relative)?;
        if !path.is_file() {
            return Err(SkillError::NotFound(format!(
                "resource '{relative}' not found in skill '{}'; call list_resources to see available files",
                skill.slug
            )));
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let max_chars = max_chars.unwrap_or(self.max_preview_chars);
        let total_chars = content.chars().count();

        if total_chars <= max_chars {
            return Ok(ReadOutcome::Full(content));
        }

        let cut = content
            .char_indices()
            .nth(max_chars)
            .map_or(content.len(), |(index, _)| index);
        Ok(ReadOutcome::Truncated {
            content: content[..cut].to_string(),
            total_chars,
        })
    }

    /// Write (or overwrite) a bundle file, creating intermediate
    /// directories as needed.
    pub async fn write(
        &self,
        skill: &SkillMetadata,
        relative: &str,
        content: &str,
    ) -> SkillResult<()> {
        let path = resolver::resolve(&skill.root_path, relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        info!(
            skill = %skill.slug,
            path = %relative,
            chars = content.len(),
            "Wrote resource"
        );
        Ok(())
    }

    /// Sorted file names of the bundle's `references/` and `scripts/`
    /// directories. Missing subdirectories yield empty lists.
    pub async fn list(&self, skill: &SkillMetadata) -> SkillResult<ResourceListing> {
        Ok(ResourceListing {
            references: list_files(&skill.root_path.join(REFERENCES_DIR)).await,
            scripts: list_files(&skill.root_path.join(SCRIPTS_DIR)).await,
        })
    }
}

async fn list_files(dir: &Path) -> Vec<String> {
    let mut names = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return names;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let is_file = entry
            .file_type()
            .await
            .map(|file_type| file_type.is_file())
            .unwrap_or(false);
        if is_file {
            if let Ok(name) = entry.file_name().into_string() {
                names.push(name);
            }
        }
    }
    names.sort();
    names
}
