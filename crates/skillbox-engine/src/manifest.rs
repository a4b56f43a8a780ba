//! Skill manifest parsing.
//!
//! A manifest (`skill.md`) is UTF-8 markdown with an optional YAML front
//! matter block:
//!
//! ```markdown
//! ---
//! name: Code Review
//! description: Reviews code for security and quality
//! triggers: [review, audit]
//! version: 1.0.0
//! author: platform-team
//! ---
//!
//! # Code Review
//! Full instructions follow...
//! ```
//!
//! Missing or malformed front matter degrades to default metadata; the
//! body is still served in full. Unrecognized keys are ignored.

use serde::{Deserialize, Serialize};
use skillbox_core::{SkillError, SkillResult};
use std::path::{Path, PathBuf};
use tracing::warn;

/// File name of the manifest inside every skill bundle.
pub const MANIFEST_FILE: &str = "skill.md";

const FRONT_MATTER_DELIMITER: &str = "---";
const DEFAULT_DESCRIPTION: &str = "No description provided.";
const DEFAULT_VERSION: &str = "1.0.0";
const DEFAULT_AUTHOR: &str = "unknown";

/// Parsed metadata for a single skill bundle.
///
/// The slug is derived from the directory name exactly once at scan time
/// and never recomputed from manifest content, so the directory structure
/// stays the authoritative key.
#[derive(Debug, Clone, Serialize)]
pub struct SkillMetadata {
    /// Directory name, unique key, stable identifier.
    pub slug: String,
    /// Human-readable title.
    pub name: String,
    /// Free-text description.
    pub description: String,
    /// Ordered trigger phrases used for keyword search.
    pub triggers: Vec<String>,
    /// Free-text version string.
    pub version: String,
    /// Free-text author.
    pub author: String,
    /// The bundle directory; all resource access is scoped beneath it.
    #[serde(skip)]
    pub root_path: PathBuf,
}

impl SkillMetadata {
    /// One-line registry entry used by list and search output.
    pub fn summary_line(&self) -> String {
        let triggers = if self.triggers.is_empty() {
            String::new()
        } else {
            format!(" | triggers: {}", self.triggers.join(", "))
        };
        format!(
            "- **{}** (`{}`): {}{}",
            self.name, self.slug, self.description, triggers
        )
    }

    /// Path to the bundle's manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.root_path.join(MANIFEST_FILE)
    }

    /// Case-insensitive substring match over name, slug, description and
    /// trigger phrases.
    pub fn matches(&self, query: &str) -> bool {
        let q = query.to_lowercase();
        self.name.to_lowercase().contains(&q)
            || self.slug.to_lowercase().contains(&q)
            || self.description.to_lowercase().contains(&q)
            || self.triggers.iter().any(|t| t.to_lowercase().contains(&q))
    }
}

/// Recognized front matter keys. Everything else is ignored by serde.
#[derive(Debug, Clone, Default, Deserialize)]
struct FrontMatter {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    triggers: Vec<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    author: Option<String>,
}

/// Split raw manifest text into an optional front matter block and the
/// instructional body.
///
/// Content that does not start with the delimiter, or that never closes
/// it, is treated as all body.
pub fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let trimmed = raw.trim_start();
    let Some(after_open) = trimmed.strip_prefix(FRONT_MATTER_DELIMITER) else {
        return (None, raw);
    };
    match after_open.find(FRONT_MATTER_DELIMITER) {
        Some(close) => {
            let header = &after_open[..close];
            let body = after_open[close + FRONT_MATTER_DELIMITER.len()..].trim_start();
            (Some(header), body)
        }
        None => (None, raw),
    }
}

/// Parse manifest contents into metadata for the bundle at `root_path`.
pub fn parse_manifest(slug: &str, root_path: &Path, contents: &str) -> SkillMetadata {
    let (header, _body) = split_front_matter(contents);

    let front = match header {
        Some(yaml) if !yaml.trim().is_empty() => {
            match serde_yaml_ng::from_str::<FrontMatter>(yaml) {
                Ok(front) => front,
                Err(e) => {
                    warn!(skill = %slug, error = %e, "Malformed front matter, using default metadata");
                    FrontMatter::default()
                }
            }
        }
        _ => FrontMatter::default(),
    };

    SkillMetadata {
        slug: slug.to_string(),
        name: front.name.unwrap_or_else(|| title_case(slug)),
        description: front
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
        triggers: front.triggers,
        version: front.version.unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        author: front.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
        root_path: root_path.to_path_buf(),
    }
}

/// Read and parse the manifest of the bundle at `root_path`.
///
/// An unreadable manifest (I/O failure, invalid UTF-8) is a per-bundle
/// [`SkillError::Parse`]; the caller is expected to skip the bundle and
/// keep scanning.
pub fn load_metadata(slug: &str, root_path: &Path) -> SkillResult<SkillMetadata> {
    let manifest = root_path.join(MANIFEST_FILE);
    let contents = std::fs::read_to_string(&manifest).map_err(|e| {
        SkillError::Parse(format!("failed to read {}: {e}", manifest.display()))
    })?;
    Ok(parse_manifest(slug, root_path, &contents))
}

/// `"my-skill"` → `"My Skill"`.
pub fn title_case(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
