//! The public facade over the skill engine.
//!
//! Every operation is a short sequence: resolve metadata through the
//! registry, resolve any bundle-relative path, delegate to the resource
//! store or script runner, format a response. No state is held across
//! calls except the shared registry cache. Responses are plain text, safe
//! for any transport (MCP, REST, CLI).

use crate::manifest::{self, SkillMetadata, MANIFEST_FILE};
use crate::registry::SkillRegistry;
use crate::resolver;
use crate::resources::{ReadOutcome, ResourceStore, REFERENCES_DIR, SCRIPTS_DIR};
use crate::runner::ScriptRunner;
use skillbox_core::{EngineConfig, SkillError, SkillResult};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Facade composing the registry, resource store and script runner into
/// the public skill operations.
///
/// Constructed once at process start and shared by handle; there are no
/// hidden singletons.
pub struct SkillManager {
    registry: Arc<SkillRegistry>,
    store: ResourceStore,
    runner: ScriptRunner,
}

impl SkillManager {
    /// Build a manager from injected configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            registry: Arc::new(SkillRegistry::new(config.skills_dir.clone())),
            store: ResourceStore::new(config.max_preview_chars),
            runner: ScriptRunner::new(
                config.script_interpreter.clone(),
                config.script_timeout_secs,
            ),
        }
    }

    /// Shared handle to the underlying registry.
    pub fn registry(&self) -> Arc<SkillRegistry> {
        Arc::clone(&self.registry)
    }

    async fn require(&self, slug: &str) -> SkillResult<Arc<SkillMetadata>> {
        self.registry.get(slug).await?.ok_or_else(|| {
            SkillError::NotFound(format!(
                "skill '{slug}' not found; call list_skills to see available skills"
            ))
        })
    }

    // --- Discovery ---

    /// Formatted registry of all available skills, with the recommended
    /// usage protocol. An empty registry is a message, not an error.
    pub async fn list_skills(&self) -> SkillResult<String> {
        let skills = self.registry.all().await?;

        if skills.is_empty() {
            return Ok(format!(
                "No skills found.\nAdd skill directories to: {}",
                self.registry.skills_dir().display()
            ));
        }

        let mut lines = vec![
            format!("# Skills Registry ({} available)\n", skills.len()),
            "PROTOCOL - always follow this order:".to_string(),
            "  1. list_skills       -> you are here".to_string(),
            "  2. load_skill        -> load full instructions".to_string(),
            "  3. list_resources    -> see available references + scripts".to_string(),
            "  4. read_resource     -> load a reference doc".to_string(),
            "  5. run_script        -> execute a utility script".to_string(),
            String::new(),
        ];
        lines.extend(skills.values().map(|meta| meta.summary_line()));
        lines.push(String::new());
        lines.push("Call load_skill(<slug>) to load full instructions.".to_string());
        Ok(lines.join("\n"))
    }

    /// Case-insensitive keyword search over name, slug, description and
    /// trigger phrases.
    pub async fn search_skills(&self, query: &str) -> SkillResult<String> {
        let skills = self.registry.all().await?;
        let matches: Vec<_> = skills
            .values()
            .filter(|meta| meta.matches(query))
            .collect();

        if matches.is_empty() {
            return Ok(format!(
                "No skills matched '{query}'.\nCall list_skills to see all available skills."
            ));
        }

        let mut lines = vec![format!(
            "# Search results for '{query}' ({} matches)\n",
            matches.len()
        )];
        lines.extend(matches.iter().map(|meta| meta.summary_line()));
        Ok(lines.join("\n"))
    }

    /// Ordered skill slugs, for programmatic consumers.
    pub async fn get_skill_names(&self) -> SkillResult<Vec<String>> {
        Ok(self.registry.all().await?.keys().cloned().collect())
    }

    /// Pretty JSON index of every skill's metadata.
    pub async fn registry_index(&self) -> SkillResult<String> {
        let skills = self.registry.all().await?;
        let index: BTreeMap<&str, &SkillMetadata> = skills
            .iter()
            .map(|(slug, meta)| (slug.as_str(), meta.as_ref()))
            .collect();
        Ok(serde_json::to_string_pretty(&index)?)
    }

    // --- Loading ---

    /// Full instructions for one skill, re-read from disk on demand.
    pub async fn load_skill(&self, slug: &str) -> SkillResult<String> {
        let meta = self.require(slug).await?;
        let contents = tokio::fs::read_to_string(meta.manifest_path()).await?;
        let (_, body) = manifest::split_front_matter(&contents);
        info!(skill = %slug, chars = body.len(), "Loaded skill");
        Ok(format!(
            "# SKILL LOADED: {} (v{})\n\n{body}",
            meta.name, meta.version
        ))
    }

    // --- Resources ---

    /// Formatted listing of a skill's references and scripts.
    pub async fn list_resources(&self, slug: &str) -> SkillResult<String> {
        let meta = self.require(slug).await?;
        let listing = self.store.list(&meta).await?;

        let mut lines = vec![format!("# Resources: {}\n", meta.name)];
        lines.push(format!("References ({}):", listing.references.len()));
        if listing.references.is_empty() {
            lines.push("  (none)".to_string());
        } else {
            lines.extend(
                listing
                    .references
                    .iter()
                    .map(|name| format!("  - {REFERENCES_DIR}/{name}")),
            );
        }
        lines.push(format!("\nScripts ({}):", listing.scripts.len()));
        if listing.scripts.is_empty() {
            lines.push("  (none)".to_string());
        } else {
            lines.extend(
                listing
                    .scripts
                    .iter()
                    .map(|name| format!("  - {SCRIPTS_DIR}/{name}")),
            );
        }
        lines.push(String::new());
        lines.push("Use read_resource(<slug>, '<path>') to load a file.".to_string());
        lines.push("Use run_script(<slug>, '<script>') to execute a script.".to_string());
        Ok(lines.join("\n"))
    }

    /// Read a file from a skill's directory, truncating past `max_chars`.
    pub async fn read_resource(
        &self,
        slug: &str,
        resource_path: &str,
        max_chars: Option<usize>,
    ) -> SkillResult<String> {
        let meta = self.require(slug).await?;
        match self.store.read(&meta, resource_path, max_chars).await? {
            ReadOutcome::Full(content) => {
                Ok(format!("# RESOURCE: {slug}/{resource_path}\n\n{content}"))
            }
            ReadOutcome::Truncated {
                content,
                total_chars,
            } => Ok(format!(
                "# RESOURCE: {slug}/{resource_path} (truncated, showing {}/{total_chars} chars)\n\n\
                 {content}\n\n\
                 [File truncated. Request a specific file or section if you need more.]",
                content.chars().count()
            )),
        }
    }

    /// Write or overwrite a file inside an existing skill's directory.
    pub async fn write_resource(
        &self,
        slug: &str,
        resource_path: &str,
        content: &str,
    ) -> SkillResult<String> {
        let meta = self.require(slug).await?;
        self.store.write(&meta, resource_path, content).await?;
        Ok(format!("Written: {slug}/{resource_path}"))
    }

    // --- Script execution ---

    /// Execute a script from a skill's `scripts/` directory and report its
    /// stdout, stderr and exit code.
    pub async fn run_script(
        &self,
        slug: &str,
        script_name: &str,
        args: &str,
        timeout_secs: Option<u64>,
    ) -> SkillResult<String> {
        let meta = self.require(slug).await?;
        let script = resolver::resolve(&meta.root_path, &format!("{SCRIPTS_DIR}/{script_name}"))?;
        if !script.is_file() {
            return Err(SkillError::NotFound(format!(
                "script '{script_name}' not found in {slug}/{SCRIPTS_DIR}/; call list_resources to see available scripts"
            )));
        }

        let output = self.runner.run(&script, args, None, timeout_secs).await?;
        Ok(format!(
            "# SCRIPT: {slug}/{SCRIPTS_DIR}/{script_name}\n\n\
             STDOUT:\n{}\n\n\
             STDERR:\n{}\n\n\
             EXIT CODE: {}",
            or_empty(&output.stdout),
            or_empty(&output.stderr),
            output.exit_code
        ))
    }

    // --- Skill creation ---

    /// Create a new skill bundle: manifest plus empty `references/` and
    /// `scripts/` directories. A default front matter block is injected
    /// when the supplied content lacks one. The registry is invalidated so
    /// the new skill is visible on the very next access.
    pub async fn create_skill(&self, slug: &str, content: &str) -> SkillResult<String> {
        validate_slug(slug)?;

        let skills_dir = self.registry.skills_dir();
        tokio::fs::create_dir_all(skills_dir).await?;

        let skill_dir = skills_dir.join(slug);
        if skill_dir.exists() {
            return Err(SkillError::AlreadyExists(slug.to_string()));
        }

        let content = if content.trim_start().starts_with("---") {
            content.to_string()
        } else {
            let display_name = manifest::title_case(slug);
            format!(
                "---\n\
                 name: {display_name}\n\
                 description: Auto-created skill for {display_name}\n\
                 version: 1.0.0\n\
                 author: unknown\n\
                 triggers: []\n\
                 ---\n\n\
                 {content}"
            )
        };

        tokio::fs::create_dir(&skill_dir).await?;
        tokio::fs::write(skill_dir.join(MANIFEST_FILE), content).await?;
        tokio::fs::create_dir(skill_dir.join(REFERENCES_DIR)).await?;
        tokio::fs::create_dir(skill_dir.join(SCRIPTS_DIR)).await?;

        self.registry.invalidate().await;
        info!(skill = %slug, "Created skill");
        Ok(format!("Skill '{slug}' created."))
    }
}

fn validate_slug(slug: &str) -> SkillResult<()> {
    if slug.is_empty()
        || !slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(SkillError::InvalidSlug(format!(
            "'{slug}': use ASCII letters, digits, '-' or '_'"
        )));
    }
    if slug.starts_with('_') {
        return Err(SkillError::InvalidSlug(format!(
            "'{slug}': names starting with '_' are reserved"
        )));
    }
    Ok(())
}

fn or_empty(text: &str) -> &str {
    if text.is_empty() {
        "(empty)"
    } else {
        text
    }
}
