//! Skill discovery and metadata caching.
//!
//! The registry scans the skills root once, then serves a cached snapshot
//! until the root directory's mtime changes. The mtime gate notices
//! bundles being added or removed; it intentionally does not notice edits
//! to files inside an unchanged bundle (those do not touch the root's own
//! mtime). Instruction bodies and resources are re-read from disk on every
//! access, so only search metadata can go stale; [`SkillRegistry::invalidate`]
//! is the explicit escape hatch.

use crate::manifest::{self, SkillMetadata, MANIFEST_FILE};
use skillbox_core::SkillResult;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Immutable view of one registry scan, keyed by slug.
///
/// `BTreeMap` keeps iteration lexicographic, which makes duplicate-slug
/// resolution and listing order deterministic.
pub type Snapshot = Arc<BTreeMap<String, Arc<SkillMetadata>>>;

struct CacheState {
    snapshot: Snapshot,
    dir_mtime: Option<SystemTime>,
    loaded: bool,
}

/// Scans the skills root and caches parsed [`SkillMetadata`].
///
/// The snapshot is the only shared mutable state and is replaced
/// wholesale, never mutated in place: readers arriving during a refresh
/// see either the old or the new snapshot in full. The refresh gate
/// ensures at most one scan runs at a time.
pub struct SkillRegistry {
    skills_dir: PathBuf,
    state: RwLock<CacheState>,
    refresh_gate: Mutex<()>,
    scans: AtomicU64,
}

impl SkillRegistry {
    /// Create a registry over `skills_dir`. No scan happens until the
    /// first access.
    pub fn new(skills_dir: impl Into<PathBuf>) -> Self {
        Self {
            skills_dir: skills_dir.into(),
            state: RwLock::new(CacheState {
                snapshot: Arc::new(BTreeMap::new()),
                dir_mtime: None,
                loaded: false,
            }),
            refresh_gate: Mutex::new(()),
            scans: AtomicU64::new(0),
        }
    }

    /// The skills root this registry watches.
    pub fn skills_dir(&self) -> &Path {
        &self.skills_dir
    }

    /// Current snapshot, rescanning first iff the root changed or no scan
    /// has happened yet. O(1) while the root is unchanged.
    pub async fn all(&self) -> SkillResult<Snapshot> {
        if self.is_stale().await {
            self.refresh().await?;
        }
        Ok(self.state.read().await.snapshot.clone())
    }

    /// Metadata for one slug, or `None` if unknown.
    pub async fn get(&self, slug: &str) -> SkillResult<Option<Arc<SkillMetadata>>> {
        Ok(self.all().await?.get(slug).cloned())
    }

    /// Force the next access to rescan regardless of the root mtime. Used
    /// after a write that creates a new bundle.
    pub async fn invalidate(&self) {
        self.state.write().await.loaded = false;
    }

    /// Number of directory scans performed since construction.
    pub fn scan_count(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    async fn is_stale(&self) -> bool {
        let state = self.state.read().await;
        if !state.loaded {
            return true;
        }
        match std::fs::metadata(&self.skills_dir).and_then(|m| m.modified()) {
            Ok(mtime) => state.dir_mtime != Some(mtime),
            // Root vanished after a successful scan: keep serving the
            // cached snapshot rather than flapping on every call.
            Err(_) => false,
        }
    }

    async fn refresh(&self) -> SkillResult<()> {
        let _gate = self.refresh_gate.lock().await;

        // Re-check after winning the gate: a concurrent caller may have
        // finished the scan while this one waited.
        if !self.is_stale().await {
            return Ok(());
        }

        // Sample the mtime before listing, so a change racing the scan is
        // picked up by the next access instead of being lost.
        let dir_mtime = std::fs::metadata(&self.skills_dir)
            .and_then(|m| m.modified())
            .ok();

        let snapshot = Arc::new(self.scan());
        self.scans.fetch_add(1, Ordering::Relaxed);

        let mut state = self.state.write().await;
        state.snapshot = snapshot;
        state.dir_mtime = dir_mtime;
        state.loaded = true;
        info!(
            skills = state.snapshot.len(),
            dir = %self.skills_dir.display(),
            "Skill registry refreshed"
        );
        Ok(())
    }

    fn scan(&self) -> BTreeMap<String, Arc<SkillMetadata>> {
        let mut skills = BTreeMap::new();

        let entries = match std::fs::read_dir(&self.skills_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    dir = %self.skills_dir.display(),
                    error = %e,
                    "Skills directory not readable, registry is empty"
                );
                return skills;
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        for dir in dirs {
            let Some(slug) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if slug.starts_with('_') {
                debug!(skill = %slug, "Skipping reserved directory");
                continue;
            }
            if !dir.join(MANIFEST_FILE).is_file() {
                warn!(skill = %slug, "Skipping bundle: no skill.md found");
                continue;
            }
            match manifest::load_metadata(slug, &dir) {
                Ok(meta) => {
                    debug!(skill = %slug, "Registered skill");
                    // Later directories in sort order win on duplicate slugs.
                    skills.insert(meta.slug.clone(), Arc::new(meta));
                }
                Err(e) => {
                    warn!(skill = %slug, error = %e, "Failed to parse skill, skipping");
                }
            }
        }

        skills
    }
}
