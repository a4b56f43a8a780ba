//! Traversal-safe path resolution.
//!
//! Every file access inside a skill bundle funnels through [`resolve`],
//! which is the sole defense against `../../etc/passwd`-style input. It is
//! safe to call with attacker-controlled paths and has no side effects.

use skillbox_core::{SkillError, SkillResult};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Resolve `relative` against `root`, guaranteeing the result is `root`
/// itself or a descendant of it.
///
/// Separators are normalized and a leading separator is stripped, so
/// callers can only ever name paths relative to the bundle root. Symlinks
/// are followed through canonicalization as each existing prefix is
/// reached, which keeps the containment check honest even when a link
/// inside the bundle points outside it. The final component may not exist
/// yet, so write targets resolve too.
pub fn resolve(root: &Path, relative: &str) -> SkillResult<PathBuf> {
    let clean = relative.replace('\\', "/");
    let clean = clean.trim_start_matches('/');

    let root = root.canonicalize()?;
    let mut resolved = root.clone();

    for component in Path::new(clean).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Resolved below: popping past the root fails the final
                // containment check.
                resolved.pop();
            }
            Component::Normal(part) => {
                resolved.push(part);
                match resolved.symlink_metadata() {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        // A dangling link cannot be canonicalized; refuse it
                        // rather than resolving the rest of the path
                        // textually.
                        resolved = resolved
                            .canonicalize()
                            .map_err(|_| denied(relative, &root))?;
                    }
                    _ => {}
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(denied(relative, &root));
            }
        }
    }

    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(denied(relative, &root))
    }
}

fn denied(relative: &str, root: &Path) -> SkillError {
    warn!(path = %relative, root = %root.display(), "Path traversal blocked");
    SkillError::TraversalDenied(format!(
        "'{relative}' escapes the skill directory; do not retry with that path"
    ))
}
