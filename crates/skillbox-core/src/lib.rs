//! Core types shared across the Skillbox crates.
//!
//! This crate provides the foundational pieces the engine and its consumers
//! build on:
//!
//! - [`SkillError`] — Unified error enum for all engine subsystems.
//! - [`SkillResult`] — Convenience alias for `Result<T, SkillError>`.
//! - [`EngineConfig`] — Runtime configuration injected into the engine.

use serde::Deserialize;
use std::path::PathBuf;

// --- Error types ---

/// Top-level error type for the Skillbox engine.
///
/// Path and resource errors are returned as typed values so callers (an
/// autonomous agent, a CLI user) can recover and retry with corrected
/// input. The `Display` messages are written to be actionable on their own.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    /// An unknown skill slug, or a resource that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A relative path that escapes its skill directory. Retrying with the
    /// same path will never succeed.
    #[error("access denied: {0}")]
    TraversalDenied(String),

    /// A skill manifest that could not be read or decoded.
    #[error("manifest error: {0}")]
    Parse(String),

    /// A script that exceeded its timeout and was killed.
    #[error("script timed out after {0}s")]
    TimedOut(u64),

    /// A child process that could not be spawned.
    #[error("failed to launch script: {0}")]
    Launch(String),

    /// An attempt to create a skill whose slug is already taken.
    #[error("skill '{0}' already exists")]
    AlreadyExists(String),

    /// A slug that failed validation before any directory was created.
    #[error("invalid slug: {0}")]
    InvalidSlug(String),

    /// An error in configuration parsing or validation.
    #[error("config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`SkillError`].
pub type SkillResult<T> = Result<T, SkillError>;

// --- Configuration ---

/// Runtime configuration for the skill engine.
///
/// Produced by the hosting process (config file, environment, flags) and
/// passed in by value; the engine never reads the environment itself.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Root directory containing skill bundles, one subdirectory per skill.
    #[serde(default = "default_skills_dir")]
    pub skills_dir: PathBuf,

    /// Default per-script timeout in seconds. Requests are clamped into the
    /// runner's safe range, so extreme values here are tolerated.
    #[serde(default = "default_script_timeout")]
    pub script_timeout_secs: u64,

    /// Character limit applied to resource reads that do not specify one.
    #[serde(default = "default_max_preview_chars")]
    pub max_preview_chars: usize,

    /// Interpreter used to run bundle scripts (e.g. `python3`).
    #[serde(default = "default_interpreter")]
    pub script_interpreter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            skills_dir: default_skills_dir(),
            script_timeout_secs: default_script_timeout(),
            max_preview_chars: default_max_preview_chars(),
            script_interpreter: default_interpreter(),
        }
    }
}

fn default_skills_dir() -> PathBuf {
    PathBuf::from("./skills")
}
fn default_script_timeout() -> u64 {
    60
}
fn default_max_preview_chars() -> usize {
    8000
}
fn default_interpreter() -> String {
    "python3".to_string()
}
