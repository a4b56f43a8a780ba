//! `skillbox` — command-line consumer of the skill engine.
//!
//! One subcommand per facade operation; no logic of its own. Logs go to
//! stderr so command output stays pipeable.

use clap::{Parser, Subcommand};
use skillbox_core::EngineConfig;
use skillbox_engine::SkillManager;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "skillbox", about = "Skillbox - skill registry and sandboxed script runner")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "skillbox.toml")]
    config: PathBuf,

    /// Skills root directory (overrides config)
    #[arg(long)]
    skills_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available skills
    List,
    /// Search skills by keyword
    Search {
        /// Keyword matched against name, slug, description and triggers
        query: String,
    },
    /// Print skill slugs, one per line
    Names,
    /// Print the JSON registry index
    Index,
    /// Print a skill's full instructions
    Load {
        /// Skill slug
        slug: String,
    },
    /// List a skill's references and scripts
    Resources {
        /// Skill slug
        slug: String,
    },
    /// Read a file from a skill directory
    Read {
        /// Skill slug
        slug: String,
        /// Bundle-relative path, e.g. references/guide.md
        path: String,
        /// Truncate past this many characters
        #[arg(long)]
        max_chars: Option<usize>,
    },
    /// Write a file into a skill directory
    Write {
        /// Skill slug
        slug: String,
        /// Bundle-relative path, e.g. references/notes.md
        path: String,
        /// File to copy the content from; stdin when omitted
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Run a script from a skill's scripts directory
    Run {
        /// Skill slug
        slug: String,
        /// Script file name, e.g. validate.py
        script: String,
        /// Whitespace-separated script arguments
        #[arg(default_value = "")]
        args: String,
        /// Timeout in seconds (clamped to the safe range)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Create a new skill scaffold
    Create {
        /// Slug for the new skill (kebab-case)
        slug: String,
        /// File to read the manifest content from; stdin when omitted
        #[arg(long)]
        from: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config(&cli.config).await?;
    if let Some(dir) = cli.skills_dir {
        config.skills_dir = dir;
    }
    debug!(skills_dir = %config.skills_dir.display(), "Engine configured");

    let manager = SkillManager::new(&config);

    let output = match cli.command {
        Commands::List => manager.list_skills().await?,
        Commands::Search { query } => manager.search_skills(&query).await?,
        Commands::Names => manager.get_skill_names().await?.join("\n"),
        Commands::Index => manager.registry_index().await?,
        Commands::Load { slug } => manager.load_skill(&slug).await?,
        Commands::Resources { slug } => manager.list_resources(&slug).await?,
        Commands::Read {
            slug,
            path,
            max_chars,
        } => manager.read_resource(&slug, &path, max_chars).await?,
        Commands::Write { slug, path, from } => {
            let content = read_input(from.as_deref()).await?;
            manager.write_resource(&slug, &path, &content).await?
        }
        Commands::Run {
            slug,
            script,
            args,
            timeout,
        } => manager.run_script(&slug, &script, &args, timeout).await?,
        Commands::Create { slug, from } => {
            let content = read_input(from.as_deref()).await?;
            manager.create_skill(&slug, &content).await?
        }
    };

    println!("{output}");
    Ok(())
}

async fn load_config(path: &Path) -> anyhow::Result<EngineConfig> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EngineConfig::default()),
        Err(e) => Err(anyhow::anyhow!("failed to read {}: {e}", path.display())),
    }
}

async fn read_input(from: Option<&Path>) -> anyhow::Result<String> {
    use tokio::io::AsyncReadExt;
    match from {
        Some(path) => Ok(tokio::fs::read_to_string(path).await?),
        None => {
            let mut buffer = String::new();
            tokio::io::stdin().read_to_string(&mut buffer).await?;
            Ok(buffer)
        }
    }
}
