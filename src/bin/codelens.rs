//! Thin local CLI for ad-hoc invocation of the analysis core. This is NOT
//! the RPC transport layer; it exists so the crate
//! is runnable standalone for quick manual checks, the way a library
//! crate's `src/bin/` entry point usually does.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use codelens::core::config::CodelensConfig;
use codelens::linter::NoopLinter;
use codelens::orchestrator::Orchestrator;
use codelens::scanner::{Scanner, StaticScanner};

#[derive(Parser)]
#[command(name = "codelens", about = "Ad-hoc local code analysis", version)]
struct Cli {
    /// Root directory the persistence store and cache write under.
    #[arg(long, env = "CODELENS_STORE", default_value = ".codelens")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a single file and print its `FileAnalysis` as JSON.
    File {
        /// Path to the source file.
        path: PathBuf,
    },
    /// Analyze every supported file under a directory and print the
    /// resulting `CodebaseAnalysis` as JSON.
    Codebase {
        /// Identifier to persist/cache this run under.
        codebase_id: String,
        /// Root directory to walk.
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = CodelensConfig::new().with_persistence_root(cli.store.clone());

    match cli.command {
        Command::File { path } => {
            let scanner: Arc<dyn Scanner> = Arc::new(StaticScanner::new());
            let orchestrator = Orchestrator::new(config, scanner, Arc::new(NoopLinter))?;
            let analysis = orchestrator.analyze_file(&path.to_string_lossy(), true).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Command::Codebase { codebase_id, root } => {
            let mut files = Vec::new();
            collect_supported_files(&root, &root, &mut files)?;

            let scanner: Arc<dyn Scanner> =
                Arc::new(StaticScanner::new().register(codebase_id.clone(), root.to_string_lossy(), files));
            let orchestrator = Arc::new(Orchestrator::new(config, scanner, Arc::new(NoopLinter))?);
            let analysis = orchestrator.analyze_codebase(&codebase_id, false, true).await?;
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
    }

    Ok(())
}

/// Recursively collect source files under `root` whose extension maps to a
/// known language, as paths relative to `root`. Real workspace scanning
/// (`.gitignore`-aware, VCS-integrated) is an external collaborator's job
///; this is the minimal recursion needed to make the CLI usable
/// standalone.
fn collect_supported_files(root: &Path, current: &Path, out: &mut Vec<String>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_supported_files(root, &path, out)?;
            continue;
        }
        let path_str = path.to_string_lossy();
        let supported = codelens::lang::registry::language_key_for_path(&path_str).is_some() || path_str.ends_with(".ipynb");
        if supported {
            if let Ok(relative) = path.strip_prefix(root) {
                out.push(relative.to_string_lossy().into_owned());
            }
        }
    }
    Ok(())
}
