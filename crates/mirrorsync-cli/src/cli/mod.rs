//! CLI for the mirrorsync file mirror.

mod commands;
mod observer;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mirrorsync_core::checksum::HashAlgorithm;
use mirrorsync_core::config::{self, MirrorConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use commands::{run_checksum, run_completions, run_plan, run_status, run_sync};

/// Top-level CLI for mirrorsync.
#[derive(Debug, Parser)]
#[command(name = "mirrorsync")]
#[command(
    about = "mirrorsync: keep a local mirror of a remote file set, verified against published checksums",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// List the remote directory, download what is missing and verify everything.
    Sync {
        /// Local mirror directory (default: current directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Remote directory URL, overriding `base_url` from config.toml.
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
        /// Task database (default: ~/.local/state/mirrorsync/tasks.db).
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,
        /// Skip hashing files the previous run verified that are still on disk.
        #[arg(long)]
        trust_verified: bool,
    },

    /// Show what a sync would download and verify, without touching anything.
    Plan {
        /// Local mirror directory (default: current directory).
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Remote directory URL, overriding `base_url` from config.toml.
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Show the task snapshot persisted by the last sync.
    Status {
        /// Task database (default: ~/.local/state/mirrorsync/tasks.db).
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Compute the hash of a local file (md5 or sha256).
    Checksum {
        /// Path to the file.
        path: PathBuf,
        #[arg(long, default_value = "md5", value_parser = parse_algorithm)]
        algorithm: HashAlgorithm,
    },

    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn parse_algorithm(s: &str) -> Result<HashAlgorithm, String> {
    HashAlgorithm::parse(s).ok_or_else(|| format!("unknown algorithm '{}' (md5, sha256)", s))
}

impl CliCommand {
    pub async fn run_from_args() -> Result<ExitCode> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Sync {
                dir,
                base_url,
                db,
                trust_verified,
            } => {
                let cfg = load_config(base_url)?;
                let dir = mirror_dir(dir)?;
                return run_sync(&cfg, &dir, db.as_deref(), trust_verified).await;
            }
            CliCommand::Plan { dir, base_url } => {
                let cfg = load_config(base_url)?;
                run_plan(&cfg, &mirror_dir(dir)?).await?;
            }
            CliCommand::Status { db, json } => run_status(db.as_deref(), json).await?,
            CliCommand::Checksum { path, algorithm } => run_checksum(&path, algorithm).await?,
            CliCommand::Completions { shell } => run_completions(shell),
        }

        Ok(ExitCode::SUCCESS)
    }
}

fn load_config(base_url: Option<String>) -> Result<MirrorConfig> {
    let mut cfg = config::load_or_init()?;
    if let Some(url) = base_url {
        cfg.base_url = url;
    }
    tracing::debug!("loaded config: {:?}", cfg);
    Ok(cfg)
}

fn mirror_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(d) => Ok(d),
        None => Ok(std::env::current_dir()?),
    }
}

/// Task store at `db`, or the default one.
pub(crate) async fn open_store(
    db: Option<&Path>,
) -> Result<mirrorsync_core::store::TaskStore> {
    use mirrorsync_core::store::TaskStore;
    match db {
        Some(path) => TaskStore::open_at(path).await,
        None => TaskStore::open_default().await,
    }
}

#[cfg(test)]
mod tests;
