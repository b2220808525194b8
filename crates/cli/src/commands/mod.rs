// CLI subcommand dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args, Subcommand};
use quire_history::history::DocumentRef;
use quire_history::{ConfigFile, HistoryConfig, LockManager, PartialHistoryConfig, VersionHistory};

use crate::output::OutputFormat;

pub mod clear;
pub mod ls;
pub mod prune;
pub mod restore;
pub mod rm;
pub mod save;
pub mod show;

/// Flags accepted by every subcommand.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Project root (defaults to the current directory).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    /// Force JSON output.
    #[arg(long, global = true)]
    pub json: bool,
    /// History directory, relative to the project root.
    #[arg(long, global = true)]
    pub storage_path: Option<PathBuf>,
    /// Unlabeled versions kept per document.
    #[arg(long, global = true)]
    pub max_versions: Option<usize>,
    /// Treat history as disabled.
    #[arg(long, global = true)]
    pub disabled: bool,
}

impl GlobalArgs {
    fn overrides(&self) -> PartialHistoryConfig {
        PartialHistoryConfig {
            enabled: self.disabled.then_some(false),
            max_versions: self.max_versions,
            storage_path: self.storage_path.clone(),
        }
    }
}

/// Collection and document a command operates on.
#[derive(Debug, Args)]
pub struct DocArgs {
    /// Collection id.
    pub collection: String,
    /// Document id within the collection.
    pub doc: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Snapshot a document's current content
    Save(save::SaveArgs),
    /// List versions, newest first
    Ls(ls::LsArgs),
    /// Print one version
    Show(show::ShowArgs),
    /// Delete one version
    Rm(rm::RmArgs),
    /// Delete every version of a document
    Clear(clear::ClearArgs),
    /// Apply retention now
    Prune(prune::PruneArgs),
    /// Overwrite the live document with a stored version
    Restore(restore::RestoreArgs),
}

/// Everything a command needs, resolved once from flags and config files.
pub struct Context {
    pub root: PathBuf,
    pub format: OutputFormat,
    pub config: HistoryConfig,
    pub history: VersionHistory,
}

impl Context {
    pub fn from_args(global: &GlobalArgs) -> anyhow::Result<Self> {
        let root = match &global.root {
            Some(root) => root.clone(),
            None => std::env::current_dir().context("failed to resolve current directory")?,
        };
        let file = ConfigFile::load(&root);
        let config = file.history_config(&global.overrides());
        let locks = Arc::new(LockManager::new(file.lock_options()));

        Ok(Self {
            format: OutputFormat::detect(global.json),
            history: VersionHistory::new(locks),
            root,
            config,
        })
    }

    pub fn doc<'a>(&'a self, args: &'a DocArgs) -> DocumentRef<'a> {
        DocumentRef::new(&self.root, &args.collection, &args.doc)
    }
}

pub async fn run(ctx: &Context, cmd: Command) -> anyhow::Result<()> {
    match cmd {
        Command::Save(args) => save::run(ctx, args).await,
        Command::Ls(args) => ls::run(ctx, args).await,
        Command::Show(args) => show::run(ctx, args).await,
        Command::Rm(args) => rm::run(ctx, args).await,
        Command::Clear(args) => clear::run(ctx, args).await,
        Command::Prune(args) => prune::run(ctx, args).await,
        Command::Restore(args) => restore::run(ctx, args).await,
    }
}
