// `quire save`: snapshot a document from a file or stdin.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use quire_common::types::VersionEntry;
use quire_history::SaveOptions;
use serde::Serialize;
use tokio::io::AsyncReadExt;

use super::{Context, DocArgs};
use crate::output;

#[derive(Debug, Args)]
pub struct SaveArgs {
    #[command(flatten)]
    pub doc: DocArgs,

    /// Read content from this file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Name the snapshot; labeled snapshots are never pruned.
    #[arg(long)]
    pub label: Option<String>,

    /// Skip the save when content matches the newest version.
    #[arg(long)]
    pub skip_if_identical: bool,
}

#[derive(Debug, Serialize)]
pub struct SaveResult {
    /// `None` when history is disabled.
    pub version: Option<VersionEntry>,
}

pub async fn run(ctx: &Context, args: SaveArgs) -> anyhow::Result<()> {
    let content = match &args.file {
        Some(path) => {
            let path = if path.is_absolute() { path.clone() } else { ctx.root.join(path) };
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read `{}`", path.display()))?
        }
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await.context("failed to read stdin")?;
            buf
        }
    };

    let options = SaveOptions { label: args.label, skip_if_identical: args.skip_if_identical };
    let version = ctx.history.save(ctx.doc(&args.doc), &content, &ctx.config, &options).await?;
    output::print_output(ctx.format, &SaveResult { version }, format_human)?;
    Ok(())
}

fn format_human(result: &SaveResult) -> String {
    match &result.version {
        Some(entry) => match &entry.label {
            Some(label) => format!("Saved {} \"{label}\" ({} bytes)", entry.id, entry.size),
            None => format!("Saved {} ({} bytes)", entry.id, entry.size),
        },
        None => "History is disabled; nothing saved.".into(),
    }
}
