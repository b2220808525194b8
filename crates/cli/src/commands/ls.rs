// `quire ls`: list a document's versions, newest first.

use clap::Args;
use quire_common::types::VersionEntry;
use serde::Serialize;

use super::{Context, DocArgs};
use crate::output;

#[derive(Debug, Args)]
pub struct LsArgs {
    #[command(flatten)]
    pub doc: DocArgs,
}

#[derive(Debug, Serialize)]
pub struct LsResult {
    pub versions: Vec<VersionEntry>,
}

pub async fn run(ctx: &Context, args: LsArgs) -> anyhow::Result<()> {
    let versions = ctx.history.list(ctx.doc(&args.doc), &ctx.config).await;
    output::print_output(ctx.format, &LsResult { versions }, format_human)?;
    Ok(())
}

fn format_human(result: &LsResult) -> String {
    if result.versions.is_empty() {
        return "No versions.".into();
    }

    let mut lines = vec![format!("{} version(s)", result.versions.len())];
    lines.extend(result.versions.iter().map(entry_line));
    lines.join("\n")
}

/// One-line summary shared with other commands.
pub(crate) fn entry_line(entry: &VersionEntry) -> String {
    let when = entry.timestamp.format("%Y-%m-%d %H:%M:%S");
    let label = entry.label.as_deref().map(|label| format!(" [{label}]")).unwrap_or_default();
    let preview: String = entry.preview.lines().next().unwrap_or_default().chars().take(60).collect();
    format!("  {}  {when}{label}  {preview}", entry.id)
}
