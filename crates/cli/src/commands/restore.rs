// `quire restore`: overwrite the live document with a stored version.

use std::path::PathBuf;

use clap::Args;
use quire_history::{RestoreOptions, RestoreOutcome};

use super::ls::entry_line;
use super::{Context, DocArgs};
use crate::output;

#[derive(Debug, Args)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub doc: DocArgs,

    /// Version id to restore.
    pub id: String,

    /// Live document to overwrite (relative paths resolve against --root).
    #[arg(long)]
    pub live: PathBuf,

    /// Label for the safety snapshot taken before overwriting.
    #[arg(long)]
    pub label: Option<String>,

    /// Overwrite without snapshotting the live document first.
    #[arg(long)]
    pub skip_safety: bool,
}

pub async fn run(ctx: &Context, args: RestoreArgs) -> anyhow::Result<()> {
    let options = RestoreOptions { safety_label: args.label, skip_safety: args.skip_safety };
    let outcome = ctx
        .history
        .restore(ctx.doc(&args.doc), &args.id, &args.live, &ctx.config, &options)
        .await?;
    output::print_output(ctx.format, &outcome, |outcome| format_human(&args.id, outcome))?;
    Ok(())
}

fn format_human(id: &str, outcome: &RestoreOutcome) -> String {
    if outcome.content.is_none() {
        return "History is disabled; nothing restored.".into();
    }
    match &outcome.safety_snapshot {
        Some(entry) => format!("Restored {id}\nSafety snapshot:\n{}", entry_line(entry)),
        None => format!("Restored {id}"),
    }
}
