// `quire clear`: delete every version of a document.

use clap::Args;
use serde::Serialize;

use super::{Context, DocArgs};
use crate::output;

#[derive(Debug, Args)]
pub struct ClearArgs {
    #[command(flatten)]
    pub doc: DocArgs,
}

#[derive(Debug, Serialize)]
pub struct ClearResult {
    pub removed: usize,
}

pub async fn run(ctx: &Context, args: ClearArgs) -> anyhow::Result<()> {
    let removed = ctx.history.clear(ctx.doc(&args.doc), &ctx.config).await?;
    output::print_output(ctx.format, &ClearResult { removed }, format_human)?;
    Ok(())
}

fn format_human(result: &ClearResult) -> String {
    match result.removed {
        0 => "Nothing to clear.".into(),
        1 => "Removed 1 version.".into(),
        n => format!("Removed {n} versions."),
    }
}
