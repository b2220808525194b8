// `quire prune`: apply retention without saving.

use clap::Args;
use quire_history::PruneReport;

use super::{Context, DocArgs};
use crate::output;

#[derive(Debug, Args)]
pub struct PruneArgs {
    #[command(flatten)]
    pub doc: DocArgs,
}

pub async fn run(ctx: &Context, args: PruneArgs) -> anyhow::Result<()> {
    let report = ctx.history.prune(ctx.doc(&args.doc), &ctx.config).await?;
    output::print_output(ctx.format, &report, format_human)?;
    Ok(())
}

fn format_human(report: &PruneReport) -> String {
    if report.removed.is_empty() {
        return format!("Nothing to prune ({} version(s) kept).", report.remaining);
    }
    let mut lines =
        vec![format!("Pruned {} version(s), {} kept", report.removed.len(), report.remaining)];
    lines.extend(report.removed.iter().map(|id| format!("  {id}")));
    lines.join("\n")
}
