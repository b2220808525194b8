// `quire rm`: delete one version.

use clap::Args;
use serde::Serialize;

use super::{Context, DocArgs};
use crate::output;

#[derive(Debug, Args)]
pub struct RmArgs {
    #[command(flatten)]
    pub doc: DocArgs,

    /// Version id to delete.
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct RmResult {
    pub deleted: String,
}

pub async fn run(ctx: &Context, args: RmArgs) -> anyhow::Result<()> {
    ctx.history.delete(ctx.doc(&args.doc), &args.id, &ctx.config).await?;
    output::print_output(ctx.format, &RmResult { deleted: args.id }, |result| {
        format!("Deleted {}", result.deleted)
    })?;
    Ok(())
}
