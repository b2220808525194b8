// `quire show`: print one stored version.

use clap::Args;
use quire_common::types::Version;
use quire_history::HistoryError;

use super::{Context, DocArgs};
use crate::output;

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub doc: DocArgs,

    /// Version id (see `quire ls`).
    pub id: String,
}

pub async fn run(ctx: &Context, args: ShowArgs) -> anyhow::Result<()> {
    if !ctx.config.enabled {
        // JSON consumers get `null`, matching `save`'s empty version.
        output::print_output(ctx.format, &None::<Version>, |_| {
            "History is disabled; nothing to show.".to_string()
        })?;
        return Ok(());
    }
    let version = ctx.history.get(ctx.doc(&args.doc), &args.id, &ctx.config).await.ok_or_else(|| {
        HistoryError::VersionNotFound {
            collection: args.doc.collection.clone(),
            doc_id: args.doc.doc.clone(),
            version_id: args.id.clone(),
        }
    })?;
    output::print_output(ctx.format, &version, format_human)?;
    Ok(())
}

fn format_human(version: &Version) -> String {
    let mut header = format!("version {}", version.entry.id);
    if let Some(label) = &version.entry.label {
        header.push_str(&format!(" [{label}]"));
    }
    format!(
        "{header}\ndate    {}\nsize    {} bytes\n\n{}",
        version.entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        version.entry.size,
        version.content
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use quire_common::types::VersionEntry;

    #[test]
    fn human_format_prints_metadata_then_content() {
        let version = Version {
            entry: VersionEntry {
                id: "v1".into(),
                timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap(),
                preview: "Body".into(),
                size: 24,
                label: Some("draft".into()),
            },
            content: "---\ntitle: Hi\n---\nBody".into(),
            frontmatter: Default::default(),
            body: "Body".into(),
        };
        let output = format_human(&version);
        assert!(output.starts_with("version v1 [draft]\ndate    2024-01-15 10:30:45 UTC"));
        assert!(output.ends_with("\n\n---\ntitle: Hi\n---\nBody"));
    }
}
