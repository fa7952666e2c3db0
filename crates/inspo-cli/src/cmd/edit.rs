use crate::cmd::board::{Board, UploadFailureRow, failure_rows, invalid, store_failure};
use crate::output::{OutputMode, render};
use clap::Args;
use inspo_core::model::{Attachment, ItemPatch, ValidationError};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Item id (a unique prefix is enough).
    #[arg(allow_hyphen_values = true)]
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(long, short)]
    pub description: Option<String>,

    /// Upload a file and append it to the attachments. Repeat for several files.
    #[arg(long = "attach", short = 'a', value_name = "FILE")]
    pub attach: Vec<PathBuf>,

    /// Drop the attachment with this id. Repeat for several.
    #[arg(long = "detach", value_name = "ATTACHMENT_ID")]
    pub detach: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EditOutput {
    id: String,
    changed: bool,
    patch: ItemPatch,
    upload_failures: Vec<UploadFailureRow>,
}

pub fn run_edit(args: &EditArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    if args.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(invalid(output, ValidationError::MissingTitle));
    }

    let board = Board::open(project_root, output)?;
    let item = board.resolve(&args.id, output)?;

    let mut patch = ItemPatch {
        title: args.title.clone().filter(|t| *t != item.title),
        description: args.description.clone().filter(|d| *d != item.description),
        ..ItemPatch::default()
    };

    let mut upload_failures = Vec::new();
    if !args.attach.is_empty() || !args.detach.is_empty() {
        let report = board.upload(&args.attach, output)?;
        upload_failures = failure_rows(&report);

        let mut attachments: Vec<Attachment> = item
            .attachments
            .iter()
            .filter(|a| !args.detach.contains(&a.id))
            .cloned()
            .collect();
        attachments.extend(report.attachments);
        if attachments.is_empty() {
            return Err(invalid(output, ValidationError::MissingAttachments));
        }
        if attachments != item.attachments {
            patch.attachments = Some(attachments);
        }
    }

    let changed = !patch.is_empty();
    board
        .store
        .update(&item.id, &patch)
        .map_err(|e| store_failure(output, &e))?;

    let result = EditOutput {
        id: item.id,
        changed,
        patch,
        upload_failures,
    };
    render(output, &result, |r, w| {
        if r.changed {
            writeln!(w, "✓ updated {}", r.id)
        } else {
            writeln!(w, "nothing to change for {}", r.id)
        }
    })
}
