use crate::cmd::board::{Board, UploadFailureRow, failure_rows, invalid, store_failure};
use crate::output::{OutputMode, render};
use clap::Args;
use inspo_core::model::{ItemDraft, ProjectItem, ValidationError};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Project title.
    #[arg(long)]
    pub title: String,

    /// Longer free-form description.
    #[arg(long, short, default_value = "")]
    pub description: String,

    /// File to upload as an attachment. Repeat for several files.
    #[arg(long = "attach", short = 'a', value_name = "FILE")]
    pub attach: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct SavedItemOutput<'a> {
    #[serde(flatten)]
    pub item: &'a ProjectItem,
    pub upload_failures: Vec<UploadFailureRow>,
}

pub fn run_add(args: &AddArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    if args.title.trim().is_empty() {
        return Err(invalid(output, ValidationError::MissingTitle));
    }
    if args.attach.is_empty() {
        return Err(invalid(output, ValidationError::MissingAttachments));
    }

    let board = Board::open(project_root, output)?;
    let report = board.upload(&args.attach, output)?;
    let upload_failures = failure_rows(&report);

    let draft = ItemDraft {
        title: args.title.clone(),
        description: args.description.clone(),
        attachments: report.attachments,
    };
    draft.validate().map_err(|e| invalid(output, e))?;

    let item = board
        .store
        .create(draft)
        .map_err(|e| store_failure(output, &e))?;

    let result = SavedItemOutput {
        item: &item,
        upload_failures,
    };
    render(output, &result, |r, w| {
        writeln!(w, "✓ added '{}' ({})", r.item.title, r.item.id)?;
        writeln!(w, "  {} attachment(s)", r.item.attachments.len())
    })
}
