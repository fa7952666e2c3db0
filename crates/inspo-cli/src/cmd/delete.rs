//! `insp delete`: remove an item once its exact title is typed back.

use crate::cmd::board::{Board, store_failure};
use crate::output::{CliError, OutputMode, fail, render};
use clap::Args;
use serde::Serialize;
use std::io::{IsTerminal, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Item id (a unique prefix is enough).
    #[arg(allow_hyphen_values = true)]
    pub id: String,

    /// The item's title, typed exactly. Prompted for on a terminal when omitted.
    #[arg(long, value_name = "TITLE")]
    pub confirm: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteOutput {
    id: String,
    title: String,
    deleted: bool,
}

fn prompt_for_title(title: &str) -> anyhow::Result<String> {
    eprint!("Type the title \"{title}\" to delete this project: ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

pub fn run_delete(args: &DeleteArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let board = Board::open(project_root, output)?;
    let item = board.resolve(&args.id, output)?;

    let typed = match &args.confirm {
        Some(typed) => typed.clone(),
        None if std::io::stdin().is_terminal() => prompt_for_title(&item.title)?,
        None => {
            return Err(fail(
                output,
                &CliError::with_details(
                    "delete needs the item title as confirmation",
                    format!("Pass --confirm \"{}\"", item.title),
                    "confirmation_required",
                ),
            ));
        }
    };

    let deleted = board
        .store
        .delete_confirmed(&item, &typed)
        .map_err(|e| store_failure(output, &e))?;

    let result = DeleteOutput {
        id: item.id,
        title: item.title,
        deleted,
    };
    render(output, &result, |r, w| {
        if r.deleted {
            writeln!(w, "✓ deleted '{}'", r.title)
        } else {
            writeln!(
                w,
                "not deleted: confirmation must match '{}' exactly",
                r.title
            )
        }
    })
}
