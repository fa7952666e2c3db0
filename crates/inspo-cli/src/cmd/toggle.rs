use crate::cmd::board::{Board, store_failure};
use crate::output::{OutputMode, render};
use clap::Args;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ToggleArgs {
    /// Item id (a unique prefix is enough).
    #[arg(allow_hyphen_values = true)]
    pub id: String,
}

#[derive(Debug, Serialize)]
struct ToggleOutput {
    id: String,
    title: String,
    is_done: bool,
}

/// Flip an item between open and done.
pub fn run_toggle(args: &ToggleArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let board = Board::open(project_root, output)?;
    let item = board.resolve(&args.id, output)?;
    let is_done = !item.is_done;
    board
        .store
        .set_done(&item.id, is_done)
        .map_err(|e| store_failure(output, &e))?;

    let result = ToggleOutput {
        id: item.id,
        title: item.title,
        is_done,
    };
    render(output, &result, |r, w| {
        let state = if r.is_done { "done" } else { "open" };
        writeln!(w, "✓ '{}' is now {state}", r.title)
    })
}
