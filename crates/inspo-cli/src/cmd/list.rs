use crate::cmd::board::Board;
use crate::cmd::show::{local_time, status_mark};
use crate::output::{OutputMode, pretty_rule, render_mode};
use clap::Args;
use inspo_core::model::ProjectItem;
use inspo_core::model::comment;
use inspo_core::view::{ItemQuery, SortKey};
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Case-insensitive text to look for in titles and descriptions.
    #[arg(long, short)]
    pub search: Option<String>,

    /// Sort order: newest, oldest, title-asc, title-desc.
    #[arg(long, default_value_t = SortKey::Newest)]
    pub sort: SortKey,
}

pub fn run_list(args: &ListArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let board = Board::open(project_root, output)?;
    let items = board.store.items();
    let query = ItemQuery {
        search: args.search.clone(),
        sort: args.sort,
    };
    let rows = query.apply(&items);
    render_mode(output, &rows, |rows, w| write_text(rows, w), |rows, w| {
        write_pretty(rows, items.len(), w)
    })
}

fn write_text(rows: &[&ProjectItem], w: &mut dyn Write) -> io::Result<()> {
    for item in rows {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            item.id,
            if item.is_done { "done" } else { "open" },
            item.title,
            item.attachments.len(),
            comment::count(&item.comments)
        )?;
    }
    Ok(())
}

fn write_pretty(rows: &[&ProjectItem], total: usize, w: &mut dyn Write) -> io::Result<()> {
    if rows.is_empty() {
        if total == 0 {
            writeln!(w, "No projects yet. Add one with `insp add --title ... --attach FILE`.")?;
        } else {
            writeln!(w, "No projects match.")?;
        }
        return Ok(());
    }
    writeln!(w, "{} of {} project(s)", rows.len(), total)?;
    pretty_rule(w)?;
    for item in rows {
        writeln!(w, "{} {}", status_mark(item), item.title)?;
        writeln!(
            w,
            "    {}  {}  {} attachment(s), {} comment(s)",
            item.id,
            local_time(item.created_at),
            item.attachments.len(),
            comment::count(&item.comments)
        )?;
    }
    Ok(())
}
