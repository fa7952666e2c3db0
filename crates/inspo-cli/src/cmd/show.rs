use crate::cmd::board::Board;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use chrono::{DateTime, Local, Utc};
use clap::Args;
use inspo_core::model::attachment::sorted_for_display;
use inspo_core::model::comment;
use inspo_core::model::{Comment, ProjectItem};
use inspo_core::view;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Item id (a unique prefix is enough).
    #[arg(allow_hyphen_values = true)]
    pub id: String,

    /// Show every root comment instead of the first few.
    #[arg(long)]
    pub all_comments: bool,
}

/// Replies nested deeper than this are drawn at the same indentation.
const MAX_INDENT_DEPTH: usize = 3;

pub fn run_show(args: &ShowArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let board = Board::open(project_root, output)?;
    let item = board.resolve(&args.id, output)?;
    let limit = if args.all_comments {
        usize::MAX
    } else {
        board.config.comments.preview
    };
    render_mode(output, &item, write_text, |item, w| {
        write_pretty(item, limit, w)
    })
}

pub fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub const fn status_mark(item: &ProjectItem) -> &'static str {
    if item.is_done { "[x]" } else { "[ ]" }
}

fn write_text(item: &ProjectItem, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "id\t{}", item.id)?;
    writeln!(w, "title\t{}", item.title)?;
    writeln!(w, "done\t{}", item.is_done)?;
    writeln!(w, "created\t{}", item.created_at.to_rfc3339())?;
    writeln!(w, "description\t{}", item.description.replace('\n', " "))?;
    for attachment in sorted_for_display(&item.attachments) {
        writeln!(
            w,
            "attachment\t{}\t{}\t{}",
            attachment.kind,
            attachment.label(),
            attachment.url
        )?;
    }
    for (depth, c) in comment::walk(&item.comments) {
        writeln!(w, "comment\t{depth}\t{}\t{}\t{}", c.id, c.author, c.text)?;
    }
    Ok(())
}

fn write_pretty(item: &ProjectItem, limit: usize, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("{} {}", status_mark(item), item.title))?;
    pretty_kv(w, "id", &item.id)?;
    pretty_kv(w, "created", local_time(item.created_at))?;
    if !item.description.is_empty() {
        writeln!(w)?;
        for line in item.description.lines() {
            writeln!(w, "  {line}")?;
        }
    }

    writeln!(w)?;
    pretty_section(w, &format!("Attachments ({})", item.attachments.len()))?;
    for attachment in sorted_for_display(&item.attachments) {
        writeln!(
            w,
            "  {:<6} {}  {}",
            attachment.kind,
            attachment.label(),
            attachment.url
        )?;
    }

    writeln!(w)?;
    pretty_section(w, &format!("Comments ({})", comment::count(&item.comments)))?;
    write_thread(w, &item.comments, limit)
}

/// Draw a comment forest, collapsed to its first `limit` roots.
pub fn write_thread(w: &mut dyn Write, comments: &[Comment], limit: usize) -> io::Result<()> {
    let preview = view::preview(comments, limit);
    for (depth, c) in comment::walk(preview.shown) {
        let indent = "  ".repeat(depth.min(MAX_INDENT_DEPTH) + 1);
        writeln!(
            w,
            "{indent}{} · {}  [{}]",
            c.author,
            local_time(c.created_at),
            c.id
        )?;
        for line in c.text.lines() {
            writeln!(w, "{indent}  {line}")?;
        }
    }
    if preview.hidden > 0 {
        writeln!(
            w,
            "  … {} more thread(s); use --all-comments to see them",
            preview.hidden
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn comment(id: &str, children: Vec<Comment>) -> Comment {
        Comment {
            id: id.to_string(),
            author: "rani".to_string(),
            text: format!("note {id}"),
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap(),
            children,
        }
    }

    fn render(comments: &[Comment], limit: usize) -> String {
        let mut buf = Vec::new();
        write_thread(&mut buf, comments, limit).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn deep_replies_stop_indenting() {
        let chain = vec![comment(
            "c0",
            vec![comment(
                "c1",
                vec![comment("c2", vec![comment("c3", vec![comment("c4", vec![])])])],
            )],
        )];
        let out = render(&chain, 3);
        let indent_of = |id: &str| {
            out.lines()
                .find(|l| l.ends_with(&format!("[{id}]")))
                .map(|l| l.len() - l.trim_start().len())
                .unwrap()
        };
        assert_eq!(indent_of("c0"), 2);
        assert_eq!(indent_of("c3"), 8);
        assert_eq!(indent_of("c4"), 8);
    }

    #[test]
    fn collapsed_threads_report_hidden_roots() {
        let roots: Vec<Comment> = (0..5).map(|n| comment(&format!("c{n}"), vec![])).collect();
        let out = render(&roots, 3);
        assert!(out.contains("[c2]"));
        assert!(!out.contains("[c3]"));
        assert!(out.contains("2 more thread(s)"));
        assert!(!render(&roots, usize::MAX).contains("more thread"));
    }
}
