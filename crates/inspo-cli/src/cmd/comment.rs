//! `insp comment`: post, reply to, edit and remove threaded comments.
//!
//! Every action is a pure transform of the item's comment forest followed by
//! one write of the whole forest. A comment id that no longer exists (another
//! client removed it) leaves the thread alone and reports `applied: false`.

use crate::cmd::board::{Board, invalid, store_failure};
use crate::output::{OutputMode, render};
use chrono::Utc;
use clap::{Args, Subcommand};
use inspo_core::config::PreferenceStore;
use inspo_core::model::comment::{self, append_root, edit_comment_text, insert_reply, remove_comment};
use inspo_core::model::item::{validate_comment_text, validate_display_name};
use inspo_core::model::{Comment, ProjectItem};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Args, Debug)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub command: CommentCommand,
}

#[derive(Subcommand, Debug)]
pub enum CommentCommand {
    #[command(
        about = "Start a new thread on a project",
        after_help = "EXAMPLES:\n    # Post a comment\n    insp comment add -- -OH2kF \"Love this palette\""
    )]
    Add(CommentAddArgs),

    #[command(
        about = "Reply to a comment",
        after_help = "EXAMPLES:\n    # Reply to a comment (ids are shown by `insp show`)\n    insp comment reply -- -OH2kF c1760000000000-a1b2 \"Agreed\""
    )]
    Reply(CommentReplyArgs),

    #[command(
        about = "Change the text of a comment",
        after_help = "EXAMPLES:\n    insp comment edit -- -OH2kF c1760000000000-a1b2 \"Typo fixed\""
    )]
    Edit(CommentEditArgs),

    #[command(
        about = "Remove a comment and all of its replies",
        after_help = "EXAMPLES:\n    insp comment rm -- -OH2kF c1760000000000-a1b2"
    )]
    Rm(CommentRmArgs),
}

#[derive(Args, Debug)]
pub struct CommentAddArgs {
    /// Item id (a unique prefix is enough).
    #[arg(allow_hyphen_values = true)]
    pub item: String,

    /// Comment text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct CommentReplyArgs {
    /// Item id (a unique prefix is enough).
    #[arg(allow_hyphen_values = true)]
    pub item: String,

    /// Id of the comment being answered.
    pub comment_id: String,

    /// Reply text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct CommentEditArgs {
    /// Item id (a unique prefix is enough).
    #[arg(allow_hyphen_values = true)]
    pub item: String,

    /// Id of the comment to change.
    pub comment_id: String,

    /// Replacement text.
    pub text: String,
}

#[derive(Args, Debug)]
pub struct CommentRmArgs {
    /// Item id (a unique prefix is enough).
    #[arg(allow_hyphen_values = true)]
    pub item: String,

    /// Id of the comment to remove, replies included.
    pub comment_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
enum Action {
    Add,
    Reply,
    Edit,
    Remove,
}

#[derive(Debug, Serialize)]
struct CommentOutput {
    item_id: String,
    action: Action,
    /// The new comment for add/reply, the target for edit/remove.
    comment_id: String,
    applied: bool,
    /// Comments removed, replies included. Zero for other actions.
    removed: usize,
    total_comments: usize,
}

pub fn run_comment(
    args: &CommentArgs,
    prefs: &PreferenceStore,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    match &args.command {
        CommentCommand::Add(add) => run_add(add, prefs, output, project_root),
        CommentCommand::Reply(reply) => run_reply(reply, prefs, output, project_root),
        CommentCommand::Edit(edit) => run_edit(edit, output, project_root),
        CommentCommand::Rm(rm) => run_rm(rm, output, project_root),
    }
}

fn new_comment(prefs: &PreferenceStore, text: &str, output: OutputMode) -> anyhow::Result<Comment> {
    let author = validate_display_name(prefs.display_name()).map_err(|e| invalid(output, e))?;
    validate_comment_text(text).map_err(|e| invalid(output, e))?;
    Ok(Comment::new(author, text, Utc::now()))
}

fn save(
    board: &Board,
    item: &ProjectItem,
    output: OutputMode,
    transform: impl FnOnce(Vec<Comment>) -> Vec<Comment>,
) -> anyhow::Result<Vec<Comment>> {
    board
        .store
        .edit_comments(item, transform)
        .map_err(|e| store_failure(output, &e))
}

fn run_add(
    args: &CommentAddArgs,
    prefs: &PreferenceStore,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let posted = new_comment(prefs, &args.text, output)?;
    let board = Board::open(project_root, output)?;
    let item = board.resolve(&args.item, output)?;

    let comment_id = posted.id.clone();
    let forest = save(&board, &item, output, |f| append_root(f, posted))?;
    report(
        output,
        CommentOutput {
            item_id: item.id,
            action: Action::Add,
            comment_id,
            applied: true,
            removed: 0,
            total_comments: comment::count(&forest),
        },
    )
}

fn run_reply(
    args: &CommentReplyArgs,
    prefs: &PreferenceStore,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let reply = new_comment(prefs, &args.text, output)?;
    let board = Board::open(project_root, output)?;
    let item = board.resolve(&args.item, output)?;

    let applied = comment::contains(&item.comments, &args.comment_id);
    let comment_id = reply.id.clone();
    let total_comments = if applied {
        comment::count(&save(&board, &item, output, |f| {
            insert_reply(f, &args.comment_id, reply)
        })?)
    } else {
        comment::count(&item.comments)
    };
    report(
        output,
        CommentOutput {
            item_id: item.id,
            action: Action::Reply,
            comment_id,
            applied,
            removed: 0,
            total_comments,
        },
    )
}

fn run_edit(args: &CommentEditArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    validate_comment_text(&args.text).map_err(|e| invalid(output, e))?;
    let board = Board::open(project_root, output)?;
    let item = board.resolve(&args.item, output)?;

    let applied = comment::contains(&item.comments, &args.comment_id);
    if applied {
        save(&board, &item, output, |f| {
            edit_comment_text(f, &args.comment_id, args.text.as_str())
        })?;
    }
    report(
        output,
        CommentOutput {
            total_comments: comment::count(&item.comments),
            item_id: item.id,
            action: Action::Edit,
            comment_id: args.comment_id.clone(),
            applied,
            removed: 0,
        },
    )
}

fn run_rm(args: &CommentRmArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let board = Board::open(project_root, output)?;
    let item = board.resolve(&args.item, output)?;

    let removed = comment::find(&item.comments, &args.comment_id)
        .map_or(0, |target| target.descendant_count() + 1);
    let total_comments = if removed > 0 {
        comment::count(&save(&board, &item, output, |f| {
            remove_comment(f, &args.comment_id)
        })?)
    } else {
        comment::count(&item.comments)
    };
    report(
        output,
        CommentOutput {
            item_id: item.id,
            action: Action::Remove,
            comment_id: args.comment_id.clone(),
            applied: removed > 0,
            removed,
            total_comments,
        },
    )
}

fn report(output: OutputMode, result: CommentOutput) -> anyhow::Result<()> {
    render(output, &result, |r, w| {
        if !r.applied {
            return writeln!(w, "comment {} not found; nothing changed", r.comment_id);
        }
        match r.action {
            Action::Add => writeln!(w, "✓ commented ({})", r.comment_id),
            Action::Reply => writeln!(w, "✓ replied ({})", r.comment_id),
            Action::Edit => writeln!(w, "✓ edited {}", r.comment_id),
            Action::Remove => writeln!(w, "✓ removed {} comment(s)", r.removed),
        }
    })
}
