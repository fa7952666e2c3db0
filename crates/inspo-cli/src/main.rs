#![forbid(unsafe_code)]

mod cmd;
mod output;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use inspo_core::config::{self, PreferenceStore};
use output::OutputMode;
use std::env;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "insp: an inspiration board for project ideas, media and discussion",
    long_about = None
)]
struct Cli {
    #[arg(short, long)]
    verbose: bool,

    /// Output format. Defaults to pretty on a terminal and text when piped.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        output::resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create a board in the current directory",
        long_about = "Create `.inspo/` with a default config.toml and an empty item file.",
        after_help = "EXAMPLES:\n    # Start a board here\n    insp init\n\n    # Rewrite the default config, keeping items\n    insp init --force"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Add a project with at least one attachment",
        long_about = "Upload the given files to the configured media host and create a project card from them.",
        after_help = "EXAMPLES:\n    # Add a project with two attachments\n    insp add --title \"Logo\" -d \"first pass\" -a logo.png -a sketch.mp4\n\n    # Emit machine-readable output\n    insp add --title \"Logo\" -a logo.png --json"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Projects",
        about = "List projects",
        long_about = "List projects, optionally filtered by text and sorted.",
        after_help = "EXAMPLES:\n    # Newest first (default)\n    insp list\n\n    # Search and sort by title\n    insp list --search motion --sort title-asc"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Show one project with its attachments and comments",
        after_help = "EXAMPLES:\n    # Show a project by id prefix\n    insp show -OH2kF\n\n    # Include every comment thread\n    insp show -OH2kF --all-comments"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Change a project's title, description or attachments",
        after_help = "EXAMPLES:\n    # Rename\n    insp edit -OH2kF --title \"Logo v2\"\n\n    # Add a file and drop an old one\n    insp edit -OH2kF -a final.png --detach a1760000000000-x9k2"
    )]
    Edit(cmd::edit::EditArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Mark a project done, or open again",
        after_help = "EXAMPLES:\n    insp toggle -OH2kF"
    )]
    Toggle(cmd::toggle::ToggleArgs),

    #[command(
        next_help_heading = "Projects",
        about = "Delete a project after typing its title",
        long_about = "Delete a project. The exact title must be typed back, either at the prompt or with --confirm.",
        after_help = "EXAMPLES:\n    # Prompt for the title\n    insp delete -OH2kF\n\n    # Non-interactive\n    insp delete -OH2kF --confirm \"Launch Plan\""
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(next_help_heading = "Discussion", about = "Post, reply to, edit or remove comments")]
    Comment(cmd::comment::CommentArgs),

    #[command(
        next_help_heading = "Discussion",
        about = "Set or show the display name used for comments",
        after_help = "EXAMPLES:\n    insp name \"Ayu\"\n    insp name\n    insp name --clear"
    )]
    Name(cmd::name::NameArgs),

    #[command(
        next_help_heading = "Reporting",
        about = "Chart daily activity",
        long_about = "Chart projects created and comments posted per day. A project counts 3, a comment 1.",
        after_help = "EXAMPLES:\n    # Last 30 days\n    insp activity\n\n    # Last week as JSON\n    insp activity --days 7 --json"
    )]
    Activity(cmd::activity::ActivityArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("INSPO_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "inspo=debug,info"
        } else {
            "inspo=info,warn"
        })
    });

    let format = env::var("INSPO_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Only `comment` and `name` read the display name, so only they pay for
/// (and can fail on) the preferences file.
fn load_preferences() -> anyhow::Result<PreferenceStore> {
    let path = config::preferences_path()?;
    PreferenceStore::load(&path)
        .with_context(|| format!("Failed to load preferences from {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    inspo_core::init();

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let project_root = env::current_dir()?;
    let output = cli.output_mode();
    debug!(?output, "output mode resolved");

    match &cli.command {
        Commands::Init(args) => cmd::init::run_init(args, output, &project_root),
        Commands::Add(args) => cmd::add::run_add(args, output, &project_root),
        Commands::List(args) => cmd::list::run_list(args, output, &project_root),
        Commands::Show(args) => cmd::show::run_show(args, output, &project_root),
        Commands::Edit(args) => cmd::edit::run_edit(args, output, &project_root),
        Commands::Toggle(args) => cmd::toggle::run_toggle(args, output, &project_root),
        Commands::Delete(args) => cmd::delete::run_delete(args, output, &project_root),
        Commands::Comment(args) => {
            let prefs = load_preferences()?;
            cmd::comment::run_comment(args, &prefs, output, &project_root)
        }
        Commands::Name(args) => {
            let mut prefs = load_preferences()?;
            cmd::name::run_name(args, &mut prefs, output)
        }
        Commands::Activity(args) => {
            cmd::activity::run_activity(args, output, &project_root)
        }
    }
}
