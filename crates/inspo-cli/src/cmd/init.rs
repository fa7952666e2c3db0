use crate::output::{OutputMode, pretty_kv, render};
use anyhow::{Context as _, Result};
use clap::Args;
use inspo_core::config::{self, PROJECT_DIR, ProjectConfig};
use inspo_core::store::FileBackend;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Rewrite the default config even if `.inspo/` already exists.
    #[arg(long)]
    pub force: bool,
}

const GITIGNORE: &str = "*.lock\n*.tmp\n";

#[derive(Debug, Serialize)]
struct InitOutput {
    ok: bool,
    root: String,
    config: String,
    items: String,
    created_items: bool,
}

/// Execute `insp init`. Creates the board skeleton:
///
/// ```text
/// .inspo/
///   config.toml   (defaults written out in full)
///   items.json    (empty board)
///   .gitignore    (lock and temp files)
/// ```
///
/// Existing items are never touched, even with `--force`.
pub fn run_init(args: &InitArgs, output: OutputMode, project_root: &Path) -> Result<()> {
    let dir = project_root.join(PROJECT_DIR);
    if dir.exists() && !args.force {
        anyhow::bail!(".inspo/ already exists. Use `insp init --force` to rewrite its config.");
    }

    let cfg = ProjectConfig::default();
    let config_path = config::save_project_config(project_root, &cfg)?;

    let gitignore = dir.join(".gitignore");
    std::fs::write(&gitignore, GITIGNORE)
        .with_context(|| format!("Failed to write {}", gitignore.display()))?;

    let items_path = cfg.storage_path(project_root);
    let created_items = FileBackend::open(&items_path)
        .initialize()
        .with_context(|| format!("Failed to create {}", items_path.display()))?;

    info!(root = %project_root.display(), "board initialized");

    let result = InitOutput {
        ok: true,
        root: project_root.display().to_string(),
        config: config_path.display().to_string(),
        items: items_path.display().to_string(),
        created_items,
    };
    render(output, &result, |r, w| {
        writeln!(w, "✓ initialized board in {}", r.root)?;
        pretty_kv(w, "config", &r.config)?;
        pretty_kv(w, "items", &r.items)
    })
}
