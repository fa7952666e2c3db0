use crate::output::{OutputMode, render};
use clap::Args;
use inspo_core::config::PreferenceStore;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct NameArgs {
    /// Display name to sign comments with. Prints the current one when omitted.
    pub name: Option<String>,

    /// Forget the saved display name.
    #[arg(long, conflicts_with = "name")]
    pub clear: bool,
}

#[derive(Debug, Serialize)]
struct NameOutput {
    display_name: Option<String>,
    changed: bool,
    path: String,
}

pub fn run_name(args: &NameArgs, prefs: &mut PreferenceStore, output: OutputMode) -> anyhow::Result<()> {
    let changed = if args.clear {
        prefs.set_display_name(None)?
    } else if let Some(name) = &args.name {
        prefs.set_display_name(Some(name))?
    } else {
        false
    };

    let result = NameOutput {
        display_name: prefs.display_name().map(str::to_string),
        changed,
        path: prefs.path().display().to_string(),
    };
    render(output, &result, |r, w| match &r.display_name {
        Some(name) if r.changed => writeln!(w, "✓ commenting as {name}"),
        Some(name) => writeln!(w, "{name}"),
        None => writeln!(w, "no display name set; run `insp name \"Your Name\"`"),
    })
}
