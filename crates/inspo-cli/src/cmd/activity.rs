use crate::cmd::board::Board;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};
use chrono::Local;
use clap::Args;
use inspo_core::activity::{self, Activity};
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Number of days to chart, ending today. Defaults to `[activity] window_days`.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(activity::MAX_WINDOW_DAYS)))]
    pub days: Option<u32>,
}

const BAR_WIDTH: u64 = 40;

pub fn run_activity(
    args: &ActivityArgs,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let board = Board::open(project_root, output)?;
    let mut settings = board.config.activity;
    if let Some(days) = args.days {
        settings.window_days = days;
    }
    let chart = activity::aggregate(&board.store.items(), &Local::now(), &settings);
    render_mode(output, &chart, write_text, write_pretty)
}

fn write_text(chart: &Activity, w: &mut dyn Write) -> io::Result<()> {
    for day in &chart.buckets {
        writeln!(w, "{}\t{}\t{}\t{}", day.date, day.items, day.comments, day.score)?;
    }
    Ok(())
}

/// Length of the bar for `score`, scaled so `peak` fills the full width.
fn bar_len(score: u64, peak: u64) -> usize {
    if peak == 0 || score == 0 {
        return 0;
    }
    let scaled = (u128::from(score) * u128::from(BAR_WIDTH)).div_ceil(u128::from(peak));
    usize::try_from(scaled.min(u128::from(BAR_WIDTH))).unwrap_or(0)
}

fn write_pretty(chart: &Activity, w: &mut dyn Write) -> io::Result<()> {
    pretty_section(w, &format!("Activity, last {} day(s)", chart.buckets.len()))?;
    let peak = chart.peak();
    for day in &chart.buckets {
        let bar = "█".repeat(bar_len(day.score, peak));
        writeln!(w, "{}  {:<40} {}", day.date.format("%m-%d"), bar, day.score)?;
    }
    writeln!(w)?;
    pretty_kv(w, "projects", chart.total_items.to_string())?;
    pretty_kv(w, "comments", chart.total_comments.to_string())?;
    pretty_kv(w, "score", chart.total_score.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_scale_to_peak() {
        assert_eq!(bar_len(0, 10), 0);
        assert_eq!(bar_len(10, 10), 40);
        assert_eq!(bar_len(5, 10), 20);
        assert_eq!(bar_len(1, 100), 1);
        assert_eq!(bar_len(3, 0), 0);
    }

    #[test]
    fn bars_handle_scores_past_u32() {
        let peak = 3 * u64::from(u32::MAX);
        assert_eq!(bar_len(peak, peak), 40);
        assert_eq!(bar_len(u64::from(u32::MAX), peak), 14);
        assert_eq!(bar_len(u64::MAX, u64::MAX), 40);
    }
}
