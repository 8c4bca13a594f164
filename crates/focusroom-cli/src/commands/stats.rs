use clap::Subcommand;
use focusroom_core::stats::MAX_RECENT_DAYS;
use focusroom_core::{goal_progress, WeekStart};
use serde_json::json;

use super::{open_session, print_json, Access, CmdResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats and daily goal progress
    Today,
    /// This week's totals and weekly goal progress
    Week {
        /// Weeks start on Monday (overrides config)
        #[arg(long)]
        monday: bool,
    },
    /// Per-day stats for the last N days, oldest first
    Recent {
        #[arg(
            long,
            default_value = "7",
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RECENT_DAYS))
        )]
        days: u32,
    },
}

pub fn run(action: StatsAction) -> CmdResult {
    let (_, config, session) = open_session(Access::Read)?;

    match action {
        StatsAction::Today => {
            let today = session.today_stats();
            print_json(&json!({
                "date": today.date,
                "pomodoros": today.pomodoros,
                "focusTime": today.focus_time,
                "taskCompletions": today.task_completions,
                "goal": config.stats.daily_goal,
                "goalProgress": goal_progress(today.pomodoros, config.stats.daily_goal),
            }))?;
        }
        StatsAction::Week { monday } => {
            let week_start = if monday {
                WeekStart::Monday
            } else {
                config.stats.week_start
            };
            let week = session.week_stats(week_start);
            print_json(&json!({
                "start": week.start,
                "end": week.end,
                "pomodoros": week.pomodoros,
                "focusTime": week.focus_time,
                "taskCompletions": week.task_completions,
                "goal": config.stats.weekly_goal,
                "goalProgress": goal_progress(week.pomodoros, config.stats.weekly_goal),
            }))?;
        }
        StatsAction::Recent { days } => print_json(&session.recent_stats(days))?,
    }
    Ok(())
}
