//! CLI output formatting

use crate::core::{Event, SequenceStatus, SequencerState, StepFailure};
use console::Emoji;
use serde_json::Value;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a sequence status for display
pub fn format_status(status: SequenceStatus) -> String {
    match status {
        SequenceStatus::Idle => style("IDLE").dim().to_string(),
        SequenceStatus::Running => style("RUNNING").yellow().to_string(),
        SequenceStatus::Succeeded => style("SUCCEEDED").green().to_string(),
        SequenceStatus::Failed => style("FAILED").red().to_string(),
        SequenceStatus::TimedOut => style("TIMED OUT").red().to_string(),
    }
}

/// Render arguments as a compact comma-separated list
pub fn format_args(args: &[Value]) -> String {
    args.iter()
        .map(|arg| arg.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format the start of a step for display
pub fn format_step_started(name: &str, position: usize, total: usize, args: &[Value]) -> String {
    let progress = style(format!("[{}/{}]", position, total)).dim();
    if args.is_empty() {
        format!("{} {} {}", SPINNER, progress, style(name).cyan())
    } else {
        format!(
            "{} {} {} ({})",
            SPINNER,
            progress,
            style(name).cyan(),
            style(format_args(args)).dim()
        )
    }
}

/// Format a notified event for display
pub fn format_event(event: &Event, args: &[Value]) -> String {
    match event {
        Event::Success => format!(
            "{} {} ({})",
            CHECK,
            style("success").green(),
            style(format_args(args)).dim()
        ),
        Event::Error => match StepFailure::from_args(args) {
            Some(failure) => format!(
                "{} {}: {}",
                CROSS,
                style(&failure.step).red(),
                style(&failure.message).dim()
            ),
            None => format!("{} {}", CROSS, style("error").red()),
        },
        Event::Timeout => format!(
            "{} {} ({})",
            WARN,
            style("timed out").red(),
            style(format_args(args)).dim()
        ),
        Event::Done => format!("{} {}", INFO, style("done").dim()),
        Event::Custom(name) => format!(
            "{} {} ({})",
            INFO,
            style(name).yellow(),
            style(format_args(args)).dim()
        ),
    }
}

/// Format a state summary for display
pub fn format_state(name: &str, state: &SequencerState) -> String {
    let status_icon = match state.status {
        SequenceStatus::Succeeded => CHECK,
        SequenceStatus::Failed | SequenceStatus::TimedOut => CROSS,
        SequenceStatus::Running => SPINNER,
        SequenceStatus::Idle => INFO,
    };

    format!(
        "{} {} - {} - {} - {} step(s) run",
        status_icon,
        style(state.short_id()).dim(),
        style(name).bold(),
        format_status(state.status),
        state.steps_run
    )
}
