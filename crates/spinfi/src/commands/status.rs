//! Status and history handlers.

use tabled::Tabled;

use spinfi_core::{PortalStatus, WinRecord};

use crate::cli::{GlobalOpts, HistoryArgs};
use crate::error::CliError;
use crate::output;

use super::util::PortalContext;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct WinRow {
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Prize")]
    prize: String,
    #[tabled(rename = "Type")]
    category: String,
}

impl From<&WinRecord> for WinRow {
    fn from(r: &WinRecord) -> Self {
        Self {
            when: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            prize: r.prize_name.clone(),
            category: r.category.to_string(),
        }
    }
}

fn detail(s: &PortalStatus, color: bool) -> String {
    [
        format!("Spins left today:  {}", s.spins_remaining),
        format!("Lifetime spins:    {}", s.total_spins),
        format!("Wins recorded:     {}", s.history_len),
        format!(
            "Free window open:  {}",
            output::paint_flag(s.free_window_open, color)
        ),
        format!(
            "Next free window:  {}",
            s.next_free_window
                .map_or_else(|| "-".into(), |t| t.format("%a %Y-%m-%d %H:%M").to_string())
        ),
    ]
    .join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

#[allow(clippy::unnecessary_wraps)]
pub fn status(ctx: &PortalContext, global: &GlobalOpts) -> Result<(), CliError> {
    let status = ctx.portal.status();
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &status,
        |s| detail(s, color),
        |s| s.spins_remaining.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

#[allow(clippy::unnecessary_wraps)]
pub fn history(
    ctx: &PortalContext,
    args: &HistoryArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut wins = ctx.portal.win_history();
    if let Some(limit) = args.limit {
        wins.truncate(limit);
    }
    let out = output::render_list(&global.output, &wins, |r| WinRow::from(r), |r| {
        r.prize_name.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
