//! Spin and reset handlers.

use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use spinfi_core::{SpinFailure, SpinOutcome};

use crate::cli::{GlobalOpts, SpinArgs};
use crate::error::CliError;
use crate::output;

use super::util::{self, PortalContext};

#[derive(Serialize)]
struct SpinReport {
    outcomes: Vec<SpinOutcome>,
    spins_remaining: u32,
    sessions_started: usize,
}

fn detail(report: &SpinReport, color: bool) -> String {
    let mut out = String::new();
    for outcome in &report.outcomes {
        let _ = writeln!(
            out,
            "{}",
            output::paint_outcome(&outcome.title, outcome.kind, color)
        );
        let _ = writeln!(out, "  {}", outcome.message);
    }
    let _ = write!(out, "Spins left today: {}", report.spins_remaining);
    out
}

fn spinner(global: &GlobalOpts, instant: bool) -> Option<ProgressBar> {
    if global.quiet || instant || !std::io::stderr().is_terminal() {
        return None;
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message("Spinning...");
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

pub async fn handle(
    ctx: &PortalContext,
    args: SpinArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let instant = ctx.portal.config().timing.reveal_delay.is_zero();
    let mut outcomes = Vec::new();

    loop {
        let handle = ctx.portal.spin()?;
        let pb = handle.prize().and_then(|_| spinner(global, instant));
        let outcome = handle.outcome().await;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        let again = args.auto_respin && outcome.respin_available;
        outcomes.push(outcome);
        if !again {
            break;
        }
    }

    let sessions_started = ctx.settle().await?;
    let report = SpinReport {
        spins_remaining: ctx.portal.remaining_spins(),
        outcomes,
        sessions_started,
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| {
            r.outcomes
                .iter()
                .map(|o| o.title.clone())
                .collect::<Vec<_>>()
                .join("\n")
        },
    );
    output::print_output(&out, global.quiet);

    // A session prize without a configured login is a setup problem.
    if let Some(outcome) = report.outcomes.last() {
        if outcome.failure == Some(SpinFailure::UnknownRewardTag) {
            let tag = outcome
                .prize
                .as_ref()
                .and_then(spinfi_core::PrizeEntry::credential_key)
                .unwrap_or_default();
            return Err(CliError::UnknownRewardTag { tag });
        }
    }
    Ok(())
}

pub fn reset(ctx: &PortalContext, global: &GlobalOpts) -> Result<(), CliError> {
    if !util::confirm("Reset today's spin quota?", "reset", global.yes)? {
        return Ok(());
    }
    ctx.portal.reset_daily_spins()?;
    if !global.quiet {
        eprintln!(
            "✓ Daily spins reset ({} left today)",
            ctx.portal.remaining_spins()
        );
    }
    Ok(())
}
