//! Free window and advert handlers.

use chrono::NaiveDateTime;
use serde::Serialize;

use spinfi_core::{Clock, CoreError, SystemClock, is_within_free_window};

use crate::cli::{GlobalOpts, WindowArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util::{self, PortalContext};

#[derive(Serialize)]
struct WindowReport {
    at: NaiveDateTime,
    open: bool,
    schedule: String,
    next_opening: Option<NaiveDateTime>,
}

fn detail(r: &WindowReport, color: bool) -> String {
    [
        format!("At:            {}", r.at.format("%a %Y-%m-%d %H:%M")),
        format!("Open:          {}", output::paint_flag(r.open, color)),
        format!("Schedule:      {}", r.schedule),
        format!(
            "Next opening:  {}",
            r.next_opening
                .map_or_else(|| "-".into(), |t| t.format("%a %Y-%m-%d %H:%M").to_string())
        ),
    ]
    .join("\n")
}

/// Evaluate the free window from the config alone; no ledger needed.
pub fn window(args: &WindowArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load(global)?;
    let schedule = cfg.free_window.schedule()?;
    let at = match &args.at {
        Some(raw) => util::parse_local_datetime(raw)?,
        None => SystemClock.now(),
    };

    let report = WindowReport {
        at,
        open: is_within_free_window(at, &schedule),
        schedule: schedule.describe(),
        next_opening: schedule.next_opening(at),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| if r.open { "open".into() } else { "closed".into() },
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn free_connect(ctx: &PortalContext, global: &GlobalOpts) -> Result<(), CliError> {
    ctx.portal.connect_free().map_err(|e| match e {
        CoreError::FreeWindowClosed => CliError::FreeWindowClosed {
            schedule: ctx.portal.config().schedule.describe(),
        },
        CoreError::Config { message } => CliError::Validation {
            field: "free_window.username".into(),
            reason: message,
        },
        other => other.into(),
    })?;

    let started = ctx.settle().await?;
    if ctx.hotspot.is_none() {
        return Err(CliError::AuthenticatorUnavailable);
    }
    if !global.quiet {
        eprintln!("✓ Free window session started ({started} login)");
    }
    Ok(())
}

pub async fn advert(ctx: &PortalContext, global: &GlobalOpts) -> Result<(), CliError> {
    let url = ctx.portal.open_advert().ok_or(CliError::NoAdvert)?;
    ctx.portal.settle().await;
    output::print_output(url.as_str(), global.quiet);
    Ok(())
}
