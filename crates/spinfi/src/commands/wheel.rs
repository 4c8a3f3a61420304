//! Prize table and draw simulation handlers.
//!
//! Neither touches the ledger: both work on the configured prize table.

use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tabled::Tabled;

use spinfi_core::{PrizeEntry, PrizeTable, select_prize};

use crate::cli::{GlobalOpts, SimulateArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct PrizeOdds {
    #[serde(flatten)]
    entry: PrizeEntry,
    probability: f64,
}

#[derive(Tabled)]
struct PrizeRow {
    #[tabled(rename = "Prize")]
    name: String,
    #[tabled(rename = "Weight")]
    weight: u32,
    #[tabled(rename = "Odds")]
    odds: String,
    #[tabled(rename = "Type")]
    category: String,
    #[tabled(rename = "Tag")]
    tag: String,
}

impl From<&PrizeOdds> for PrizeRow {
    fn from(p: &PrizeOdds) -> Self {
        Self {
            name: p.entry.name.clone(),
            weight: p.entry.weight,
            odds: percent(p.probability),
            category: p.entry.category.to_string(),
            tag: p
                .entry
                .payload
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct DrawTally {
    prize: String,
    expected: f64,
    observed: f64,
    count: u64,
}

#[derive(Tabled)]
struct TallyRow {
    #[tabled(rename = "Prize")]
    prize: String,
    #[tabled(rename = "Expected")]
    expected: String,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Count")]
    count: u64,
}

impl From<&DrawTally> for TallyRow {
    fn from(t: &DrawTally) -> Self {
        Self {
            prize: t.prize.clone(),
            expected: percent(t.expected),
            observed: percent(t.observed),
            count: t.count,
        }
    }
}

fn percent(p: f64) -> String {
    format!("{:.2}%", p * 100.0)
}

fn prize_table(global: &GlobalOpts) -> Result<PrizeTable, CliError> {
    let cfg = config::load(global)?;
    Ok(cfg.wheel.prize_table()?)
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn prizes(global: &GlobalOpts) -> Result<(), CliError> {
    let table = prize_table(global)?;
    let odds: Vec<PrizeOdds> = table
        .entries()
        .iter()
        .map(|entry| PrizeOdds {
            probability: table.probability(entry),
            entry: entry.clone(),
        })
        .collect();

    let out = output::render_list(&global.output, &odds, |p| PrizeRow::from(p), |p| {
        p.entry.name.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn simulate(args: &SimulateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    if args.draws == 0 {
        return Err(CliError::Validation {
            field: "draws".into(),
            reason: "must be at least 1".into(),
        });
    }

    let table = prize_table(global)?;
    let mut rng = match global.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let pb = if global.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(args.draws)
    };
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} draws") {
        pb.set_style(style);
    }

    let entries = table.entries();
    let mut counts = vec![0_u64; entries.len()];
    let step = (args.draws / 100).max(1);
    for i in 0..args.draws {
        let won = select_prize(&table, &mut rng);
        if let Some(slot) = entries.iter().position(|e| std::ptr::eq(e, won)) {
            counts[slot] += 1;
        }
        if i % step == 0 {
            pb.set_position(i);
        }
    }
    pb.finish_and_clear();

    let tally: Vec<DrawTally> = entries
        .iter()
        .zip(&counts)
        .map(|(entry, &count)| DrawTally {
            prize: entry.name.clone(),
            expected: table.probability(entry),
            observed: count as f64 / args.draws as f64,
            count,
        })
        .collect();

    let out = output::render_list(&global.output, &tally, |t| TallyRow::from(t), |t| {
        format!("{}\t{}", t.prize, t.count)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}
