// ── Spin outcomes ──
//
// Every spin attempt -- denied, failed, or successful -- ends in a
// `SpinOutcome`, so the presentation layer has exactly one channel to
// render results through.

use serde::Serialize;
use strum::Display;

use super::prize::{PrizeCategory, PrizeEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    Thanks,
    Win,
    Bonus,
    Error,
}

/// Why a spin produced an error outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpinFailure {
    NoSpinsLeft,
    SpinInProgress,
    UnknownRewardTag,
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpinOutcome {
    pub kind: OutcomeKind,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<PrizeEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<SpinFailure>,
    /// A bonus was granted and another spin may start immediately.
    pub respin_available: bool,
}

impl SpinOutcome {
    /// Presentation for a successfully resolved prize.
    pub fn for_prize(prize: &PrizeEntry) -> Self {
        let (kind, title, message) = match prize.category {
            PrizeCategory::Neutral => (
                OutcomeKind::Thanks,
                "Thanks for Playing!".to_owned(),
                THANKS_MESSAGE.to_owned(),
            ),
            PrizeCategory::TimeGrant => (
                OutcomeKind::Win,
                "Congratulations!".to_owned(),
                format!(
                    "You won {} of free internet! Your session will start automatically.",
                    prize.name
                ),
            ),
            PrizeCategory::DataGrant => (
                OutcomeKind::Win,
                "Amazing!".to_owned(),
                format!(
                    "You won {} of free data! Your session will start automatically.",
                    prize.name
                ),
            ),
            PrizeCategory::BonusSpin => (
                OutcomeKind::Bonus,
                "Bonus Spin!".to_owned(),
                "You earned an extra spin chance! Spin again now.".to_owned(),
            ),
        };

        Self {
            kind,
            title,
            message,
            prize: Some(prize.clone()),
            failure: None,
            respin_available: prize.category == PrizeCategory::BonusSpin,
        }
    }

    pub fn failed(failure: SpinFailure, prize: Option<PrizeEntry>) -> Self {
        let (title, message) = match failure {
            SpinFailure::NoSpinsLeft => ("No Spins Left", "Come back tomorrow for more spins!"),
            SpinFailure::SpinInProgress => (
                "Spin In Progress",
                "Please wait for the current spin to finish.",
            ),
            SpinFailure::UnknownRewardTag => (
                "Connection Error",
                "Error connecting spin reward. Please contact support.",
            ),
            SpinFailure::Interrupted => (
                "Spin Interrupted",
                "The spin was interrupted before its result could be shown.",
            ),
        };

        Self {
            kind: OutcomeKind::Error,
            title: title.to_owned(),
            message: message.to_owned(),
            prize,
            failure: Some(failure),
            respin_available: false,
        }
    }

    pub fn is_error(&self) -> bool {
        self.kind == OutcomeKind::Error
    }
}

/// Message shown for the neutral segment.
pub const THANKS_MESSAGE: &str = "Better luck next time! Come back tomorrow for more spins.";
