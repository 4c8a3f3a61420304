// ── External collaborators ──
//
// The core never renders anything or talks to the hotspot itself. It
// calls out through these traits; every call is fire-and-forget and the
// core does not observe the outcome.

use secrecy::SecretString;
use serde::Serialize;
use strum::Display;
use tracing::{info, warn};
use url::Url;

use crate::model::SpinOutcome;

/// How prominent a main-page message should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Alert,
}

/// Starts a network session on the hotspot.
pub trait Authenticator: Send + Sync {
    /// Begin logging in with the given credentials. Must not block; the
    /// result is the implementation's concern.
    fn perform_authentication(&self, username: &str, password: &SecretString);
}

/// User-facing feedback.
pub trait Notifier: Send + Sync {
    /// Present the result of a spin attempt, successful or not.
    fn show_spin_result(&self, outcome: &SpinOutcome);

    fn show_connecting_overlay(&self);

    fn show_main_message(&self, text: &str, severity: Severity);

    /// Navigate to an external page (the advertiser's site).
    fn open_external(&self, url: &Url);
}

/// Notifier that only logs. Used when no presentation layer is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn show_spin_result(&self, outcome: &SpinOutcome) {
        if outcome.is_error() {
            warn!(title = %outcome.title, message = %outcome.message, "spin result");
        } else {
            info!(kind = %outcome.kind, title = %outcome.title, message = %outcome.message, "spin result");
        }
    }

    fn show_connecting_overlay(&self) {
        info!("connecting overlay shown");
    }

    fn show_main_message(&self, text: &str, severity: Severity) {
        match severity {
            Severity::Alert => warn!(%severity, "{text}"),
            Severity::Success | Severity::Info => info!(%severity, "{text}"),
        }
    }

    fn open_external(&self, url: &Url) {
        info!(%url, "opening external page");
    }
}
