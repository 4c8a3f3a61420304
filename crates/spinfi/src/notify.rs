//! Terminal notifier.
//!
//! Messages and the connecting overlay go to stderr so stdout stays
//! reserved for the command's rendered output. Spin results are rendered
//! by the `spin` command itself; the notifier only logs them.

use std::io::{self, Write};

use owo_colors::OwoColorize;
use tracing::debug;
use url::Url;

use spinfi_core::{Notifier, Severity, SpinOutcome};

pub struct CliNotifier {
    color: bool,
    quiet: bool,
}

impl CliNotifier {
    pub fn new(color: bool, quiet: bool) -> Self {
        Self { color, quiet }
    }

    fn line(&self, text: &str) {
        if self.quiet {
            return;
        }
        let _ = writeln!(io::stderr().lock(), "{text}");
    }
}

impl Notifier for CliNotifier {
    fn show_spin_result(&self, outcome: &SpinOutcome) {
        debug!(kind = %outcome.kind, title = %outcome.title, "spin result");
    }

    fn show_connecting_overlay(&self) {
        let text = "⏳ Connecting...";
        if self.color {
            self.line(&text.dimmed().to_string());
        } else {
            self.line(text);
        }
    }

    fn show_main_message(&self, text: &str, severity: Severity) {
        // Alerts are shown even in quiet mode.
        let rendered = match (self.color, severity) {
            (false, _) => text.to_owned(),
            (true, Severity::Success) => text.green().to_string(),
            (true, Severity::Info) => text.cyan().to_string(),
            (true, Severity::Alert) => text.red().bold().to_string(),
        };
        if severity == Severity::Alert {
            let _ = writeln!(io::stderr().lock(), "{rendered}");
        } else {
            self.line(&rendered);
        }
    }

    fn open_external(&self, url: &Url) {
        self.line(&format!("→ Opening {url}"));
    }
}
