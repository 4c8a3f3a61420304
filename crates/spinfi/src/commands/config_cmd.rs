//! Config subcommand handlers.

use std::collections::BTreeSet;

use dialoguer::{Input, Select};

use spinfi_core::PrizeTable;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, CredentialEntry};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "****";

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);

    let _ = writeln!(out, "\n[ledger]");
    let _ = writeln!(out, "path = \"{}\"", cfg.ledger_path().display());
    let _ = writeln!(out, "key_prefix = \"{}\"", cfg.ledger.key_prefix);

    let _ = writeln!(out, "\n[wheel]");
    let _ = writeln!(out, "daily_allowance = {}", cfg.wheel.daily_allowance);
    let _ = writeln!(out, "history_cap = {}", cfg.wheel.history_cap);
    match &cfg.wheel.prizes {
        Some(prizes) => {
            let _ = writeln!(out, "# {} custom prizes", prizes.len());
        }
        None => {
            let _ = writeln!(out, "# standard prize table");
        }
    }

    let fw = &cfg.free_window;
    let _ = writeln!(out, "\n[free_window]");
    let _ = writeln!(out, "days = {:?}", fw.days);
    let _ = writeln!(out, "start_hour = {}", fw.start_hour);
    let _ = writeln!(out, "end_hour = {}", fw.end_hour);
    let _ = writeln!(out, "poll_interval_secs = {}", fw.poll_interval_secs);
    if let Some(ref u) = fw.username {
        let _ = writeln!(out, "username = \"{u}\"");
    }
    if fw.password.is_some() {
        let _ = writeln!(out, "password = \"{REDACTED}\"");
    }
    if let Some(ref env) = fw.password_env {
        let _ = writeln!(out, "password_env = \"{env}\"");
    }

    for (key, entry) in &cfg.credentials {
        let _ = writeln!(out, "\n[credentials.{key}]");
        let _ = writeln!(out, "username = \"{}\"", entry.username);
        if entry.password.is_some() {
            let _ = writeln!(out, "password = \"{REDACTED}\"");
        }
        if let Some(ref env) = entry.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
    }

    let _ = writeln!(out, "\n[hotspot]");
    if let Some(ref url) = cfg.hotspot.login_url {
        let _ = writeln!(out, "login_url = \"{url}\"");
    }
    let _ = writeln!(out, "timeout = {}", cfg.hotspot.timeout);

    let t = &cfg.timing;
    let _ = writeln!(out, "\n[timing]");
    let _ = writeln!(out, "reveal_delay_ms = {}", t.reveal_delay_ms);
    let _ = writeln!(out, "result_hold_ms = {}", t.result_hold_ms);
    let _ = writeln!(out, "auth_delay_ms = {}", t.auth_delay_ms);
    let _ = writeln!(out, "free_connect_delay_ms = {}", t.free_connect_delay_ms);
    let _ = writeln!(out, "advert_delay_ms = {}", t.advert_delay_ms);
    let _ = writeln!(out, "snapshot_interval_secs = {}", t.snapshot_interval_secs);

    if let Some(ref url) = cfg.advert.url {
        let _ = writeln!(out, "\n[advert]");
        let _ = writeln!(out, "url = \"{url}\"");
    }

    out
}

/// Mask plaintext passwords before structured output.
fn redact(cfg: &mut Config) {
    if cfg.free_window.password.is_some() {
        cfg.free_window.password = Some(REDACTED.into());
    }
    for entry in cfg.credentials.values_mut() {
        if entry.password.is_some() {
            entry.password = Some(REDACTED.into());
        }
    }
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Scopes accepted by `set-password`: `free_window` or `credentials/<key>`.
fn validate_scope(scope: &str) -> Result<(), CliError> {
    let valid = scope == "free_window"
        || scope
            .strip_prefix("credentials/")
            .is_some_and(|key| !key.is_empty() && !key.contains('/'));
    if valid {
        Ok(())
    } else {
        Err(CliError::Validation {
            field: "scope".into(),
            reason: format!("'{scope}' must be 'free_window' or 'credentials/<key>'"),
        })
    }
}

/// Offer to store a password in the system keyring or return it for
/// plaintext config.
///
/// Returns `Some(password)` if the user chose plaintext, `None` if stored
/// in the keyring.
fn prompt_keyring_storage(password: &str, scope: &str) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_password(scope, password)?;
        eprintln!("   ✓ {scope} password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

/// Ask for a hotspot login. An empty username skips it.
fn prompt_login(label: &str, scope: &str) -> Result<Option<CredentialEntry>, CliError> {
    let username: String = Input::new()
        .with_prompt(format!("{label} username (empty to skip)"))
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    if username.is_empty() {
        return Ok(None);
    }

    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if password.is_empty() {
        return Err(CliError::Validation {
            field: format!("{scope} password"),
            reason: "password cannot be empty".into(),
        });
    }

    Ok(Some(CredentialEntry {
        username,
        password: prompt_keyring_storage(&password, scope)?,
        password_env: None,
    }))
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::active_config_path(global);
            eprintln!("✨ spinfi configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = Config::default();

            // 1. Hotspot login endpoint
            let login_url: String = Input::new()
                .with_prompt("Hotspot login URL")
                .default("http://10.5.50.1/login".into())
                .interact_text()
                .map_err(prompt_err)?;
            cfg.hotspot.login_url = Some(login_url);

            // 2. One login per session prize in the standard table
            let tags: BTreeSet<String> = PrizeTable::standard()
                .entries()
                .iter()
                .filter_map(spinfi_core::PrizeEntry::credential_key)
                .collect();
            for tag in tags {
                let scope = format!("credentials/{tag}");
                if let Some(entry) = prompt_login(&format!("Prize '{tag}'"), &scope)? {
                    cfg.credentials.insert(tag, entry);
                }
            }

            // 3. Free window login
            if let Some(entry) = prompt_login("Free window", "free_window")? {
                cfg.free_window.username = Some(entry.username);
                cfg.free_window.password = entry.password;
            }

            // 4. Advert
            let advert: String = Input::new()
                .with_prompt("Advert URL (empty to skip)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;
            if !advert.is_empty() {
                cfg.advert.url = Some(advert);
            }

            // Validate before writing
            config::to_portal_config(&cfg)?;
            config::save_config_to(&cfg, &config_path)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("\n  Try it: spinfi status");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load(global)?;
            redact(&mut cfg);
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            let cfg = config::load(global)?;
            let out = format!(
                "{}\n{}",
                config::active_config_path(global).display(),
                config::ledger_path(global, &cfg).display()
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set password ────────────────────────────────────────────
        ConfigCommand::SetPassword { scope } => {
            validate_scope(&scope)?;
            let password = rpassword::prompt_password(format!("Password for {scope}: "))
                .map_err(prompt_err)?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: format!("{scope} password"),
                    reason: "password cannot be empty".into(),
                });
            }
            config::store_password(&scope, &password)?;
            eprintln!("✓ Password for '{scope}' stored in system keyring");
            Ok(())
        }
    }
}
