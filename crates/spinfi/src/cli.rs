//! Clap derive structures for the `spinfi` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// spinfi -- reward wheel and free-access gate for captive portals
#[derive(Debug, Parser)]
#[command(
    name = "spinfi",
    version,
    about = "Run the captive-portal reward wheel from the command line",
    long_about = "Spin the daily reward wheel, check the free access window, and\n\
        start hotspot sessions for winners.\n\n\
        State (daily spins, win history, lifetime totals) lives in a local\n\
        ledger file shared by every invocation.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "SPINFI_CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Ledger file (overrides the config)
    #[arg(long, env = "SPINFI_LEDGER_FILE", global = true)]
    pub ledger: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SPINFI_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Skip reveal and redirect delays
    #[arg(long, env = "SPINFI_INSTANT", global = true)]
    pub instant: bool,

    /// Seed the prize draw (reproducible spins)
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Spin the reward wheel
    #[command(alias = "s")]
    Spin(SpinArgs),

    /// Show spins left, lifetime total, and free window state
    #[command(alias = "st")]
    Status,

    /// Show recent wins, newest first
    #[command(alias = "hist")]
    History(HistoryArgs),

    /// Check the free access window
    #[command(alias = "w")]
    Window(WindowArgs),

    /// Log in with the free-window credentials (only while the window is open)
    FreeConnect,

    /// Open the advertiser's page
    Advert,

    /// List the prize table with odds
    Prizes,

    /// Draw many prizes without touching the ledger and compare the odds
    Simulate(SimulateArgs),

    /// Clear today's spin quota
    Reset,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WHEEL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SpinArgs {
    /// Use bonus spins right away until one is not won
    #[arg(long)]
    pub auto_respin: bool,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Max entries to show
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Number of draws
    #[arg(long, short = 'n', default_value = "100000")]
    pub draws: u64,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ACCESS WINDOW
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WindowArgs {
    /// Evaluate at this local time instead of now
    /// (e.g. "2026-10-24 01:30" or "2026-10-24T01:30:00")
    #[arg(long)]
    pub at: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create a config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config and ledger file paths
    Path,

    /// Store a password in the system keyring
    SetPassword {
        /// Credential scope: `free_window` or `credentials/<key>` (e.g. `credentials/3h`)
        scope: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
