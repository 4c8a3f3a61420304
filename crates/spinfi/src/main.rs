mod auth;
mod cli;
mod commands;
mod config;
mod error;
mod notify;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't touch the ledger
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "spinfi", &mut std::io::stdout());
            Ok(())
        }

        // Read-only views of the configuration
        Command::Window(args) => commands::access::window(&args, &cli.global),
        Command::Prizes => commands::wheel::prizes(&cli.global),
        Command::Simulate(args) => commands::wheel::simulate(&args, &cli.global),

        // Everything else runs against the ledger
        cmd => {
            let cfg = config::load(&cli.global)?;
            let ctx = commands::util::build_portal(&cli.global, &cfg)?;
            ctx.portal.start().await;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &ctx, &cli.global).await;

            ctx.portal.shutdown().await;
            result
        }
    }
}
