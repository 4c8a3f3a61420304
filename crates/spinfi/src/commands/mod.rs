//! Command dispatch: bridges CLI args -> portal operations -> output formatting.

pub mod access;
pub mod config_cmd;
pub mod spin;
pub mod status;
pub mod util;
pub mod wheel;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

use self::util::PortalContext;

/// Dispatch a ledger-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    ctx: &PortalContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Spin(args) => spin::handle(ctx, args, global).await,
        Command::Reset => spin::reset(ctx, global),
        Command::Status => status::status(ctx, global),
        Command::History(args) => status::history(ctx, &args, global),
        Command::FreeConnect => access::free_connect(ctx, global).await,
        Command::Advert => access::advert(ctx, global).await,
        // Handled before a portal is built
        Command::Window(_)
        | Command::Prizes
        | Command::Simulate(_)
        | Command::Config(_)
        | Command::Completions(_) => unreachable!(),
    }
}
