//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`serve`], [`check`], or [`health`]. Each handler
//! lives in its own submodule.

pub mod check;
pub mod health;
pub mod serve;

use crate::cli::{Cli, Commands};
use crate::error::LeadRelayError;

pub async fn dispatch(cli: Cli) -> Result<(), LeadRelayError> {
    match cli.command {
        Some(Commands::Serve(args)) => serve::execute(*args).await,
        Some(Commands::Check(ref args)) => check::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  lead-relay v{version} \u{2014} lead-capture form relay\n\n  \
         No command provided. To get started:\n\n    \
         lead-relay check                  Show which channels are configured\n    \
         lead-relay serve                  Start the submission endpoint\n    \
         lead-relay --help                 See all commands and options\n"
    );
}
