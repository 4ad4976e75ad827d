//! Command dispatch: bridges CLI args -> provider callbacks -> output.

pub mod catalog;
pub mod lifecycle;
pub mod plan;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Resources => catalog::resources(&config::catalog_provider()?, global),
        Command::Schema(args) => catalog::schema(&config::catalog_provider()?, &args, global),
        Command::Plan(args) => plan::handle(&config::catalog_provider()?, &args, global),
        Command::Apply(args) => {
            lifecycle::apply(&config::build_provider(global)?, &args, global).await
        }
        Command::Read(args) => lifecycle::read(&config::build_provider(global)?, &args, global).await,
        Command::Destroy(args) => {
            lifecycle::destroy(&config::build_provider(global)?, &args, global).await
        }
        Command::Data(args) => lifecycle::data(&config::build_provider(global)?, &args, global).await,
        // Completions is handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}
