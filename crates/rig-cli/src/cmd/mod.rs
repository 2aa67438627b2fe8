use anyhow::Result;

use crate::args::{Cli, Command};
use crate::output::OutputMode;

mod doctor;
mod extract;
mod inspect;

pub fn dispatch(cli: Cli) -> Result<()> {
    let mode = OutputMode::from_flag(cli.json);
    match cli.command {
        Command::Extract { repo, build, db, plugin } => extract::run(mode, &repo, &build, &db, &plugin),
        Command::Inspect { db, summary, component } => {
            inspect::run(mode, &db, summary, component.as_deref())
        }
        Command::Doctor => doctor::run(mode),
    }
}
