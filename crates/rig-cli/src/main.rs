use anyhow::Result;
use clap::Parser;

mod args;
mod cmd;
mod output;

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = args::Cli::parse();
    let mode = output::OutputMode::from_flag(cli.json);

    if let Err(err) = cmd::dispatch(cli) {
        match err.downcast_ref::<rig_core::RigError>() {
            Some(rig_err) => output::print_error(mode, rig_err),
            None => output::print_error(mode, &serde_json::json!({ "kind": "Cli", "message": err.to_string() })),
        }
        std::process::exit(1);
    }
    Ok(())
}
