//! devsnap CLI Binary

use anyhow::Context;
use clap::Parser;
use devsnap::logging::init_logging;
use devsnap::tooling::cli::{Cli, CliContext};
use std::process;

fn run(cli: &Cli) -> anyhow::Result<CliContext> {
    let config = cli.load_config().context("loading configuration")?;
    let logging = config.logging.clone().with_overrides(&cli.logging_overrides());
    init_logging(Some(&logging)).context("initializing logging")?;
    CliContext::new(config, cli.project.clone(), cli.non_interactive)
        .context("opening devsnap store")
}

fn main() {
    let cli = Cli::parse();

    let context = match run(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
