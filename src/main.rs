mod cli;
mod download;
mod history;
mod reading;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli, Commands, Settings};
use log::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = cli.settings();

    match &cli.command {
        Commands::Climate {} => report(command::climate(&settings).await),
        Commands::Hdd {} => report(command::hdd(&settings).await),
        Commands::Storage {} => report(command::storage(&settings).await),
        Commands::All {} => run_all(&settings).await,
        Commands::Summary {} => match command::summary(&settings) {
            Ok(text) => print!("{}", text),
            Err(e) => error!("Error: {:#}", e),
        },
    }

    Ok(())
}

/// Runs every collector in turn. A failing collector does not stop the others.
async fn run_all(settings: &Settings) {
    report(command::climate(settings).await);
    report(command::hdd(settings).await);
    report(command::storage(settings).await);
}

fn report(result: Result<command::Outcome>) {
    match result {
        Ok(outcome) => println!("{}", outcome),
        Err(e) => error!("Error: {:#}", e),
    }
}
