use autoinject_instrumentation::profile::RuntimeProfile;
use clap::Parser;
use config::{Cli, Commands};
use error::CliResult;
use schemars::schema_for;

mod config;
mod error;
mod inject;
mod input;
mod logging;
mod target_hash;

fn print_schema() -> CliResult<()> {
    let schema = schema_for!(RuntimeProfile);
    println!("{}", serde_json::to_string_pretty(&schema)?);

    Ok(())
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    logging::init_tracing_registry();

    match cli.commands {
        Commands::Inject(args) => inject::inject(&args)?,
        Commands::TargetHash(args) => target_hash::print_hash(&args)?,
        Commands::Schema => print_schema()?,
    }

    Ok(())
}
