use clap::Parser;
use std::process;

use gh_release::{Result, actions, cli, command};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("gh_release")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli_args = cli::Args::parse();

    initialize_logger(cli_args.debug_enabled())?;

    let runtime = command::runtime()?;

    if let Err(err) = runtime.block_on(command::execute(&cli_args)) {
        actions::set_failed(&format!(
            "Failed to create the new release: {err}"
        ));
        process::exit(1);
    }

    Ok(())
}
