//! cadence CLI entry point.

use std::process::ExitCode;

use cadence_core::{TracingConfig, init_tracing};
use cadence_store::FileStore;
use clap::Parser;

use cadence_cli::cli::{Cli, Command, ConfigAction, ExpandArgs, FilterArgs};
use cadence_cli::commands::{self, add, modify, query};
use cadence_cli::config::ClientConfig;
use cadence_cli::error::{ClientError, ClientResult};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ClientConfig::resolve(cli.config.as_deref()).map_err(ClientError::Config);
    let debug = match &config {
        Ok(config) => config.debug_enabled(cli.debug),
        Err(_) => cli.debug,
    };

    if let Err(e) = init_tracing(TracingConfig::cli(debug)) {
        eprintln!("warning: {}", e);
    }

    match config.and_then(|config| run(cli, &config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &ClientConfig) -> ClientResult<()> {
    let store_path = cli.store.as_deref();
    let open = || FileStore::open(config.store_config(store_path));
    let today = commands::today();

    let output = match cli.command {
        Some(Command::Add(args)) => add::run(&mut open()?, &args)?,
        Some(Command::Expand(args)) => query::expand(open()?.state(), config, &args, today)?,
        Some(Command::Layout(args)) => query::layout(open()?.state(), config, &args, today)?,
        Some(Command::Show(args)) => query::show(open()?.state(), config, &args, today)?,
        Some(Command::Edit(args)) => modify::edit(&mut open()?, config.expand_options(), &args)?,
        Some(Command::Delete(args)) => {
            modify::delete(&mut open()?, config.expand_options(), &args)?
        }
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(config)?,
            ConfigAction::Validate => commands::config::validate(config)?,
            ConfigAction::Path => commands::config::path(config, store_path)?,
        },
        None => {
            // Default behavior: the coming week
            let args = ExpandArgs {
                from: None,
                to: None,
                event: None,
                search: None,
                json: false,
                filters: FilterArgs::default(),
            };
            query::expand(open()?.state(), config, &args, today)?
        }
    };

    println!("{}", output);
    Ok(())
}
