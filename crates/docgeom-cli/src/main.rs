use clap::Parser;
use std::process::ExitCode;
use tracing::info;

use docgeom_cli::{
    cli::{Cli, Commands},
    commands,
    logging,
};
use docgeom_config::ConfigLoader;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(config_path) = cli.config.as_deref() else {
        println!("You must specify a config file (-c <file>)");
        return ExitCode::FAILURE;
    };

    let config = match ConfigLoader::load_from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Error loading docgeom config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = logging::resolve_level(cli.requested_level(), config.log_level.as_deref());
    if let Err(e) = logging::init(level, config.logfile.as_deref()) {
        println!("Error initializing docgeom logging: {:#}", e);
        return ExitCode::FAILURE;
    }
    info!(config = %config_path.display(), "Loaded configuration");

    match cli.command {
        Commands::Run(args) => match commands::run::execute(&config, &args).await {
            // Mid-run failures are logged, not signalled
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %format!("{:#}", e), "Initialization failed");
                println!("Error initializing docgeom: {:#}", e);
                ExitCode::FAILURE
            }
        },
    }
}
