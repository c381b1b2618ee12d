use clap::Parser;
use tracing::{debug, error};

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod logging;
mod services;
mod ui;

use cli::{Cli, Commands};
use commands::{deploy, login, project, version};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let settings = cli.settings();

    // Only deploy output is timestamped
    let timestamps = matches!(cli.command, Commands::Deploy { .. });
    logging::init(settings.verbose, timestamps);

    let result = match cli.command {
        Commands::Deploy { environment } => deploy::execute(&settings, environment).await,
        Commands::Login { email, password } => login::execute(&settings, email, password).await,
        Commands::Project {
            environment,
            project,
        } => project::execute(&settings, environment, project).await,
        Commands::Version => version::execute(),
    };

    if let Err(e) = result {
        debug!("{:?}", e);
        error!("{}", e);
        std::process::exit(1);
    }
}
