//! CLI definitions for flight
//!
//! This module contains all CLI argument parsing structures using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(
    name = "flight",
    version,
    about = "Deploy applications to flight",
    long_about = "Packages the application described by flight.yml, uploads it and\nfollows the deployment until it completes or fails."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the .flight work directory (defaults to home)
    #[arg(long, global = true, env = "FLIGHT_WORK_PATH")]
    pub work_path: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true, env = "FLIGHT_API_URL")]
    pub api_url: Option<String>,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            work_path: self.work_path.clone(),
            api_url: self.api_url.clone(),
            verbose: self.verbose,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy the current project to an environment
    Deploy {
        /// Target environment, as named in flight.yml
        #[arg(short, long)]
        environment: String,
    },

    /// Log in and select an organisation
    Login {
        /// Account email
        #[arg(short, long)]
        email: String,

        /// Account password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show a project deployed in the selected organisation
    Project {
        /// Environment the project lives in
        #[arg(short, long)]
        environment: String,

        /// Project name
        #[arg(short, long)]
        project: String,
    },

    /// Print the flight version
    Version,
}
