pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "staffctl")]
#[command(about = "Admin CLI for the staff provisioning service")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "STAFF_API_URL",
        default_value = "http://localhost:3000",
        help = "Base URL of the provisioning service"
    )]
    pub url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create a staff account (requires an admin token)")]
    Provision(commands::provision::ProvisionArgs),

    #[command(about = "Generate passwords using the service's password policy")]
    Password {
        #[arg(long, default_value_t = 1, help = "How many passwords to print")]
        count: usize,
    },

    #[command(about = "Check service health from the /health endpoint")]
    Health,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Provision(args) => commands::provision::handle(&cli.url, args, output_format).await,
        Commands::Password { count } => commands::password::handle(count, output_format),
        Commands::Health => commands::health::handle(&cli.url, output_format).await,
    }
}
