//! StitchTrack CLI - operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Write SUPABASE_URL and SUPABASE_KEY from the environment into .env
//! st-cli env
//!
//! # List orders, optionally only one status
//! st-cli orders list --status stitching
//!
//! # Look up one order the way customers do
//! st-cli orders lookup --number 42
//! st-cli orders lookup --phone "555-1234"
//! ```
//!
//! # Commands
//!
//! - `env` - Generate the backend env file
//! - `orders list` - List orders, newest first
//! - `orders lookup` - Find one order by number or phone

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "st-cli")]
#[command(author, version, about = "StitchTrack CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the backend settings into an env file
    Env {
        /// File to write
        #[arg(short, long, default_value = ".env")]
        output: PathBuf,
    },
    /// Read orders from the backend
    Orders {
        #[command(subcommand)]
        action: OrdersAction,

        /// Admin email to sign in with (anon key when omitted)
        #[arg(long, env = "ST_ADMIN_EMAIL", global = true)]
        email: Option<String>,

        /// Admin password
        #[arg(long, env = "ST_ADMIN_PASSWORD", hide_env_values = true, global = true)]
        password: Option<String>,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// List orders, newest first
    List {
        /// Only show orders at this status
        #[arg(short, long)]
        status: Option<String>,
    },
    /// Find one order by number or phone
    #[command(group(ArgGroup::new("by").required(true).args(["number", "phone"])))]
    Lookup {
        /// Order number, with or without a leading `#`
        #[arg(short, long)]
        number: Option<String>,

        /// Phone number exactly as given at the counter
        #[arg(short, long)]
        phone: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Env { output } => commands::env::write_env_file(&output)?,
        Commands::Orders {
            action,
            email,
            password,
        } => {
            let credentials = commands::orders::Credentials::from_args(email, password)?;
            match action {
                OrdersAction::List { status } => {
                    commands::orders::list(credentials, status.as_deref()).await?;
                }
                OrdersAction::Lookup { number, phone } => {
                    commands::orders::lookup(credentials, number.as_deref(), phone.as_deref())
                        .await?;
                }
            }
        }
    }
    Ok(())
}
