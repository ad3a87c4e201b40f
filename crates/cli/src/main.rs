//! Customer Accounts CLI - Database migrations and broker tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! ca-cli migrate
//!
//! # Publish a loan limit adjustment event
//! ca-cli publish-adjustment --customer-id 17 --adjustment subtraction --loan-id 301
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `publish-adjustment` - Send one adjustment event to the broker

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use customer_accounts_core::AdjustmentDirection;

mod commands;

#[derive(Parser)]
#[command(name = "ca-cli")]
#[command(author, version, about = "Customer Accounts CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Publish a loan limit adjustment event
    PublishAdjustment {
        /// Customer whose available limit is adjusted
        #[arg(short, long)]
        customer_id: i64,

        /// `addition` or `subtraction`
        #[arg(short, long, value_parser = parse_direction)]
        adjustment: AdjustmentDirection,

        /// Loan that triggered the adjustment
        #[arg(short, long)]
        loan_id: Option<i64>,
    },
}

fn parse_direction(value: &str) -> Result<AdjustmentDirection, String> {
    AdjustmentDirection::from_keyword(value)
        .ok_or_else(|| format!("expected `addition` or `subtraction`, got `{value}`"))
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
        Commands::Migrate => commands::migrate::run().await?,
        Commands::PublishAdjustment {
            customer_id,
            adjustment,
            loan_id,
        } => commands::publish::adjustment(customer_id, adjustment, loan_id).await?,
    }
    Ok(())
}
