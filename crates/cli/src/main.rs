//! WooCommerce ⇄ CiviCRM CLI - one-shot runs of the sync operations.
//!
//! # Usage
//!
//! ```bash
//! # Build the Contribution params for an order (optionally seeded with params)
//! woo-civi order-params 1042 --params '{"contact_id": 7}'
//!
//! # List the Line Items of a Contribution
//! woo-civi line-items 311
//!
//! # Read or store a product's Financial Type
//! woo-civi financial-type get 55
//! woo-civi financial-type set 55 3
//!
//! # Push a billing email across
//! woo-civi push-email to-civicrm --user 12
//! woo-civi push-email to-woocommerce --contact 7 --location-type 5 --email a@example.org
//! ```
//!
//! Configuration comes from the same environment variables as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use woo_civi_core::{
    ContactId, ContributionId, FinancialTypeId, LocationTypeId, OrderId, ProductId, UserId,
};

mod commands;

#[derive(Parser)]
#[command(name = "woo-civi")]
#[command(author, version, about = "WooCommerce to CiviCRM sync tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build CiviCRM Contribution params from a WooCommerce order
    OrderParams {
        /// WooCommerce order id
        order_id: OrderId,

        /// Initial params as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
    /// List the Line Items of a CiviCRM Contribution
    LineItems {
        /// CiviCRM Contribution id
        contribution_id: ContributionId,
    },
    /// Read or store a product's Financial Type
    FinancialType {
        #[command(subcommand)]
        action: FinancialTypeAction,
    },
    /// Push a billing email from one system to the other
    PushEmail {
        #[command(subcommand)]
        direction: PushDirection,
    },
}

#[derive(Subcommand)]
enum FinancialTypeAction {
    /// Print the product's Financial Type setting
    Get {
        /// WooCommerce product id
        product_id: ProductId,
    },
    /// Store a Financial Type id on the product
    Set {
        /// WooCommerce product id
        product_id: ProductId,
        /// CiviCRM Financial Type id
        financial_type_id: FinancialTypeId,
    },
}

#[derive(Subcommand)]
enum PushDirection {
    /// Send a WordPress user's billing email to their CiviCRM Contact
    ToCivicrm {
        /// WordPress user id
        #[arg(short, long)]
        user: UserId,
    },
    /// Replay a CiviCRM Email edit onto the linked WordPress user
    ToWoocommerce {
        /// CiviCRM Contact id
        #[arg(short, long)]
        contact: ContactId,

        /// CiviCRM location type id of the Email
        #[arg(short, long)]
        location_type: LocationTypeId,

        /// Email address
        #[arg(short, long)]
        email: String,
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
    let ctx = commands::Context::from_env()?;

    match cli.command {
        Commands::OrderParams { order_id, params } => {
            commands::contributions::order_params(&ctx, order_id, &params).await?;
        }
        Commands::LineItems { contribution_id } => {
            commands::contributions::line_items(&ctx, contribution_id).await?;
        }
        Commands::FinancialType { action } => match action {
            FinancialTypeAction::Get { product_id } => {
                commands::products::get(&ctx, product_id).await?;
            }
            FinancialTypeAction::Set {
                product_id,
                financial_type_id,
            } => {
                commands::products::set(&ctx, product_id, financial_type_id).await?;
            }
        },
        Commands::PushEmail { direction } => match direction {
            PushDirection::ToCivicrm { user } => {
                commands::email::to_civicrm(&ctx, user).await?;
            }
            PushDirection::ToWoocommerce {
                contact,
                location_type,
                email,
            } => {
                commands::email::to_woocommerce(&ctx, contact, location_type, &email).await?;
            }
        },
    }
    Ok(())
}
