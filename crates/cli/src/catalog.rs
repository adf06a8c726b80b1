//! `rdesk catalog` — list and (de)activate catalog products.

use clap::Subcommand;

use resortdesk_recon::normalize::format_cents;
use resortdesk_recon::ProductId;

use crate::exit_codes::EXIT_USAGE;
use crate::import::clip;
use crate::{CliError, Context};

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// List catalog products in id order
    #[command(after_help = "\
Examples:
  rdesk catalog list
  rdesk catalog list --all --json
  rdesk --db /srv/resort/catalog.db catalog list")]
    List {
        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,

        /// Include deactivated products
        #[arg(long)]
        all: bool,
    },

    /// Hide a product from matching and listing
    Deactivate {
        /// Product id
        id: ProductId,
    },

    /// Make a deactivated product matchable again
    Activate {
        /// Product id
        id: ProductId,
    },
}

pub fn cmd_catalog(cmd: CatalogCommands, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        CatalogCommands::List { json, all } => cmd_list(json, all, ctx),
        CatalogCommands::Deactivate { id } => cmd_set_active(id, false, ctx),
        CatalogCommands::Activate { id } => cmd_set_active(id, true, ctx),
    }
}

fn cmd_list(json: bool, all: bool, ctx: &Context) -> Result<(), CliError> {
    let catalog = ctx.open_catalog()?;
    let products = catalog.list_products(all).map_err(CliError::store)?;

    if json {
        let out = serde_json::to_string_pretty(&products)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{out}");
        return Ok(());
    }

    println!("{:>6}  {:<32} {:>10} {:>10}  GROUP", "ID", "NAME", "PURCHASE", "SALE");
    for p in &products {
        let mut group = p.group_name.clone().unwrap_or_default();
        if !p.product.active {
            group.push_str(" (inactive)");
        }
        println!(
            "{:>6}  {:<32} {:>10} {:>10}  {}",
            p.product.id,
            clip(&p.product.name, 32),
            format_cents(p.product.purchase_cents),
            format_cents(p.product.sale_cents),
            group.trim_start(),
        );
    }
    eprintln!("{} products", products.len());
    Ok(())
}

fn cmd_set_active(id: ProductId, active: bool, ctx: &Context) -> Result<(), CliError> {
    let catalog = ctx.open_catalog()?;
    if !catalog.set_active(id, active).map_err(CliError::store)? {
        return Err(CliError::new(EXIT_USAGE, format!("product {id} not found"))
            .with_hint("list ids with `rdesk catalog list --all`"));
    }
    tracing::info!(id, active, "product activation changed");
    eprintln!("product {id} {}", if active { "activated" } else { "deactivated" });
    Ok(())
}
