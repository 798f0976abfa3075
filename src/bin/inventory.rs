//! `inventory`: operate on an inventory file from the command line.
//!
//! Every command goes through the same handlers a web front end would use and
//! prints the `{isOk, data, error}` envelope on stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use inventory_store::api::{self, Method};
use inventory_store::{CorruptPolicy, InventoryStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{fmt, EnvFilter};

/// Inventory item store
#[derive(Parser, Debug)]
#[command(name = "inventory")]
#[command(about = "Create, list, update and remove inventory items in a JSON file")]
#[command(version)]
struct Args {
    /// Path to the JSON document
    #[arg(short, long, default_value = "db.json")]
    db: PathBuf,

    /// Write compact JSON instead of indented
    #[arg(long)]
    compact: bool,

    /// If the file is corrupt, move it aside and start empty
    #[arg(long)]
    reset_corrupt: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every item
    List,
    /// Add an item, e.g. '{"item_id":"sku-1","item_name":"Bolt"}'
    Add {
        /// Item as a JSON object
        json: String,
    },
    /// Merge fields into an existing item
    Update {
        /// backendId of the item
        backend_id: String,
        /// Fields to set, as a JSON object
        json: String,
    },
    /// Delete an item
    Remove {
        /// backendId of the item
        backend_id: String,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let policy = if args.reset_corrupt {
        CorruptPolicy::Reset
    } else {
        CorruptPolicy::Fail
    };
    let store = match InventoryStore::builder(&args.db)
        .pretty(!args.compact)
        .on_corrupt(policy)
        .build()
    {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (method, path, body) = match args.command {
        Command::List => (Method::Get, api::ITEMS_ROUTE.to_string(), String::new()),
        Command::Add { json } => (Method::Post, api::ITEMS_ROUTE.to_string(), json),
        Command::Update { backend_id, json } => (
            Method::Put,
            format!("{}/{backend_id}", api::ITEMS_ROUTE),
            json,
        ),
        Command::Remove { backend_id } => (
            Method::Delete,
            format!("{}/{backend_id}", api::ITEMS_ROUTE),
            String::new(),
        ),
    };

    let Some(reply) = api::handle(&store, method, &path, body.as_bytes()) else {
        tracing::error!("No handler for {}", path);
        return ExitCode::FAILURE;
    };
    println!("{}", reply.body_json());

    if reply.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
