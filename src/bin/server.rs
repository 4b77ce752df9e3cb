//! votekv Server Binary
//!
//! Serves the vote ledger over HTTP.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use votekv::network::Server;
use votekv::{
    parse_seed_item, Catalog, ChangeNotifier, Config, Coordinator, LedgerStore, RetryPolicy,
    UnknownItemPolicy,
};

/// votekv Server
#[derive(Parser, Debug)]
#[command(name = "votekv-server")]
#[command(about = "Live vote tallies over a concurrent ledger")]
#[command(version)]
struct Args {
    /// Catalog file
    #[arg(short, long, default_value = "./public/data/cars.csv")]
    data_file: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:3000")]
    listen: String,

    /// Lock acquisition retries before answering busy
    #[arg(long, default_value = "5")]
    lock_retries: u32,

    /// Delay between lock attempts in milliseconds
    #[arg(long, default_value = "100")]
    lock_delay_ms: u64,

    /// Origin allowed by CORS
    #[arg(long, default_value = "http://localhost:4200")]
    cors_origin: String,

    /// Answer 404 for votes on unknown ids instead of persisting unchanged
    #[arg(long)]
    reject_unknown: bool,

    /// Create the catalog with these items (ID=IMAGE) if it does not exist
    #[arg(long, value_name = "ID=IMAGE", num_args = 1..)]
    seed: Vec<String>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,votekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("votekv Server v{}", votekv::VERSION);
    tracing::info!("Catalog file: {}", args.data_file);
    tracing::info!("Listen address: {}", args.listen);

    let policy = if args.reject_unknown {
        UnknownItemPolicy::Reject
    } else {
        UnknownItemPolicy::Persist
    };

    // Build config from args
    let config = Config::builder()
        .data_file(&args.data_file)
        .listen_addr(&args.listen)
        .lock_retry(RetryPolicy::new(
            args.lock_retries,
            Duration::from_millis(args.lock_delay_ms),
        ))
        .cors_origin(&args.cors_origin)
        .unknown_item_policy(policy)
        .build();

    let store = match LedgerStore::open(&config) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to open ledger: {}", e);
            std::process::exit(1);
        }
    };

    if !args.seed.is_empty() {
        if let Err(e) = seed(&store, &args.seed) {
            tracing::error!("Failed to seed catalog: {}", e);
            std::process::exit(1);
        }
    }

    let notifier = ChangeNotifier::new(config.observer_capacity);
    let coordinator = Arc::new(Coordinator::new(store, notifier));

    // Start server
    let server = Server::new(config, coordinator);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

fn seed(store: &LedgerStore, specs: &[String]) -> votekv::Result<()> {
    let items = specs
        .iter()
        .map(|entry| parse_seed_item(entry))
        .collect::<votekv::Result<Vec<_>>>()?;

    if !store.initialize(&Catalog::new(items)?)? {
        tracing::info!("Catalog already exists; seed ignored");
    }
    Ok(())
}
