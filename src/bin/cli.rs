//! votekv CLI
//!
//! Works directly on a catalog file, taking the same exclusive lock as a
//! running server.

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use votekv::{
    parse_seed_item, Catalog, ChangeNotifier, Config, Coordinator, LedgerStore, RequestError,
    RetryPolicy,
};

/// Exit code for a busy ledger (EX_TEMPFAIL)
const EXIT_BUSY: u8 = 75;

/// votekv CLI
#[derive(Parser, Debug)]
#[command(name = "votekv-cli")]
#[command(about = "CLI for the votekv ledger")]
struct Args {
    /// Catalog file
    #[arg(short, long, default_value = "./public/data/cars.csv")]
    data_file: String,

    /// Lock acquisition retries
    #[arg(long, default_value = "5")]
    lock_retries: u32,

    /// Delay between lock attempts in milliseconds
    #[arg(long, default_value = "100")]
    lock_delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the current tallies
    List,

    /// Cast one vote
    Vote {
        /// The item id to vote for
        id: String,
    },

    /// Create the catalog if it does not exist
    Init {
        /// Items as ID=IMAGE
        #[arg(required = true)]
        items: Vec<String>,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let config = Config::builder()
        .data_file(&args.data_file)
        .lock_retry(RetryPolicy::new(
            args.lock_retries,
            Duration::from_millis(args.lock_delay_ms),
        ))
        .build();

    let store = match LedgerStore::open(&config) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.command {
        Commands::Init { items } => init(&store, &items),
        Commands::List => {
            let coordinator = Coordinator::new(store, ChangeNotifier::default());
            finish(coordinator.handle_read_request().map(|catalog| print_catalog(&catalog)))
        }
        Commands::Vote { id } => {
            let coordinator = Coordinator::new(store, ChangeNotifier::default());
            finish(coordinator.handle_vote_request(&id).map(|catalog| {
                println!("Voted for '{}'", id);
                print_catalog(&catalog);
            }))
        }
    }
}

fn init(store: &LedgerStore, specs: &[String]) -> ExitCode {
    let catalog = specs
        .iter()
        .map(|entry| parse_seed_item(entry))
        .collect::<votekv::Result<Vec<_>>>()
        .and_then(Catalog::new);

    let written = catalog.and_then(|catalog| store.initialize(&catalog));
    match written {
        Ok(true) => {
            println!("Created {}", store.path().display());
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("{} already exists; left unchanged", store.path().display());
            ExitCode::SUCCESS
        }
        Err(e) if e.is_busy() => {
            eprintln!("busy: {}", e);
            ExitCode::from(EXIT_BUSY)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn finish(result: Result<(), RequestError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_busy() => {
            eprintln!("busy: {}", e);
            ExitCode::from(EXIT_BUSY)
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_catalog(catalog: &Catalog) {
    let max = catalog.max_votes();
    let width = catalog.iter().map(|item| item.id.len()).max().unwrap_or(2).max(2);

    println!("{:<width$}  {:>6}  IMAGE", "ID", "VOTES", width = width);
    for item in catalog {
        let marker = if max > 0 && item.votes == max { " *" } else { "" };
        println!(
            "{:<width$}  {:>6}  {}{}",
            item.id,
            item.votes,
            item.image_ref,
            marker,
            width = width
        );
    }
    println!("total: {}", catalog.total_votes());
}
