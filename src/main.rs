//! Collector's Vault - command-line front end
//!
//! Search the card catalog, see which results are worth keeping, and manage
//! a persisted collection with its total market value.

use clap::{Parser, Subcommand, ValueEnum};
use collectors_vault::price::format_price;
use collectors_vault::{
    CatalogClient, CollectionStore, Config, DebouncedSuggestions, FileStore, KeyValueStore,
    NameTaxonomy, SearchOptions, SearchSession, SortOrder, SqliteStore, StorageResult,
    SuggestionProvider,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Search trading cards by value and track your collection
#[derive(Parser, Debug)]
#[command(name = "collectors_vault")]
#[command(version, about, long_about = None)]
struct Args {
    /// Directory holding the collection (default: ~/.local/share/collectors_vault)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Where the collection is stored
    #[arg(long, value_enum, default_value_t = Backend::Json, global = true)]
    storage: Backend,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search cards whose name starts with QUERY and show the valuable ones
    Search {
        #[arg(required = true)]
        query: Vec<String>,

        /// Minimum market price to show (default: 5.00)
        #[arg(long)]
        min_value: Option<f64>,

        /// Order results by market price, most valuable first
        #[arg(long, default_value_t = false)]
        sort: bool,

        /// Add (or remove, if owned) these result ids to the collection
        #[arg(long = "toggle")]
        toggle: Vec<String>,
    },
    /// Suggest card names for a partial input
    Suggest {
        prefix: String,

        /// Ask the card catalog instead of the cached name list
        #[arg(long, default_value_t = false)]
        remote: bool,
    },
    /// Add a card to the collection by catalog id
    Add { id: String },
    /// Remove a card from the collection by catalog id
    Remove { id: String },
    /// List the collection and its total value
    Collection,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    Json,
    Sqlite,
}

type Store = CollectionStore<Box<dyn KeyValueStore>>;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::new();
    if let Some(dir) = args.data_dir.clone() {
        config.data_dir = dir;
    }

    log::debug!("Data directory: {}", config.data_dir.display());

    let client = match CatalogClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            log::error!("Failed to create catalog client: {}", e);
            std::process::exit(1);
        }
    };

    let mut store = match open_store(args.storage, &config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to open collection: {}", e);
            std::process::exit(1);
        }
    };

    let result = match args.command {
        Command::Search {
            query,
            min_value,
            sort,
            toggle,
        } => {
            let min_value = min_value.unwrap_or(config.min_value);
            let client = client.with_options(SearchOptions {
                sort: sort.then_some(SortOrder::MarketPriceDesc),
                select: None,
            });
            run_search(&client, &mut store, &query.join(" "), min_value, &toggle).await
        }
        Command::Suggest { prefix, remote } => {
            if remote {
                run_suggest(Arc::new(client), &config, &prefix).await;
            } else {
                match NameTaxonomy::new(&config) {
                    Ok(taxonomy) => run_suggest(Arc::new(taxonomy), &config, &prefix).await,
                    Err(e) => log::error!("Failed to create taxonomy client: {}", e),
                }
            }
            Ok(())
        }
        Command::Add { id } => run_add(&client, &mut store, &id).await,
        Command::Remove { id } => match store.remove(&id) {
            Ok(true) => {
                println!("Removed {} from the collection.", id);
                Ok(())
            }
            Ok(false) => {
                println!("{} is not in the collection.", id);
                Ok(())
            }
            Err(e) => Err(e),
        },
        Command::Collection => {
            print_collection(&store);
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("Failed to update collection: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = store.close() {
        log::error!("Failed to save collection: {}", e);
        std::process::exit(1);
    }
}

fn open_store(backend: Backend, data_dir: &Path) -> StorageResult<Store> {
    let backend: Box<dyn KeyValueStore> = match backend {
        Backend::Json => Box::new(FileStore::new(data_dir)?),
        Backend::Sqlite => Box::new(SqliteStore::open(&data_dir.join("collection.db"))?),
    };
    CollectionStore::open(backend)
}

/// Run one search through the session, apply toggles, print the rows
async fn run_search(
    client: &CatalogClient,
    store: &mut Store,
    query: &str,
    min_value: f64,
    toggle: &[String],
) -> StorageResult<()> {
    let mut session = SearchSession::new(min_value);
    session.set_query(query);

    if !session.submit_and_search(client).await {
        println!("Nothing to search for.");
        return Ok(());
    }

    if let Some(message) = session.message() {
        println!("{}", message);
        return Ok(());
    }

    for id in toggle {
        match session.toggle(store, id)? {
            Some(true) => println!("Added {} to the collection.", id),
            Some(false) => println!("Removed {} from the collection.", id),
            None => println!("{} is not among the results.", id),
        }
    }

    for row in session.result_rows(store) {
        println!(
            "{} {:<14} {:<28} {:<28} {:>10}",
            if row.owned { "[owned]" } else { "[     ]" },
            row.card.id,
            row.card.name,
            row.card.set.name,
            format_price(row.price)
        );
    }
    println!(
        "{} cards worth at least ${:.2}",
        session.results().len(),
        min_value
    );
    Ok(())
}

/// Look up suggestions through the debouncer and show them the way the
/// dropdown would
async fn run_suggest<P>(provider: Arc<P>, config: &Config, prefix: &str)
where
    P: SuggestionProvider + 'static,
{
    let mut session = SearchSession::new(config.min_value);
    let Some(query) = session.set_query(prefix) else {
        println!("Type at least 2 characters for suggestions.");
        return;
    };

    let (mut debouncer, mut updates) = DebouncedSuggestions::new(provider, config.debounce);
    debouncer.schedule(&query);

    if let Some(update) = updates.recv().await {
        session.apply_suggestions(&update.query, update.result);
    }

    if !session.suggestions_open() {
        println!("Suggestions are unavailable right now.");
    } else if session.suggestions().is_empty() {
        println!("No suggestions found");
    } else {
        for name in session.suggestions() {
            println!("{}", name);
        }
    }
}

async fn run_add(client: &CatalogClient, store: &mut Store, id: &str) -> StorageResult<()> {
    let card = match client.get_card(id).await {
        Ok(card) => card,
        Err(e) if e.is_rate_limited() => {
            println!("Too many requests. Please wait a moment before trying again.");
            return Ok(());
        }
        Err(e) => {
            println!("Failed to fetch card {}. ({})", id, e);
            return Ok(());
        }
    };

    if store.add(card.clone())? {
        println!(
            "Added {} ({}) at {}.",
            card.name,
            card.id,
            format_price(collectors_vault::market_price(&card))
        );
    } else {
        println!("{} is already in the collection.", card.id);
    }
    Ok(())
}

fn print_collection(store: &Store) {
    if store.is_empty() {
        println!("Your collection is empty. Search for cards to add them.");
        return;
    }

    for card in store.cards() {
        println!(
            "{:<14} {:<28} {:<28} {:>10}",
            card.id,
            card.name,
            card.set.name,
            format_price(collectors_vault::market_price(card))
        );
    }
    println!(
        "Total value: ${:.2} ({} cards)",
        store.total_value(),
        store.len()
    );
}
