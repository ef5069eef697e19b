//! Quote Keeper - keep, filter, export and sync a list of quotes.
//!
//! Quotes live in a local `SQLite` key-value store and are reconciled with a
//! remote JSON endpoint on demand or on a timer.
//!
//! QUICK START:
//!   quote-keeper show                    # Random quote from the selected category
//!   quote-keeper add "Be kind" Life      # Add a quote
//!   quote-keeper filter Life             # Only show Life quotes ("all" resets)
//!   quote-keeper export -o quotes.json   # Save every quote as JSON
//!   quote-keeper sync                    # Merge the remote snapshot once
//!   quote-keeper shell                   # Interactive session with background sync

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::Parser;
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_categories, format_notification, format_quote, format_quotes, format_status,
    lock_store, OutputFormat, QuoteStore, SharedStore, StoreStatus, SyncOutcome, SyncService,
};
use cli::{parse_shell_command, Cli, Commands, ShellCommand, SHELL_HELP};
use domain::{AppConfig, AppError, Notification};
use infrastructure::{
    config_file_path, ensure_config_exists, load_config, load_config_from_file, save_config,
    HttpRemote, LocalStorage, MemoryStorage,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(cli: Cli) -> domain::Result<()> {
    let format = cli
        .output_format()
        .map_err(|e| AppError::Config { message: e })?;

    let (mut config, config_path) = match &cli.config {
        Some(path) => (load_config_from_file(path)?, path.clone()),
        None => (load_config()?, config_file_path()),
    };
    if let Some(endpoint) = cli.endpoint {
        config.sync.endpoint = endpoint;
    }

    if let Commands::Config { init, save } = cli.command {
        return cmd_config(&config, &config_path, init, save);
    }

    let store = open_store(&config)?;

    match cli.command {
        Commands::Show { fresh } => cmd_show(&store, fresh),
        Commands::Add {
            text,
            category,
            sync,
        } => cmd_add(&store, &config, &text, &category, sync).await?,
        Commands::List => cmd_list(&store, format)?,
        Commands::Categories => cmd_categories(&store, format)?,
        Commands::Filter { category } => cmd_filter(&store, &category),
        Commands::Export { output, stdout } => cmd_export(&store, &output, stdout)?,
        Commands::Import { file } => cmd_import(&store, &file)?,
        Commands::Sync => cmd_sync(&store, &config).await,
        Commands::Watch => cmd_watch(store, &config).await?,
        Commands::Status => cmd_status(&store, &config)?,
        Commands::Shell => cmd_shell(store, &config).await?,
        Commands::Config { .. } => {}
    }

    Ok(())
}

/// Open the durable store; the session slot lives for this process only.
fn open_store(config: &AppConfig) -> domain::Result<SharedStore> {
    let storage = LocalStorage::open(&config.storage_db_path())?;
    let store = QuoteStore::open(Box::new(storage), Box::new(MemoryStorage::new()));
    Ok(Arc::new(Mutex::new(store)))
}

fn sync_service(store: SharedStore, config: &AppConfig) -> SyncService {
    let remote = Arc::new(HttpRemote::new(config.sync.endpoint.clone()));
    tracing::debug!(endpoint = remote.endpoint(), "Remote configured");
    SyncService::new(store, remote, config.sync.clone())
}

/// Show a random quote command.
fn cmd_show(store: &SharedStore, fresh: bool) {
    let mut store = lock_store(store);
    let picked = if fresh {
        store.pick_fresh()
    } else {
        store.pick_random()
    };

    match picked {
        Some(quote) => println!("{}", format_quote(&quote)),
        None if store.is_empty() => println!("No quotes available."),
        None => println!("No quotes in category '{}'.", store.filter()),
    }
}

/// Add a quote command.
async fn cmd_add(
    store: &SharedStore,
    config: &AppConfig,
    text: &str,
    category: &str,
    sync: bool,
) -> domain::Result<()> {
    let quote = lock_store(store).add(text, category)?;

    println!("{} New quote added!", "✓".green().bold());
    println!("{}", format_quote(&quote));

    let service = sync_service(Arc::clone(store), config);
    let outcome = if sync {
        Some(service.sync_now().await)
    } else {
        service.sync_after_add().await
    };
    if let Some(outcome) = outcome {
        print_outcome(&outcome);
    }

    Ok(())
}

/// List quotes command.
fn cmd_list(store: &SharedStore, format: OutputFormat) -> domain::Result<()> {
    let store = lock_store(store);
    let output = format_quotes(&store.filtered(), format).map_err(AppError::json_parse)?;
    println!("{output}");
    Ok(())
}

/// List categories command.
fn cmd_categories(store: &SharedStore, format: OutputFormat) -> domain::Result<()> {
    let store = lock_store(store);
    let categories = store.categories();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&categories).map_err(AppError::json_parse)?;
            println!("{json}");
        }
        OutputFormat::Text | OutputFormat::Table => {
            println!("{}", format_categories(&categories, store.filter()));
        }
    }

    Ok(())
}

/// Select category command.
fn cmd_filter(store: &SharedStore, category: &str) {
    let mut store = lock_store(store);
    store.set_filter(category.trim());

    println!(
        "{} Filter set to '{}' ({} quotes)",
        "✓".green().bold(),
        store.filter().cyan(),
        store.filtered().len()
    );
}

/// Export quotes command.
fn cmd_export(store: &SharedStore, output: &Path, stdout: bool) -> domain::Result<()> {
    let store = lock_store(store);
    let content = store.export_all()?;

    if stdout {
        println!("{}", String::from_utf8_lossy(&content));
        return Ok(());
    }

    let mut file = std::fs::File::create(output)
        .map_err(|e| AppError::io(format!("Failed to create {}", output.display()), e))?;
    file.write_all(&content)
        .map_err(|e| AppError::io("Failed to write file", e))?;

    println!(
        "{} Exported {} quotes to {}",
        "✓".green().bold(),
        store.len(),
        output.display()
    );

    Ok(())
}

/// Import quotes command.
fn cmd_import(store: &SharedStore, file: &Path) -> domain::Result<()> {
    let content = std::fs::read_to_string(file)
        .map_err(|e| AppError::io(format!("Failed to read {}", file.display()), e))?;

    let count = lock_store(store).import_json(&content)?;

    println!(
        "{} Imported {} quotes from {}",
        "✓".green().bold(),
        count,
        file.display()
    );

    Ok(())
}

/// One-shot sync command. A failed sync is reported, not fatal.
async fn cmd_sync(store: &SharedStore, config: &AppConfig) {
    let service = sync_service(Arc::clone(store), config);
    print_outcome(&service.sync_now().await);
}

fn print_outcome(outcome: &SyncOutcome) {
    let notification = match outcome {
        SyncOutcome::Synced(summary) => Notification::synced(summary.added, summary.after),
        SyncOutcome::Failed(e) => Notification::offline(e),
        SyncOutcome::Skipped => {
            println!("Sync already in progress");
            return;
        }
    };
    println!("{}", format_notification(&notification));
}

/// Periodic sync until Ctrl-C.
async fn cmd_watch(store: SharedStore, config: &AppConfig) -> domain::Result<()> {
    if !config.sync.enabled {
        println!("Periodic sync is disabled in the configuration ([sync] enabled = false)");
        return Ok(());
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let service = Arc::new(sync_service(store, config).with_notifier(tx));
    let ticker = service.spawn_periodic();

    println!(
        "🔄 Syncing with {} every {}s (Ctrl-C to stop)",
        config.sync.endpoint, config.sync.interval_secs
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(notification) = rx.recv() => {
                println!("{}", format_notification(&notification));
            }
            result = &mut shutdown => {
                result.map_err(|e| AppError::io("Failed to listen for Ctrl-C", e))?;
                break;
            }
        }
    }

    ticker.abort();
    tracing::info!("Watch stopped");
    Ok(())
}

/// Show status command.
fn cmd_status(store: &SharedStore, config: &AppConfig) -> domain::Result<()> {
    let status = store_status(store, config)?;
    println!("{}", format_status(&status, None));

    Ok(())
}

fn store_status(store: &SharedStore, config: &AppConfig) -> domain::Result<StoreStatus> {
    let db_path = config.storage_db_path();
    let storage = LocalStorage::open(&db_path)?;

    let store = lock_store(store);
    Ok(StoreStatus {
        quote_count: store.len(),
        visible_count: store.filtered().len(),
        category_count: store.categories().len() - 1,
        filter: store.filter().to_string(),
        storage_path: db_path.display().to_string(),
        storage_bytes: storage.storage_size()?,
        slots: storage.keys()?,
        endpoint: config.sync.endpoint.clone(),
    })
}

/// Show or write configuration command.
fn cmd_config(config: &AppConfig, path: &Path, init: bool, save: bool) -> domain::Result<()> {
    if init {
        if ensure_config_exists(path)? {
            println!("{} Created {}", "✓".green().bold(), path.display());
        } else {
            println!("Config already exists at {}", path.display());
        }
        return Ok(());
    }

    if save {
        save_config(config, path)?;
        println!("{} Saved {}", "✓".green().bold(), path.display());
        return Ok(());
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    println!("# {}", path.display());
    println!("{content}");

    Ok(())
}

/// Interactive session command.
async fn cmd_shell(store: SharedStore, config: &AppConfig) -> domain::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let service = Arc::new(sync_service(Arc::clone(&store), config).with_notifier(tx));
    let ticker = config.sync.enabled.then(|| service.spawn_periodic());

    println!("{}", "💬 Quote Keeper shell - type 'help' for commands".bold());
    cmd_show(&store, false);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();

        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| AppError::io("Failed to read input", e))?;
                let Some(line) = line else { break };

                match parse_shell_command(&line) {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = run_shell_command(command, &store, &service, config).await {
                            println!("{} {}", "Error:".red().bold(), e);
                        }
                    }
                    Err(message) => println!("{message}"),
                }
            }
            Some(notification) = rx.recv() => {
                println!("\n{}", format_notification(&notification));
            }
        }
    }

    if let Some(ticker) = ticker {
        ticker.abort();
    }

    Ok(())
}

fn prompt() {
    print!("{} ", ">".cyan().bold());
    if let Err(e) = std::io::stdout().flush() {
        tracing::debug!(error = %e, "Failed to flush prompt");
    }
}

async fn run_shell_command(
    command: ShellCommand,
    store: &SharedStore,
    service: &SyncService,
    config: &AppConfig,
) -> domain::Result<()> {
    match command {
        ShellCommand::Empty | ShellCommand::Quit => {}
        ShellCommand::Help => println!("{SHELL_HELP}"),
        ShellCommand::Next => cmd_show(store, false),
        ShellCommand::Add { text, category } => {
            let quote = lock_store(store).add(&text, &category)?;
            println!("{} New quote added!", "✓".green().bold());
            println!("{}", format_quote(&quote));

            // Success and failure arrive through the notification channel
            if matches!(service.sync_after_add().await, Some(SyncOutcome::Skipped)) {
                println!("Sync already in progress");
            }
        }
        ShellCommand::Filter(category) => cmd_filter(store, &category),
        ShellCommand::Categories => cmd_categories(store, OutputFormat::Text)?,
        ShellCommand::List => cmd_list(store, OutputFormat::Table)?,
        ShellCommand::Last => match lock_store(store).last_viewed() {
            Some(quote) => println!("{}", format_quote(&quote)),
            None => println!("No quote shown yet in this session."),
        },
        ShellCommand::Sync => {
            // Success and failure arrive through the notification channel
            if matches!(service.sync_now().await, SyncOutcome::Skipped) {
                println!("Sync already in progress");
            }
        }
        ShellCommand::Export(path) => {
            let path = path.unwrap_or_else(|| PathBuf::from("quotes.json"));
            cmd_export(store, &path, false)?;
        }
        ShellCommand::Import(path) => cmd_import(store, &path)?,
        ShellCommand::Status => {
            let status = store_status(store, config)?;
            println!("{}", format_status(&status, Some(&service.state())));
        }
    }

    Ok(())
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
