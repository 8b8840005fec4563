//! FactHound Reconciler - confirms forum records against on-chain escrow contracts
//!
//! This binary provides:
//! - Database initialization
//! - One-shot question, answer and selection confirmation
//! - The off-chain answer selection gate
//! - Record and pending-confirmation counts
//!
//! Note: The HTTP endpoints live in the forum's web layer, which calls the library

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use facthound_reconciler::chain::{ContractAbi, RpcChainClient};
use facthound_reconciler::config::{Config, LoggingConfig};
use facthound_reconciler::storage::Storage;
use facthound_reconciler::{
    dispatch, parse_address, select_answer, ConfirmRequest, Outcome, ReconciliationEngine,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "facthound-reconciler")]
#[command(version, about = "Reconciles FactHound questions and answers with their escrow contracts", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "reconciler.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    InitDb {
        /// Database URL
        #[arg(long, default_value = "sqlite://facthound.db")]
        database_url: String,
    },

    /// Confirm a question, answer or selection against its contract
    Confirm {
        /// What to confirm
        #[arg(value_enum)]
        kind: ConfirmKind,

        /// Question hash (hex)
        #[arg(long)]
        question_hash: String,

        /// Answer hash (hex), required for answer and selection
        #[arg(long)]
        answer_hash: Option<String>,
    },

    /// Select an answer on behalf of a user
    Select {
        /// Question id
        #[arg(long)]
        question: i64,

        /// Answer id
        #[arg(long)]
        answer: i64,

        /// Wallet of the calling user
        #[arg(long)]
        caller: String,
    },

    /// Show record counts and pending confirmations
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfirmKind {
    Question,
    Answer,
    Selection,
}

impl ConfirmKind {
    fn as_str(self) -> &'static str {
        match self {
            ConfirmKind::Question => "question",
            ConfirmKind::Answer => "answer",
            ConfirmKind::Selection => "selection",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Commands report config errors themselves; logging falls back to defaults
    let logging = Config::from_file(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    init_logging(cli.debug, &logging)?;

    info!("FactHound Reconciler starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let outcome = match cli.command {
        Commands::InitDb { database_url } => {
            init_database(&database_url).await?;
            None
        }
        Commands::Confirm {
            kind,
            question_hash,
            answer_hash,
        } => Some(confirm(&cli.config, kind, question_hash, answer_hash).await?),
        Commands::Select {
            question,
            answer,
            caller,
        } => Some(select(&cli.config, question, answer, &caller).await?),
        Commands::Status => {
            show_status(&cli.config).await?;
            None
        }
    };

    if let Some(outcome) = outcome {
        println!("{}", outcome.to_json());
        if !outcome.success {
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(debug: bool, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = if debug {
        EnvFilter::new("facthound_reconciler=debug,facthound_core=debug,sqlx=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "facthound_reconciler={0},facthound_core={0}",
                logging.level
            ))
        })
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()
            .context("Failed to install JSON log subscriber")?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
            .context("Failed to install log subscriber")?;
    }

    Ok(())
}

async fn open_storage(config: &Config) -> Result<Storage> {
    let storage = Storage::new(
        &config.database.url,
        Some(config.database.max_connections),
        Some(config.database.min_connections),
    )
    .await
    .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    Ok(storage)
}

/// Build the chain client once at startup and check it against the configuration
async fn connect_chain(config: &Config) -> Result<RpcChainClient> {
    if let Some(abi_path) = &config.contract.abi_path {
        ContractAbi::from_file(abi_path)?
            .verify()
            .context("Contract ABI does not match the reconciler")?;
        info!("Contract ABI verified: {}", abi_path);
    }

    let chain = RpcChainClient::new(
        &config.network.rpc_url,
        Duration::from_secs(config.network.call_timeout_secs),
    )?;

    chain
        .ensure_chain_id(config.network.chain_id)
        .await
        .context("RPC endpoint check failed")?;

    info!("Connected to chain {}", config.network.chain_id);

    Ok(chain)
}

/// Run one confirmation and return its outcome
async fn confirm(
    config_path: &str,
    kind: ConfirmKind,
    question_hash: String,
    answer_hash: Option<String>,
) -> Result<Outcome> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Chain ID: {}", config.network.chain_id);
    info!("  Database: {}", config.database.url);
    info!("  Allowed owners: {}", config.engine.allowed_owners.len());

    let storage = open_storage(&config).await?;
    let chain = connect_chain(&config).await?;

    let request = ConfirmRequest {
        question_hash: Some(question_hash),
        answer_hash,
        confirm_type: Some(kind.as_str().to_string()),
    };

    let engine = ReconciliationEngine::new(&storage, &chain, &config.engine);
    let outcome = dispatch(&engine, &request).await;

    storage.close().await;

    Ok(outcome)
}

/// Run the selection gate for an existing user
async fn select(config_path: &str, question: i64, answer: i64, caller: &str) -> Result<Outcome> {
    let config = Config::from_file(config_path).context("Failed to load configuration")?;
    let storage = open_storage(&config).await?;

    let wallet = parse_address(caller).context("Invalid caller wallet")?;
    let Some(user) = storage.get_user_by_wallet(&wallet).await? else {
        warn!("No user with wallet {}", wallet);
        storage.close().await;
        anyhow::bail!("No user with wallet {}", wallet);
    };

    let outcome = select_answer(&storage, question, answer, &user).await.into();

    storage.close().await;

    Ok(outcome)
}

/// Show record counts
async fn show_status(config_path: &str) -> Result<()> {
    info!("Checking reconciler status");

    // Try to load configuration, fall back to default database ONLY if file doesn't exist
    let (database_url, max_conn, min_conn) = match Config::from_file(config_path) {
        Ok(config) => {
            info!("Using database from config: {}", config.database.url);
            (
                config.database.url,
                Some(config.database.max_connections),
                Some(config.database.min_connections),
            )
        }
        Err(e) => {
            let is_not_found = e.chain().any(|cause| {
                cause
                    .downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
            });

            if is_not_found {
                info!("Config file not found, using default database: sqlite://facthound.db");
                ("sqlite://facthound.db".to_string(), None, None)
            } else {
                return Err(e).context("Failed to load config file");
            }
        }
    };

    let storage = Storage::new(&database_url, max_conn, min_conn)
        .await
        .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    let stats = storage.stats().await?;

    println!("\n=== FactHound Reconciler Status ===\n");
    println!("Records:");
    println!("  Users: {}", stats.user_count);
    println!("  Questions: {}", stats.question_count);
    println!("  Answers: {}", stats.answer_count);
    println!();
    println!("Pending on-chain confirmation:");
    println!("  Questions: {}", stats.pending_questions);
    println!("  Answers: {}", stats.pending_answers);
    println!("  Selections: {}", stats.pending_selections);
    println!();

    storage.close().await;

    Ok(())
}

/// Initialize the database
async fn init_database(database_url: &str) -> Result<()> {
    info!("Initializing database: {}", database_url);

    let storage = Storage::new(database_url, None, None)
        .await
        .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    storage
        .health_check()
        .await
        .context("Database health check failed")?;

    let stats = storage.stats().await?;
    info!("Database initialized successfully!");
    info!("  Users: {}", stats.user_count);
    info!("  Questions: {}", stats.question_count);
    info!("  Answers: {}", stats.answer_count);

    storage.close().await;

    Ok(())
}
