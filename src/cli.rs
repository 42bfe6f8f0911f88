use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::commands;
use crate::commands::wishlist::WishlistAction;
use crate::config::AppConfig;
use crate::error::Result;

#[derive(Parser)]
#[command(name = "stockinsight")]
#[command(about = "Stock price history, RSI/MACD and wishlist prices", long_about = None)]
pub struct Cli {
    /// SQLite database path (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Reconcile a symbol and print its analysis as JSON
    Analyze {
        symbol: String,

        /// Trailing window in calendar days
        #[arg(short, long)]
        days: Option<u32>,
    },
    /// Manage a user's wishlist
    Wishlist {
        #[command(subcommand)]
        command: WishlistCommands,
    },
    /// Show what the price store holds
    Status,
}

#[derive(Subcommand)]
pub enum WishlistCommands {
    /// Add a symbol
    Add { user_id: String, symbol: String },
    /// Remove a symbol
    Remove { user_id: String, symbol: String },
    /// List saved symbols
    List { user_id: String },
    /// Latest price for every saved symbol
    Prices { user_id: String },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            commands::serve::run(config).await
        }
        Commands::Analyze { symbol, days } => commands::analyze::run(config, symbol, days).await,
        Commands::Wishlist { command } => {
            let (user_id, action) = match command {
                WishlistCommands::Add { user_id, symbol } => (user_id, WishlistAction::Add { symbol }),
                WishlistCommands::Remove { user_id, symbol } => (user_id, WishlistAction::Remove { symbol }),
                WishlistCommands::List { user_id } => (user_id, WishlistAction::List),
                WishlistCommands::Prices { user_id } => (user_id, WishlistAction::Prices),
            };
            commands::wishlist::run(config, user_id, action).await
        }
        Commands::Status => commands::status::run(config).await,
    }
}
