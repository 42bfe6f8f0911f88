use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::services::{SqliteStore, YahooClient};
use std::sync::Arc;

pub enum WishlistAction {
    Add { symbol: String },
    Remove { symbol: String },
    List,
    Prices,
}

pub async fn run(config: AppConfig, user_id: String, action: WishlistAction) -> Result<()> {
    let store = Arc::new(SqliteStore::new(config.database_path.clone()).await?);
    let yahoo = Arc::new(YahooClient::from_config(&config)?);
    let wishlist = AppState::new(store.clone(), yahoo, &config).wishlist;

    let result = async {
        match action {
            WishlistAction::Add { symbol } => {
                if wishlist.add(&user_id, &symbol).await? {
                    println!("✅ Added {} to {}'s wishlist", symbol.trim().to_uppercase(), user_id);
                } else {
                    println!("ℹ️  {} is already on {}'s wishlist", symbol.trim().to_uppercase(), user_id);
                }
            }
            WishlistAction::Remove { symbol } => {
                if wishlist.remove(&user_id, &symbol).await? {
                    println!("🗑️  Removed {} from {}'s wishlist", symbol.trim().to_uppercase(), user_id);
                } else {
                    println!("ℹ️  {} was not on {}'s wishlist", symbol.trim().to_uppercase(), user_id);
                }
            }
            WishlistAction::List => {
                let symbols = wishlist.symbols(&user_id).await?;
                if symbols.is_empty() {
                    println!("⚠️  Wishlist for {} is empty", user_id);
                }
                for symbol in symbols {
                    println!("{}", symbol);
                }
            }
            WishlistAction::Prices => {
                let prices = wishlist.prices_for_user(&user_id).await?;
                println!("{}", serde_json::to_string_pretty(&prices)?);
            }
        }
        Ok::<(), AppError>(())
    }
    .await;

    store.close().await;
    result
}
