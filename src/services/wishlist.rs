use crate::error::{AppError, Result};
use crate::models::WishlistPrice;
use crate::services::market_data::QuoteSource;
use crate::services::price_store::WishlistStore;
use crate::utils::normalize_symbol;
use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

/// Latest prices for the symbols a user tracks
#[derive(Clone)]
pub struct WishlistService {
    store: Arc<dyn WishlistStore>,
    quotes: Arc<dyn QuoteSource>,
}

impl WishlistService {
    pub fn new(store: Arc<dyn WishlistStore>, quotes: Arc<dyn QuoteSource>) -> Self {
        Self { store, quotes }
    }

    /// One entry per saved symbol, in the order saved. Lookups run concurrently;
    /// any provider failure fails the whole request.
    pub async fn prices_for_user(&self, user_id: &str) -> Result<Vec<WishlistPrice>> {
        let user_id = validate_user_id(user_id)?;
        let symbols = self.store.symbols_for_user(user_id).await?;
        debug!(user_id, symbols = symbols.len(), "Looking up wishlist prices");

        let lookups = symbols.iter().map(|symbol| self.quotes.latest_price(symbol));
        let prices = join_all(lookups).await;

        symbols
            .into_iter()
            .zip(prices)
            .map(|(symbol, price)| {
                Ok(WishlistPrice {
                    symbol,
                    price: price?.filter(|p| p.is_finite()),
                })
            })
            .collect()
    }

    pub async fn add(&self, user_id: &str, symbol: &str) -> Result<bool> {
        let user_id = validate_user_id(user_id)?;
        let symbol = normalize_symbol(symbol).ok_or_else(|| AppError::InvalidInput("symbol must not be empty".to_string()))?;
        self.store.add_symbol(user_id, &symbol).await
    }

    pub async fn remove(&self, user_id: &str, symbol: &str) -> Result<bool> {
        let user_id = validate_user_id(user_id)?;
        let symbol = normalize_symbol(symbol).ok_or_else(|| AppError::InvalidInput("symbol must not be empty".to_string()))?;
        self.store.remove_symbol(user_id, &symbol).await
    }

    pub async fn symbols(&self, user_id: &str) -> Result<Vec<String>> {
        let user_id = validate_user_id(user_id)?;
        self.store.symbols_for_user(user_id).await
    }
}

fn validate_user_id(user_id: &str) -> Result<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::InvalidInput("user_id must not be empty".to_string()));
    }
    Ok(user_id)
}
