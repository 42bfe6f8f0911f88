use serde::{Deserialize, Serialize};

/// Latest market price for a wishlisted symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistPrice {
    pub symbol: String,

    /// `null` when the provider has no price for the symbol
    pub price: Option<f64>,
}
