mod analysis;
mod ohlcv;
mod price_row;
mod series;
mod wishlist;
pub mod indicators;

pub use analysis::{MacdPoint, PricePoint, StockAnalysis};
pub use indicators::MacdValue;
pub use ohlcv::DailyBar;
pub use price_row::PriceRow;
pub use series::{DataSource, ReconciledSeries};
pub use wishlist::WishlistPrice;
