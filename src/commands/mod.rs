pub mod analyze;
pub mod serve;
pub mod status;
pub mod wishlist;
