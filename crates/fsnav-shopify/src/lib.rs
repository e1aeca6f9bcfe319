pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::{language_code, StorefrontClient};
pub use error::StorefrontError;
pub use types::{global_id, shopify_type, ShopifyPage, ShopifySeo};
