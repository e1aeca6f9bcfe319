pub mod client;
pub mod error;

pub use client::FrontendApiClient;
pub use error::CaasError;
