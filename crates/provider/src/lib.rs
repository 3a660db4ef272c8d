pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod retry;
pub mod source;
pub mod transformer;

pub use client::FplClient;
pub use config::ProviderConfig;
pub use error::{ProviderError, Result};
pub use retry::RetryPolicy;
pub use source::FplSource;
