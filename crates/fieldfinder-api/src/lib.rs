pub mod alerts;
pub mod client;
pub mod error;
pub mod listings;
mod retry;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
