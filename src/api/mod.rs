//! JTDC storefront API.

pub mod client;
pub mod types;

pub use client::{StoreApi, StoreClient};
pub use types::ApiError;
