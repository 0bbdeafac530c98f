pub mod api;
pub mod cache;
pub mod client;
pub mod error;
pub mod types;

pub use cache::{clear_cache, get_cache_path, ResponseCache};
pub use client::BackendClient;
pub use error::BackendError;
pub use types::{DefenseRating, SaveResponse};
