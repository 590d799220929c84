// Service exports
pub mod cache;
pub mod matching;
pub mod postgres;

pub use cache::{CacheError, CacheKey, CacheManager};
pub use matching::{MatchError, MatchingService};
pub use postgres::{PostgresClient, StoreError};
