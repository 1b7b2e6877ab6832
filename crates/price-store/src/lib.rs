//! Storage backends for price and factor history.

pub mod memory;
pub mod sqlite;
pub mod ticker;

pub use memory::InMemoryStore;
pub use sqlite::{SqlitePriceStore, DEFAULT_FACTOR_TABLE};
pub use ticker::normalize_ticker;
