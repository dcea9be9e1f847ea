//! Trawl Cache - content-addressed on-disk cache of scan results.
//!
//! Each query maps to `<sha256 of canonical query>.json` under the cache
//! directory. Identical queries (after normalization) share an entry.

pub mod error;
pub mod key;
pub mod store;

pub use error::{CacheError, Result};
pub use key::cache_key;
pub use store::{CacheEntry, ResultCache};
