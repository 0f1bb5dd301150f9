//! Access to the hosted catalog service and its local caches.

pub mod cache;
pub mod catalog;

#[allow(unused_imports)]
pub use cache::{LensCatalogCache, OverridesCache};
#[allow(unused_imports)]
pub use catalog::{CacheStatus, CachedPayload, CatalogClient, CatalogError, CatalogMeta};
