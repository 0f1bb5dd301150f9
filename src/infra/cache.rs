//! Persistent on-disk caching for catalog data with TTL + revision tracking.

use std::{
    fs,
    path::PathBuf,
    sync::OnceLock,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::domain::entities::{IssueOverrides, Lens};

const LENS_CACHE_FILENAME: &str = "lens_catalog_cache.json";
const OVERRIDES_CACHE_FILENAME: &str = "pricing_overrides_cache.json";

/// Cache TTL: 7 days. The lens catalog only moves when new glass is added.
pub const LENS_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Cached lens catalog with TTL + catalog-revision tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LensCatalogCache {
    /// Catalog revision reported by the service when this cache was created.
    pub catalog_revision: String,
    /// Unix timestamp (seconds) when this cache was created.
    pub cached_at: u64,
    /// All lenses from the catalog service.
    pub lenses: Vec<Lens>,
}

impl LensCatalogCache {
    /// Create a new cache with current timestamp.
    pub fn new(catalog_revision: String, lenses: Vec<Lens>) -> Self {
        let cached_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            catalog_revision,
            cached_at,
            lenses,
        }
    }

    /// All lenses of one brand, in catalog order.
    pub fn brand_lenses(&self, brand: &str) -> Vec<Lens> {
        self.lenses
            .iter()
            .filter(|lens| lens.brand == brand)
            .cloned()
            .collect()
    }

    /// Check if cache has expired (older than TTL).
    pub fn is_expired(&self) -> bool {
        self.age() > LENS_CACHE_TTL
    }

    /// Get cache age as Duration.
    pub fn age(&self) -> Duration {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Duration::from_secs(now.saturating_sub(self.cached_at))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        age_string(self.age())
    }
}

fn age_string(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86400)
    }
}

fn cache_dir() -> PathBuf {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let base = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("worthyten-valuation");

        // Ensure directory exists
        let _ = fs::create_dir_all(&base);

        base
    })
    .clone()
}

/// Load lens-catalog cache from disk, if it exists.
pub fn load_lens_cache() -> Option<LensCatalogCache> {
    let path = cache_dir().join(LENS_CACHE_FILENAME);

    if !path.exists() {
        println!("[lens-cache] No lens catalog cache found at {}", path.display());
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(cache) => {
                println!("[lens-cache] Loaded lens catalog cache from {}", path.display());
                Some(cache)
            }
            Err(e) => {
                println!("[lens-cache] Failed to parse lens catalog cache: {e}");
                None
            }
        },
        Err(e) => {
            println!("[lens-cache] Failed to read lens catalog cache: {e}");
            None
        }
    }
}

/// Save lens-catalog cache to disk.
pub fn save_lens_cache(cache: &LensCatalogCache) -> Result<(), std::io::Error> {
    let path = cache_dir().join(LENS_CACHE_FILENAME);
    let content = serde_json::to_string_pretty(cache)?;
    fs::write(&path, content)?;
    println!(
        "[lens-cache] Saved lens catalog ({} lenses, revision {}) to {}",
        cache.lenses.len(),
        cache.catalog_revision,
        path.display()
    );
    Ok(())
}

// ============================================================================
// Pricing Overrides Cache (24h TTL)
// ============================================================================

/// Cache TTL for pricing overrides: 24 hours. Admins edit these often.
pub const OVERRIDES_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Cached per-product functional-issue overrides with TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverridesCache {
    /// Unix timestamp (seconds) when this cache was created.
    pub cached_at: u64,
    /// All override tables from the catalog service.
    pub overrides: Vec<IssueOverrides>,
}

impl OverridesCache {
    /// Create a new cache with current timestamp.
    pub fn new(overrides: Vec<IssueOverrides>) -> Self {
        let cached_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            cached_at,
            overrides,
        }
    }

    pub fn for_product(&self, product_id: &str) -> Option<&IssueOverrides> {
        self.overrides.iter().find(|o| o.product_id == product_id)
    }

    /// Check if cache has expired (older than 24h).
    pub fn is_expired(&self) -> bool {
        self.age() > OVERRIDES_CACHE_TTL
    }

    /// Get cache age as Duration.
    pub fn age(&self) -> Duration {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Duration::from_secs(now.saturating_sub(self.cached_at))
    }

    /// Human-readable age string.
    pub fn age_string(&self) -> String {
        age_string(self.age())
    }
}

/// Load overrides cache from disk, if it exists and is not expired.
pub fn load_overrides_cache() -> Option<OverridesCache> {
    let path = cache_dir().join(OVERRIDES_CACHE_FILENAME);

    if !path.exists() {
        println!("[overrides-cache] No cache found");
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match serde_json::from_str::<OverridesCache>(&content) {
            Ok(cache) => {
                if cache.is_expired() {
                    println!(
                        "[overrides-cache] Cache expired (age: {})",
                        cache.age_string()
                    );
                    return None;
                }
                println!(
                    "[overrides-cache] Loaded {} override tables (age: {})",
                    cache.overrides.len(),
                    cache.age_string()
                );
                Some(cache)
            }
            Err(e) => {
                println!("[overrides-cache] Failed to parse: {e}");
                None
            }
        },
        Err(e) => {
            println!("[overrides-cache] Failed to read: {e}");
            None
        }
    }
}

/// Save overrides cache to disk.
pub fn save_overrides_cache(cache: &OverridesCache) -> Result<(), std::io::Error> {
    let path = cache_dir().join(OVERRIDES_CACHE_FILENAME);
    let content = serde_json::to_string(cache)?; // compact, not pretty (can be large)
    fs::write(&path, content)?;
    println!(
        "[overrides-cache] Saved {} override tables to {}",
        cache.overrides.len(),
        path.display()
    );
    Ok(())
}
