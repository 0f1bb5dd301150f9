#![allow(dead_code)]

//! Thin asynchronous client for the WorthyTen catalog service.
//!
//! - Provides typed accessors for products, lenses and pricing overrides.
//! - Maintains a simple 60-minute in-memory cache with stale fallbacks.
//! - Backs the dynamic lens-compatibility path; that path resolves to an
//!   array, or to an empty array on any failure, never to an error.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};

use reqwest::{Client, Url};
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use crate::domain::entities::{DeviceCategory, IssueOverrides, Lens, Product};
use crate::domain::lens_match;
use crate::domain::CompatibleLens;
use crate::infra::cache::{
    load_lens_cache, load_overrides_cache, save_lens_cache, save_overrides_cache,
    LensCatalogCache, OverridesCache,
};
use crate::util::assets;
use crate::util::version::{version_label, APP_NAME, APP_REPO_URL};

const DEFAULT_BASE_URL: &str = "https://catalog.worthyten.in/v1/";
const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    Fresh,
    Cached,
    Stale,
}

#[derive(Clone, Debug)]
pub struct CachedPayload<T> {
    pub data: T,
    pub fetched_at: SystemTime,
    pub status: CacheStatus,
}

impl<T> CachedPayload<T> {
    fn new(data: T, fetched_at: SystemTime, status: CacheStatus) -> Self {
        Self {
            data,
            fetched_at,
            status,
        }
    }
}

/// Catalog metadata used to decide whether disk caches are current.
#[derive(Clone, Debug)]
pub struct CatalogMeta {
    pub revision: String,
    pub published_at: SystemTime,
}

#[derive(Default)]
struct MemoryCache {
    products: HashMap<String, Cached<Vec<Product>>>,
    lenses: HashMap<String, Cached<Vec<Lens>>>,
    overrides: HashMap<String, Cached<IssueOverrides>>,
    lens_catalog: Option<LensCatalogCache>,
}

impl MemoryCache {
    fn clear(&mut self) {
        self.products.clear();
        self.lenses.clear();
        self.overrides.clear();
        // Note: the lens catalog is NOT cleared here - it persists across
        // cache clears the same way its disk copy does.
    }
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    status: String,
    #[serde(default)]
    http_code: Option<u16>,
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: Url,
    cache: Arc<Mutex<MemoryCache>>,
    ttl: Duration,
}

impl CatalogClient {
    pub fn new() -> Result<Self, CatalogError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, CatalogError> {
        let base_url = Url::parse(base)?;
        let user_agent = format!("{}/{} (+{})", APP_NAME, version_label(), APP_REPO_URL);
        let http = Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            http,
            base_url,
            cache: Arc::new(Mutex::new(MemoryCache::default())),
            ttl: DEFAULT_TTL,
        })
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Device catalog for one category.
    pub async fn get_products(
        &self,
        category: DeviceCategory,
    ) -> Result<CachedPayload<Vec<Product>>, CatalogError> {
        let key = category.key().to_string();
        if let Some(payload) = self.cached_products(&key).await {
            return Ok(payload);
        }

        let mut url = self.url("products")?;
        url.query_pairs_mut().append_pair("category", &key);

        match self.fetch_data::<Vec<ProductDto>>(self.http.get(url)).await {
            Ok(response) => {
                let data = response
                    .into_iter()
                    .filter_map(|dto| dto.into_product())
                    .collect::<Vec<_>>();
                Ok(self.store_products(&key, data, CacheStatus::Fresh).await)
            }
            Err(error) => {
                if let Some(stale) = self.cached_products_stale(&key).await {
                    return Ok(stale);
                }
                Err(error)
            }
        }
    }

    /// Find one product by model name within a category.
    pub async fn find_product(
        &self,
        category: DeviceCategory,
        model: &str,
    ) -> Result<Option<Product>, CatalogError> {
        let payload = self.get_products(category).await?;
        Ok(payload.data.into_iter().find(|p| p.model == model))
    }

    /// Lens catalog for one brand. Serves the in-memory cache when fresh
    /// and falls back to stale data when the service is unreachable.
    pub async fn get_lenses(&self, brand: &str) -> Result<CachedPayload<Vec<Lens>>, CatalogError> {
        if let Some(payload) = self.cached_lenses(brand).await {
            return Ok(payload);
        }

        let mut url = self.url("lenses")?;
        url.query_pairs_mut().append_pair("brand", brand);

        println!("[catalog] Requesting lenses from {url}");

        match self.fetch_data::<Vec<LensDto>>(self.http.get(url.clone())).await {
            Ok(response) => {
                let data = response.into_iter().map(Lens::from).collect::<Vec<_>>();
                println!(
                    "[catalog] Parsed {} lenses for brand {brand}. Sample: {:?}",
                    data.len(),
                    data.first().map(|l| l.name.as_str())
                );
                let status = if data.is_empty() {
                    CacheStatus::Cached
                } else {
                    CacheStatus::Fresh
                };
                Ok(self.store_lenses(brand, data, status).await)
            }
            Err(error) => {
                println!("[catalog] Lens request failed for {url}: {error}");
                if let Some(stale) = self.cached_lenses_stale(brand).await {
                    return Ok(stale);
                }
                Err(error)
            }
        }
    }

    /// The dynamic compatibility path: resolve the mount from the embedded
    /// rules, then filter the brand's catalog lenses. Resolves to an empty
    /// list on unknown brands, fixed-lens models and any request failure.
    pub async fn compatible_lenses_from_catalog(
        &self,
        brand: &str,
        model: &str,
    ) -> Vec<CompatibleLens> {
        let brand_key = lens_match::normalize_brand(brand);
        let Some(table) = assets::mount_table(&brand_key) else {
            println!("[catalog] No mount table for brand {brand_key}");
            return Vec::new();
        };
        let Some(group) = lens_match::resolve_mount(table, model) else {
            println!("[catalog] No mount group for {brand_key} {model}");
            return Vec::new();
        };

        match self.get_lenses(&brand_key).await {
            Ok(payload) => lens_match::filter_catalog(&payload.data, table, group),
            Err(error) => {
                println!("[catalog] Falling back to empty lens list for {brand_key} {model}: {error}");
                Vec::new()
            }
        }
    }

    /// Admin override table for one product.
    pub async fn get_pricing_overrides(
        &self,
        product_id: &str,
    ) -> Result<CachedPayload<IssueOverrides>, CatalogError> {
        if let Some(payload) = self.cached_overrides(product_id).await {
            return Ok(payload);
        }

        let mut url = self.url("pricing_overrides")?;
        url.query_pairs_mut().append_pair("product", product_id);

        match self
            .fetch_data::<OverridesDto>(self.http.get(url))
            .await
        {
            Ok(dto) => {
                let data = IssueOverrides::from(dto);
                Ok(self
                    .store_overrides(product_id, data, CacheStatus::Fresh)
                    .await)
            }
            Err(error) => {
                if let Some(stale) = self.cached_overrides_stale(product_id).await {
                    return Ok(stale);
                }
                Err(error)
            }
        }
    }

    /// Best-effort override lookup for the issues step: network first,
    /// then the disk cache, then none (category defaults apply).
    pub async fn issue_overrides(&self, product_id: &str) -> Option<IssueOverrides> {
        match self.get_pricing_overrides(product_id).await {
            Ok(payload) => Some(payload.data),
            Err(error) => {
                println!("[catalog] Override fetch failed for {product_id}: {error}");
                load_overrides_cache()
                    .and_then(|cache| cache.for_product(product_id).cloned())
            }
        }
    }

    /// Refresh every override table and persist them for offline use.
    pub async fn refresh_pricing_overrides(&self) -> Result<OverridesCache, CatalogError> {
        let url = self.url("pricing_overrides")?;
        let tables: Vec<OverridesDto> = self.fetch_data(self.http.get(url)).await?;
        let cache = OverridesCache::new(tables.into_iter().map(IssueOverrides::from).collect());

        if let Err(e) = save_overrides_cache(&cache) {
            println!("[catalog] Warning: failed to save overrides cache: {e}");
        }

        Ok(cache)
    }

    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }

    /// Load the full lens catalog with TTL + revision check.
    /// Refreshes if: cache expired (>7 days) OR catalog revision changed.
    pub async fn get_lens_catalog(&self) -> Result<LensCatalogCache, CatalogError> {
        // Check in-memory cache first (always valid within session)
        {
            let cache = self.cache.lock().await;
            if let Some(ref catalog) = cache.lens_catalog {
                println!(
                    "[catalog] Using in-memory lens catalog ({} lenses, revision {}, age: {})",
                    catalog.lenses.len(),
                    catalog.catalog_revision,
                    catalog.age_string()
                );
                return Ok(catalog.clone());
            }
        }

        // Try loading from disk cache
        if let Some(disk_cache) = load_lens_cache() {
            let age = disk_cache.age_string();

            // Check TTL first
            if disk_cache.is_expired() {
                println!(
                    "[catalog] Lens cache expired (age: {}, TTL: 7d), refreshing...",
                    age
                );
                return self.refresh_lens_catalog().await;
            }

            // TTL ok - check revision as secondary validation
            let meta = self.get_catalog_meta().await?;

            if disk_cache.catalog_revision == meta.revision {
                println!(
                    "[catalog] Disk lens cache valid (age: {}, revision: {})",
                    age, meta.revision
                );
                // Store in memory cache
                self.cache.lock().await.lens_catalog = Some(disk_cache.clone());
                return Ok(disk_cache);
            } else {
                println!(
                    "[catalog] Revision changed: {} -> {}, refreshing...",
                    disk_cache.catalog_revision, meta.revision
                );
            }
        }

        // Fetch fresh from the service
        self.refresh_lens_catalog().await
    }

    /// Force refresh the lens catalog from the service.
    pub async fn refresh_lens_catalog(&self) -> Result<LensCatalogCache, CatalogError> {
        println!("[catalog] Fetching full lens catalog...");

        // Get current catalog revision first
        let meta = self.get_catalog_meta().await?;

        let url = self.url("lenses")?;
        let lenses_dto: Vec<LensDto> = self.fetch_data(self.http.get(url)).await?;

        let lenses: Vec<Lens> = lenses_dto.into_iter().map(Lens::from).collect();
        let priced = lenses.iter().filter(|l| l.price.is_some()).count();

        println!(
            "[catalog] Loaded {} lenses ({} priced) for revision {}",
            lenses.len(),
            priced,
            meta.revision
        );

        let cache = LensCatalogCache::new(meta.revision, lenses);

        // Save to disk
        if let Err(e) = save_lens_cache(&cache) {
            println!("[catalog] Warning: failed to save lens cache: {e}");
        }

        // Store in memory
        self.cache.lock().await.lens_catalog = Some(cache.clone());

        Ok(cache)
    }

    /// Fetch the current catalog revision and publish time.
    pub async fn get_catalog_meta(&self) -> Result<CatalogMeta, CatalogError> {
        let url = self.url("catalog_meta")?;
        let dto: CatalogMetaDto = self.fetch_data(self.http.get(url)).await?;
        Ok(CatalogMeta {
            revision: dto.revision.unwrap_or_else(|| "unknown".to_string()),
            published_at: parse_timestamp_str(dto.published_at.as_deref()),
        })
    }

    async fn cached_products(&self, category: &str) -> Option<CachedPayload<Vec<Product>>> {
        let cache = self.cache.lock().await;
        cache
            .products
            .get(category)
            .and_then(|entry| entry.if_fresh(self.ttl))
    }

    async fn cached_products_stale(&self, category: &str) -> Option<CachedPayload<Vec<Product>>> {
        let cache = self.cache.lock().await;
        cache.products.get(category).map(Cached::stale)
    }

    async fn cached_lenses(&self, brand: &str) -> Option<CachedPayload<Vec<Lens>>> {
        let cache = self.cache.lock().await;
        let result = cache
            .lenses
            .get(brand)
            .and_then(|entry| entry.if_fresh(self.ttl));
        if result.is_some() {
            println!("[catalog] Serving cached lenses for brand {brand}");
        }
        result
    }

    async fn cached_lenses_stale(&self, brand: &str) -> Option<CachedPayload<Vec<Lens>>> {
        let cache = self.cache.lock().await;
        cache.lenses.get(brand).map(Cached::stale)
    }

    async fn cached_overrides(&self, product_id: &str) -> Option<CachedPayload<IssueOverrides>> {
        let cache = self.cache.lock().await;
        cache
            .overrides
            .get(product_id)
            .and_then(|entry| entry.if_fresh(self.ttl))
    }

    async fn cached_overrides_stale(
        &self,
        product_id: &str,
    ) -> Option<CachedPayload<IssueOverrides>> {
        let cache = self.cache.lock().await;
        cache.overrides.get(product_id).map(Cached::stale)
    }

    async fn store_products(
        &self,
        category: &str,
        data: Vec<Product>,
        status: CacheStatus,
    ) -> CachedPayload<Vec<Product>> {
        let fetched_at = SystemTime::now();
        let payload = CachedPayload::new(data.clone(), fetched_at, status);
        let mut cache = self.cache.lock().await;
        cache
            .products
            .insert(category.to_string(), Cached::new(data, fetched_at));
        payload
    }

    async fn store_lenses(
        &self,
        brand: &str,
        data: Vec<Lens>,
        status: CacheStatus,
    ) -> CachedPayload<Vec<Lens>> {
        let fetched_at = SystemTime::now();
        let payload = CachedPayload::new(data.clone(), fetched_at, status);
        let mut cache = self.cache.lock().await;
        cache
            .lenses
            .insert(brand.to_string(), Cached::new(data, fetched_at));
        payload
    }

    async fn store_overrides(
        &self,
        product_id: &str,
        data: IssueOverrides,
        status: CacheStatus,
    ) -> CachedPayload<IssueOverrides> {
        let fetched_at = SystemTime::now();
        let payload = CachedPayload::new(data.clone(), fetched_at, status);
        let mut cache = self.cache.lock().await;
        cache
            .overrides
            .insert(product_id.to_string(), Cached::new(data, fetched_at));
        payload
    }

    async fn fetch_data<T>(&self, builder: reqwest::RequestBuilder) -> Result<T, CatalogError>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await?.error_for_status()?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        let ApiEnvelope {
            status,
            data,
            message,
            ..
        } = envelope;

        if status.eq_ignore_ascii_case("ok") {
            data.ok_or_else(|| CatalogError::Api("response missing data".into()))
        } else {
            Err(CatalogError::Api(message.unwrap_or(status)))
        }
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

struct Cached<T> {
    value: T,
    fetched_at: SystemTime,
}

impl<T: Clone> Cached<T> {
    fn new(value: T, fetched_at: SystemTime) -> Self {
        Self { value, fetched_at }
    }

    fn if_fresh(&self, ttl: Duration) -> Option<CachedPayload<T>> {
        if self
            .fetched_at
            .elapsed()
            .map(|elapsed| elapsed <= ttl)
            .unwrap_or(false)
        {
            Some(CachedPayload::new(
                self.value.clone(),
                self.fetched_at,
                CacheStatus::Cached,
            ))
        } else {
            None
        }
    }

    fn stale(&self) -> CachedPayload<T> {
        CachedPayload::new(self.value.clone(), self.fetched_at, CacheStatus::Stale)
    }
}

#[derive(Debug, Deserialize)]
struct ProductDto {
    #[serde(deserialize_with = "string_from_json")]
    id: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(alias = "name", default)]
    model: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(alias = "imageUrl", default)]
    image_url: Option<String>,
    #[serde(alias = "basePrice", default, deserialize_with = "price_from_json")]
    base_price: Option<f64>,
}

impl ProductDto {
    /// Documents without a resolvable category are skipped, not errors.
    fn into_product(self) -> Option<Product> {
        let category = DeviceCategory::from_key(self.category.as_deref()?)?;
        Some(Product {
            id: self.id,
            brand: self.brand.unwrap_or_else(|| "Unknown".to_string()),
            model: self.model.unwrap_or_else(|| "Unknown".to_string()),
            category,
            subcategory: self.subcategory,
            image_url: self.image_url,
            base_price: self.base_price.filter(|p| p.is_finite()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LensDto {
    #[serde(deserialize_with = "string_from_json")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    mount: Option<String>,
    #[serde(default, deserialize_with = "price_from_json")]
    price: Option<f64>,
}

impl From<LensDto> for Lens {
    fn from(dto: LensDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name.unwrap_or_else(|| "Unknown lens".to_string()),
            brand: dto.brand.unwrap_or_else(|| "Unknown".to_string()),
            mount: dto.mount,
            price: dto.price.filter(|p| p.is_finite()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverridesDto {
    #[serde(deserialize_with = "string_from_json")]
    product_id: String,
    #[serde(default)]
    amounts: HashMap<String, f64>,
}

impl From<OverridesDto> for IssueOverrides {
    fn from(dto: OverridesDto) -> Self {
        Self {
            product_id: dto.product_id,
            amounts: dto.amounts,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogMetaDto {
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    published_at: Option<String>,
}

fn parse_timestamp_str(raw: Option<&str>) -> SystemTime {
    raw.and_then(|value| {
        OffsetDateTime::parse(value, &Rfc3339).ok().and_then(|dt| {
            if dt.unix_timestamp() >= 0 {
                let secs = dt.unix_timestamp() as u64;
                let nanos = dt.nanosecond() as u64;
                SystemTime::UNIX_EPOCH
                    .checked_add(Duration::from_secs(secs))
                    .and_then(|time| time.checked_add(Duration::from_nanos(nanos)))
            } else {
                None
            }
        })
    })
    .unwrap_or_else(SystemTime::now)
}

/// Prices arrive as numbers from the service but as strings from older
/// admin imports; accept both and drop anything unparseable.
fn price_from_json<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(number)) => number.as_f64(),
        Some(serde_json::Value::String(string)) => string.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn string_from_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct StringOrNumber;

    impl<'de> serde::de::Visitor<'de> for StringOrNumber {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or number")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(value.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumber)
}
