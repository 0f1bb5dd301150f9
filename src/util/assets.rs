//! Embedded configuration catalogs.
//!
//! Category questions, variant multipliers, mount tables and the built-in
//! lens catalog ship inside the binary as JSON and are parsed once on
//! first access. A malformed embedded asset is a build defect, so the
//! loaders panic instead of degrading.

use std::{collections::HashMap, sync::OnceLock};

use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;

use crate::domain::config::{CategoryConfig, MountTable, VariantSet, VariantTable};
use crate::domain::entities::Lens;

/// Embed the entire `assets/` directory into the binary.
#[derive(RustEmbed)]
#[folder = "assets"]
struct EmbeddedAssets;

static CATEGORY_CONFIGS: OnceLock<HashMap<String, CategoryConfig>> = OnceLock::new();
static VARIANT_TABLES: OnceLock<HashMap<String, VariantTable>> = OnceLock::new();
static MOUNT_TABLES: OnceLock<HashMap<String, MountTable>> = OnceLock::new();
static BUILTIN_LENSES: OnceLock<Vec<Lens>> = OnceLock::new();

static EMPTY_VARIANTS: VariantSet = VariantSet {
    storage: Vec::new(),
    ram: Vec::new(),
};

/// Wizard configuration for a category key ("phone", "laptop", ...).
/// Unknown categories return `None`; callers treat that as empty lists.
pub fn category_config(category: &str) -> Option<&'static CategoryConfig> {
    CATEGORY_CONFIGS
        .get_or_init(|| load_json("categories.json"))
        .get(category)
}

/// Storage/RAM selectors for a model, with the category default as
/// fallback and no selectors at all for unknown categories.
pub fn variant_set(category: &str, model: &str) -> &'static VariantSet {
    VARIANT_TABLES
        .get_or_init(|| load_json("variants.json"))
        .get(category)
        .map(|table| table.lookup(model))
        .unwrap_or(&EMPTY_VARIANTS)
}

/// Mount table for a capitalized brand name. Pattern lists come back
/// pre-sorted longest-first.
pub fn mount_table(brand: &str) -> Option<&'static MountTable> {
    MOUNT_TABLES
        .get_or_init(|| {
            load_json::<HashMap<String, MountTable>>("mounts.json")
                .into_iter()
                .map(|(brand, table)| (brand, table.finalize()))
                .collect()
        })
        .get(brand)
}

/// The built-in lens catalog, used when the catalog service is not wired.
pub fn builtin_lenses() -> &'static [Lens] {
    BUILTIN_LENSES
        .get_or_init(|| load_json("lenses.json"))
        .as_slice()
}

fn load_json<T: DeserializeOwned>(path: &str) -> T {
    let asset = EmbeddedAssets::get(path)
        .unwrap_or_else(|| panic!("Failed to locate embedded asset: {path}"));
    serde_json::from_slice(&asset.data)
        .unwrap_or_else(|err| panic!("Embedded asset {path} is not valid JSON: {err}"))
}
