//! Lens compatibility matching.
//!
//! Resolution is rule-driven: a brand's mount table maps model-name
//! substrings to a mount group, and each group lists the lens-name tokens
//! it accepts and excludes. There is deliberately no per-model lens
//! enumeration anywhere; the rules are the single source of truth.

use super::config::{MountRules, MountTable};
use super::entities::{CompatibleLens, Lens};
use crate::util::assets;

/// Heuristic bonus tiers for lenses without a catalog price, in rupees.
const BONUS_FLOOR: f64 = 2_000.0;
const BONUS_CAP: f64 = 35_000.0;
const PRO_SERIES_BONUS: f64 = 15_000.0;
const TELEPHOTO_BONUS: f64 = 6_000.0;

/// Fraction of a known catalog price paid out as trade-in bonus.
const KNOWN_PRICE_BONUS_RATE: f64 = 0.15;

/// Capitalized form used as the mount-table key ("canon" -> "Canon").
pub fn normalize_brand(brand: &str) -> String {
    let trimmed = brand.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Resolve a camera model to its mount group.
///
/// Returns `None` for fixed-lens models (marker substring present) and for
/// models matching no pattern. Patterns are pre-sorted longest-first by
/// `MountTable::finalize`, so "5D Mark II" wins over "5D"; equal-length
/// ties resolve in declared order.
pub fn resolve_mount<'a>(table: &'a MountTable, model: &str) -> Option<&'a str> {
    if table
        .fixed_lens_markers
        .iter()
        .any(|marker| model.contains(marker.as_str()))
    {
        return None;
    }

    table
        .patterns
        .iter()
        .find(|(pattern, _)| model.contains(pattern.as_str()))
        .map(|(_, group)| group.as_str())
}

/// A lens is compatible when its name carries an accepted token and none
/// of the excluded ones.
pub fn is_compatible(lens_name: &str, rules: &MountRules) -> bool {
    let accepted = rules
        .accepts
        .iter()
        .any(|token| lens_name.contains(token.as_str()));
    let excluded = rules
        .excludes
        .iter()
        .any(|token| lens_name.contains(token.as_str()));
    accepted && !excluded
}

/// Trade-in bonus for a lens: 15% of a known catalog price, otherwise a
/// name-token heuristic bucketed between the fixed floor and cap.
pub fn lens_bonus(name: &str, price: Option<f64>) -> f64 {
    if let Some(price) = price.filter(|p| p.is_finite() && *p > 0.0) {
        return price * KNOWN_PRICE_BONUS_RATE;
    }

    let mut bonus = BONUS_FLOOR;

    // Pro-series markers: Canon L, Sony GM, Nikon S-line.
    if name.contains("L IS") || name.contains("L USM") || name.contains("GM") || name.ends_with(" S")
    {
        bonus += PRO_SERIES_BONUS;
    }

    bonus += aperture_bonus(name);

    if ["200mm", "300mm", "400mm", "500mm", "600mm"]
        .iter()
        .any(|focal| name.contains(focal))
    {
        bonus += TELEPHOTO_BONUS;
    }

    bonus.clamp(BONUS_FLOOR, BONUS_CAP)
}

fn aperture_bonus(name: &str) -> f64 {
    // Most specific first; "f/2.8" must not be caught by the "f/2" arm.
    const LADDER: [(&str, f64); 5] = [
        ("f/1.2", 12_000.0),
        ("f/1.4", 10_000.0),
        ("f/1.8", 5_000.0),
        ("f/2.8", 7_000.0),
        ("f/2", 6_000.0),
    ];
    LADDER
        .iter()
        .find(|(token, _)| name.contains(token))
        .map(|(_, bonus)| *bonus)
        .unwrap_or(0.0)
}

/// Filter a lens catalog against a resolved mount group's rules and
/// attach bonuses. Results are sorted by lens name ascending.
pub fn filter_catalog(catalog: &[Lens], table: &MountTable, group: &str) -> Vec<CompatibleLens> {
    let Some(rules) = table.rules(group) else {
        return Vec::new();
    };

    let mut matches: Vec<CompatibleLens> = catalog
        .iter()
        .filter(|lens| is_compatible(&lens.name, rules))
        .map(|lens| CompatibleLens {
            id: lens.id.clone(),
            name: lens.name.clone(),
            bonus: lens_bonus(&lens.name, lens.price),
            mount: group.to_string(),
            price: lens.price,
        })
        .collect();

    matches.sort_by(|a, b| a.name.cmp(&b.name));
    matches
}

/// Compatible lenses for a camera body, from the built-in lens catalog.
///
/// Total over its input domain: unknown brands, fixed-lens models and
/// unmatched models all yield an empty list, never an error.
pub fn compatible_lenses(brand: &str, model: &str) -> Vec<CompatibleLens> {
    let brand_key = normalize_brand(brand);
    let Some(table) = assets::mount_table(&brand_key) else {
        println!("[lens-match] No mount table for brand {brand_key}");
        return Vec::new();
    };

    let Some(group) = resolve_mount(table, model) else {
        println!("[lens-match] No mount group for {brand_key} {model}");
        return Vec::new();
    };

    let catalog: Vec<Lens> = assets::builtin_lenses()
        .iter()
        .filter(|lens| lens.brand == brand_key)
        .cloned()
        .collect();

    filter_catalog(&catalog, table, group)
}
