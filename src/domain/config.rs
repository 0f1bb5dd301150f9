//! Category, variant and mount configuration tables.
//!
//! Pricing data only: labels exist for display, everything else is ids,
//! fractions and flat amounts. Presentation metadata (icons, images)
//! stays out of these tables so the price engine can run headless.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One wizard assessment question.
///
/// `deduction` is a fraction of the *original* base price, subtracted when
/// the question is answered negatively. Questions flagged `is_lens_question`
/// never deduct; they only gate whether the lens step is shown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentQuestion {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub deduction: f64,
    #[serde(default)]
    pub is_lens_question: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub deduction: f64,
}

/// A group of mutually exclusive physical-condition options
/// (display, body, ports, ...). Exactly one option per group is selected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub options: Vec<ConditionOption>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionalIssue {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub deduction: f64,
}

/// Accessory bonuses are flat amounts, not fractions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accessory {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub bonus: f64,
}

/// Per-category wizard configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryConfig {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub assessment_questions: Vec<AssessmentQuestion>,
    #[serde(default)]
    pub physical_conditions: Vec<ConditionGroup>,
    #[serde(default)]
    pub functional_issues: Vec<FunctionalIssue>,
    #[serde(default)]
    pub accessories: Vec<Accessory>,
    #[serde(default)]
    pub warranty_bonus: f64,
}

impl CategoryConfig {
    pub fn question(&self, id: &str) -> Option<&AssessmentQuestion> {
        self.assessment_questions.iter().find(|q| q.id == id)
    }

    pub fn condition_group(&self, id: &str) -> Option<&ConditionGroup> {
        self.physical_conditions.iter().find(|g| g.id == id)
    }

    pub fn issue(&self, id: &str) -> Option<&FunctionalIssue> {
        self.functional_issues.iter().find(|i| i.id == id)
    }

    pub fn accessory(&self, id: &str) -> Option<&Accessory> {
        self.accessories.iter().find(|a| a.id == id)
    }

    /// Whether this category's wizard includes a lens step at all.
    pub fn has_lens_question(&self) -> bool {
        self.assessment_questions.iter().any(|q| q.is_lens_question)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantOption {
    pub value: String,
    pub label: String,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

/// Storage and RAM selectors for one model family. An empty `ram` list
/// means "no RAM selector shown".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantSet {
    #[serde(default)]
    pub storage: Vec<VariantOption>,
    #[serde(default)]
    pub ram: Vec<VariantOption>,
}

impl VariantSet {
    pub fn storage_multiplier(&self, value: &str) -> f64 {
        self.storage
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.multiplier)
            .unwrap_or(1.0)
    }

    pub fn ram_multiplier(&self, value: &str) -> f64 {
        self.ram
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.multiplier)
            .unwrap_or(1.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantEntry {
    pub key: String,
    #[serde(flatten)]
    pub variants: VariantSet,
}

/// Per-category variant table: model-keyed entries plus a default fallback.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantTable {
    #[serde(default)]
    pub models: Vec<VariantEntry>,
    #[serde(default)]
    pub default: VariantSet,
}

impl VariantTable {
    /// Resolve the variant set for a model name. Entries match on substring
    /// containment; the longest matching key wins so "iPhone 13 Pro Max"
    /// is not shadowed by "iPhone 13".
    pub fn lookup(&self, model: &str) -> &VariantSet {
        self.models
            .iter()
            .filter(|entry| model.contains(entry.key.as_str()))
            .max_by_key(|entry| entry.key.len())
            .map(|entry| &entry.variants)
            .unwrap_or(&self.default)
    }
}

/// Which lens-name tokens a mount group accepts and rejects.
///
/// Exclusion exists because accepted tokens are substrings: a Canon
/// full-frame EF body accepts "EF" but a naive match would also pull in
/// "EF-S" and "EF-M" glass.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountRules {
    #[serde(default)]
    pub accepts: Vec<String>,
    #[serde(default)]
    pub excludes: Vec<String>,
}

/// Per-brand mount table: model-substring patterns resolving to a mount
/// group, markers for fixed-lens models, and per-group token rules.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MountTable {
    #[serde(default)]
    pub fixed_lens_markers: Vec<String>,
    /// (model substring, mount group id) tuples. Sorted longest-first by
    /// `finalize`; ties keep declared order.
    #[serde(default)]
    pub patterns: Vec<(String, String)>,
    #[serde(default)]
    pub groups: HashMap<String, MountRules>,
}

impl MountTable {
    /// Sort patterns by descending length once, after deserialization.
    /// The sort is stable: equal-length patterns keep their declared order,
    /// which makes resolution deterministic when two patterns tie.
    pub fn finalize(mut self) -> Self {
        self.patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        self
    }

    pub fn rules(&self, group: &str) -> Option<&MountRules> {
        self.groups.get(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(keys: &[&str]) -> VariantTable {
        VariantTable {
            models: keys
                .iter()
                .map(|key| VariantEntry {
                    key: key.to_string(),
                    variants: VariantSet {
                        storage: vec![VariantOption {
                            value: key.to_string(),
                            label: key.to_string(),
                            multiplier: 1.0,
                        }],
                        ram: Vec::new(),
                    },
                })
                .collect(),
            default: VariantSet::default(),
        }
    }

    #[test]
    fn variant_lookup_prefers_longest_key() {
        let table = table_with(&["iPhone 13", "iPhone 13 Pro Max"]);
        let set = table.lookup("Apple iPhone 13 Pro Max");
        assert_eq!(set.storage[0].value, "iPhone 13 Pro Max");
    }

    #[test]
    fn variant_lookup_falls_back_to_default() {
        let table = table_with(&["Galaxy S21"]);
        let set = table.lookup("Pixel 6");
        assert!(set.storage.is_empty());
        assert!(set.ram.is_empty());
    }

    #[test]
    fn unknown_variant_value_keeps_base_price() {
        let set = VariantSet {
            storage: vec![VariantOption {
                value: "256".to_string(),
                label: "256 GB".to_string(),
                multiplier: 1.1,
            }],
            ram: Vec::new(),
        };
        assert_eq!(set.storage_multiplier("256"), 1.1);
        assert_eq!(set.storage_multiplier("512"), 1.0);
        assert_eq!(set.ram_multiplier("8"), 1.0);
    }

    #[test]
    fn finalize_sorts_patterns_longest_first_stable() {
        let table = MountTable {
            fixed_lens_markers: Vec::new(),
            patterns: vec![
                ("5D".to_string(), "fullFrameEF".to_string()),
                ("Rebel".to_string(), "apscEFS".to_string()),
                ("EOS R".to_string(), "rfMount".to_string()),
                ("5D Mark II".to_string(), "fullFrameEF".to_string()),
            ],
            groups: HashMap::new(),
        }
        .finalize();

        let keys: Vec<&str> = table.patterns.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(keys, vec!["5D Mark II", "Rebel", "EOS R", "5D"]);
    }
}
