//! The in-progress valuation session.
//!
//! One session per wizard run: created when the user picks a model,
//! updated once per step, consumed at booking. Each step recomputes its
//! stage price from the price of the last completed earlier stage, so
//! re-running a step with the same selections is idempotent.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::config::{CategoryConfig, VariantSet};
use super::entities::{CompatibleLens, DeviceCategory, IssueOverrides, Product};
use super::pricing::{self, BreakdownRow};

/// Wizard stages in chain order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Assessment,
    Lenses,
    Physical,
    Issues,
    Accessories,
    Warranty,
}

impl Stage {
    const ORDER: [Stage; 6] = [
        Stage::Assessment,
        Stage::Lenses,
        Stage::Physical,
        Stage::Issues,
        Stage::Accessories,
        Stage::Warranty,
    ];

    fn label(&self) -> &'static str {
        match self {
            Stage::Assessment => "Assessment",
            Stage::Lenses => "Lenses",
            Stage::Physical => "Physical Condition",
            Stage::Issues => "Functional Issues",
            Stage::Accessories => "Accessories",
            Stage::Warranty => "Warranty",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationSession {
    /// Session-scoped id; pickup requests get a real UUID at booking.
    #[serde(default)]
    pub session_id: String,
    pub brand_name: String,
    pub model_name: String,
    pub category: DeviceCategory,
    pub image_url: Option<String>,
    /// Catalog base price with variant multipliers already applied.
    /// All percentage deductions are fractions of this value.
    pub original_quote_price: f64,

    pub price_after_assessment: Option<f64>,
    pub price_after_lenses: Option<f64>,
    pub price_after_physical: Option<f64>,
    pub price_after_issues: Option<f64>,
    pub price_after_accessories: Option<f64>,
    pub price_after_warranty: Option<f64>,

    #[serde(default)]
    pub assessment_answers: HashMap<String, bool>,
    #[serde(default)]
    pub selected_lenses: Vec<String>,
    #[serde(default)]
    pub condition_selections: HashMap<String, String>,
    #[serde(default)]
    pub selected_issues: HashSet<String>,
    #[serde(default)]
    pub selected_accessories: HashSet<String>,
    #[serde(default)]
    pub has_warranty: bool,
    #[serde(default)]
    pub has_additional_lens: bool,
}

impl ValuationSession {
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        category: DeviceCategory,
        base_price: f64,
    ) -> Self {
        Self {
            session_id: crate::util::generate_id("quote"),
            brand_name: brand.into(),
            model_name: model.into(),
            category,
            original_quote_price: pricing::clamp_price(base_price),
            ..Self::default()
        }
    }

    /// Start a session from a catalog product and the user's variant picks.
    /// A product without a usable base price quotes at zero rather than
    /// failing; the wizard still runs and the summary shows the gap.
    pub fn from_product(
        product: &Product,
        variants: &VariantSet,
        storage: Option<&str>,
        ram: Option<&str>,
    ) -> Self {
        let base = product.base_price.filter(|p| p.is_finite()).unwrap_or(0.0);
        let multiplier = storage.map(|v| variants.storage_multiplier(v)).unwrap_or(1.0)
            * ram.map(|v| variants.ram_multiplier(v)).unwrap_or(1.0);

        let mut session = Self::new(
            product.brand.clone(),
            product.model.clone(),
            product.category,
            base * multiplier,
        );
        session.image_url = product.image_url.clone();
        session
    }

    fn stage_price(&self, stage: Stage) -> Option<f64> {
        match stage {
            Stage::Assessment => self.price_after_assessment,
            Stage::Lenses => self.price_after_lenses,
            Stage::Physical => self.price_after_physical,
            Stage::Issues => self.price_after_issues,
            Stage::Accessories => self.price_after_accessories,
            Stage::Warranty => self.price_after_warranty,
        }
    }

    /// Price feeding a stage: the last present stage price before it,
    /// falling back to the original quote.
    fn stage_input(&self, stage: Stage) -> f64 {
        let position = Stage::ORDER
            .iter()
            .position(|s| *s == stage)
            .unwrap_or(0);
        Stage::ORDER[..position]
            .iter()
            .rev()
            .find_map(|s| self.stage_price(*s))
            .unwrap_or(self.original_quote_price)
    }

    pub fn record_assessment(&mut self, config: &CategoryConfig, answers: HashMap<String, bool>) {
        self.has_additional_lens = config
            .assessment_questions
            .iter()
            .filter(|q| q.is_lens_question)
            .any(|q| answers.get(&q.id).copied().unwrap_or(false));

        self.price_after_assessment = Some(pricing::apply_assessment(
            self.original_quote_price,
            &config.assessment_questions,
            &answers,
        ));
        self.assessment_answers = answers;
    }

    /// Record the lens step. `offered` is the compatibility-matched list;
    /// only offered lenses can be selected, anything else is ignored.
    pub fn record_lenses(&mut self, offered: &[CompatibleLens], selected_ids: &[String]) {
        let selected: Vec<CompatibleLens> = offered
            .iter()
            .filter(|lens| selected_ids.contains(&lens.id))
            .cloned()
            .collect();

        self.selected_lenses = selected.iter().map(|l| l.id.clone()).collect();
        self.price_after_lenses = Some(pricing::apply_lenses(
            self.stage_input(Stage::Lenses),
            &selected,
        ));
    }

    pub fn record_physical(
        &mut self,
        config: &CategoryConfig,
        selections: HashMap<String, String>,
    ) {
        self.price_after_physical = Some(pricing::apply_physical(
            self.stage_input(Stage::Physical),
            self.original_quote_price,
            &config.physical_conditions,
            &selections,
        ));
        self.condition_selections = selections;
    }

    pub fn record_issues(
        &mut self,
        config: &CategoryConfig,
        selected: HashSet<String>,
        overrides: Option<&IssueOverrides>,
    ) {
        self.price_after_issues = Some(pricing::apply_issues(
            self.stage_input(Stage::Issues),
            self.original_quote_price,
            &config.functional_issues,
            &selected,
            overrides,
        ));
        self.selected_issues = selected;
    }

    pub fn record_accessories(&mut self, config: &CategoryConfig, selected: HashSet<String>) {
        self.price_after_accessories = Some(pricing::apply_accessories(
            self.stage_input(Stage::Accessories),
            &config.accessories,
            &selected,
        ));
        self.selected_accessories = selected;
    }

    pub fn record_warranty(&mut self, config: &CategoryConfig, has_warranty: bool) {
        self.has_warranty = has_warranty;
        self.price_after_warranty = Some(pricing::apply_warranty(
            self.stage_input(Stage::Warranty),
            config.warranty_bonus,
            has_warranty,
        ));
    }

    /// The current final price: the last-present stage price in chain
    /// order, clamped at zero.
    pub fn final_price(&self) -> f64 {
        let last = Stage::ORDER
            .iter()
            .rev()
            .find_map(|s| self.stage_price(*s))
            .unwrap_or(self.original_quote_price);
        pricing::clamp_price(last)
    }

    /// Itemized breakdown for the summary step. No-op stages emit no row.
    pub fn breakdown(&self) -> Vec<BreakdownRow> {
        let stages: Vec<(&str, Option<f64>)> = Stage::ORDER
            .iter()
            .map(|s| (s.label(), self.stage_price(*s)))
            .collect();
        pricing::breakdown(self.original_quote_price, &stages)
    }

    /// Freeze the session into the snapshot persisted with a booking.
    pub fn to_snapshot(&self) -> QuoteSnapshot {
        QuoteSnapshot {
            brand_name: self.brand_name.clone(),
            model_name: self.model_name.clone(),
            category: self.category,
            image_url: self.image_url.clone(),
            original_quote_price: self.original_quote_price,
            price_after_assessment: self.price_after_assessment,
            price_after_lenses: self.price_after_lenses,
            price_after_physical: self.price_after_physical,
            price_after_issues: self.price_after_issues,
            price_after_accessories: self.price_after_accessories,
            price_after_warranty: self.price_after_warranty,
            selected_lenses: if self.selected_lenses.is_empty() {
                None
            } else {
                Some(self.selected_lenses.clone())
            },
            has_additional_lens: self.has_additional_lens,
        }
    }
}

/// The device snapshot frozen into a pickup request. Field names follow
/// the persisted document shape, so consumers can read the last-present
/// `priceAfter*` field as the current final price.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSnapshot {
    pub brand_name: String,
    pub model_name: String,
    pub category: DeviceCategory,
    pub image_url: Option<String>,
    pub original_quote_price: f64,
    pub price_after_assessment: Option<f64>,
    pub price_after_lenses: Option<f64>,
    pub price_after_physical: Option<f64>,
    pub price_after_issues: Option<f64>,
    pub price_after_accessories: Option<f64>,
    pub price_after_warranty: Option<f64>,
    pub selected_lenses: Option<Vec<String>>,
    #[serde(default)]
    pub has_additional_lens: bool,
}

impl QuoteSnapshot {
    /// Last-present stage price in chain order, clamped at zero.
    pub fn final_price(&self) -> f64 {
        let last = [
            self.price_after_warranty,
            self.price_after_accessories,
            self.price_after_issues,
            self.price_after_physical,
            self.price_after_lenses,
            self.price_after_assessment,
        ]
        .into_iter()
        .flatten()
        .next()
        .unwrap_or(self.original_quote_price);
        pricing::clamp_price(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::{Accessory, AssessmentQuestion, ConditionGroup, ConditionOption};

    fn phone_config() -> CategoryConfig {
        CategoryConfig {
            display_name: "Phone".to_string(),
            assessment_questions: vec![AssessmentQuestion {
                id: "screenCondition".to_string(),
                text: String::new(),
                instruction: String::new(),
                deduction: 0.25,
                is_lens_question: false,
            }],
            physical_conditions: vec![ConditionGroup {
                id: "display".to_string(),
                label: "Display".to_string(),
                options: vec![ConditionOption {
                    id: "display_cracked".to_string(),
                    label: "Cracked glass".to_string(),
                    deduction: 0.3,
                }],
            }],
            functional_issues: Vec::new(),
            accessories: vec![
                Accessory {
                    id: "box".to_string(),
                    label: "Original box".to_string(),
                    bonus: 500.0,
                },
                Accessory {
                    id: "charger".to_string(),
                    label: "Original charger".to_string(),
                    bonus: 800.0,
                },
            ],
            warranty_bonus: 1_500.0,
        }
    }

    fn answered(id: &str, value: bool) -> HashMap<String, bool> {
        let mut answers = HashMap::new();
        answers.insert(id.to_string(), value);
        answers
    }

    #[test]
    fn full_wizard_run_matches_worked_example() {
        let config = phone_config();
        let mut session =
            ValuationSession::new("Apple", "iPhone 13", DeviceCategory::Phone, 60_000.0);

        session.record_assessment(&config, answered("screenCondition", false));
        assert_eq!(session.price_after_assessment, Some(45_000.0));

        let mut selections = HashMap::new();
        selections.insert("display".to_string(), "display_cracked".to_string());
        session.record_physical(&config, selections);
        assert_eq!(session.price_after_physical, Some(27_000.0));

        let selected: HashSet<String> = ["box".to_string(), "charger".to_string()]
            .into_iter()
            .collect();
        session.record_accessories(&config, selected);
        assert_eq!(session.final_price(), 28_300.0);

        let rows = session.breakdown();
        assert_eq!(rows.len(), 4);
        let stage_sum: f64 = rows.iter().skip(1).map(|r| r.delta).sum();
        assert_eq!(stage_sum, session.final_price() - 60_000.0);
    }

    #[test]
    fn stage_recompute_is_idempotent() {
        let config = phone_config();
        let mut session =
            ValuationSession::new("Apple", "iPhone 13", DeviceCategory::Phone, 60_000.0);

        session.record_assessment(&config, answered("screenCondition", false));
        let first = session.price_after_assessment;
        session.record_assessment(&config, answered("screenCondition", false));
        assert_eq!(session.price_after_assessment, first);
    }

    #[test]
    fn skipped_stages_do_not_break_precedence() {
        let config = phone_config();
        let mut session =
            ValuationSession::new("Apple", "iPhone 13", DeviceCategory::Phone, 60_000.0);

        // Jump straight to accessories; input falls back to the original.
        session.record_accessories(&config, ["box".to_string()].into_iter().collect());
        assert_eq!(session.final_price(), 60_500.0);

        session.record_warranty(&config, true);
        assert_eq!(session.final_price(), 62_000.0);
    }

    #[test]
    fn final_price_clamps_at_zero() {
        let config = CategoryConfig {
            assessment_questions: vec![AssessmentQuestion {
                id: "powerOn".to_string(),
                text: String::new(),
                instruction: String::new(),
                deduction: 1.5,
                is_lens_question: false,
            }],
            ..phone_config()
        };
        let mut session = ValuationSession::new("Acme", "Brick", DeviceCategory::Phone, 10_000.0);
        session.record_assessment(&config, answered("powerOn", false));

        assert_eq!(session.price_after_assessment, Some(-5_000.0));
        assert_eq!(session.final_price(), 0.0);
    }

    #[test]
    fn variant_multipliers_scale_the_base() {
        let product = Product {
            id: "prod-1".to_string(),
            brand: "Samsung".to_string(),
            model: "Galaxy S21".to_string(),
            category: DeviceCategory::Phone,
            subcategory: None,
            image_url: None,
            base_price: Some(40_000.0),
        };
        let variants = VariantSet {
            storage: vec![crate::domain::config::VariantOption {
                value: "256".to_string(),
                label: "256 GB".to_string(),
                multiplier: 1.1,
            }],
            ram: vec![crate::domain::config::VariantOption {
                value: "12".to_string(),
                label: "12 GB".to_string(),
                multiplier: 1.05,
            }],
        };

        let session = ValuationSession::from_product(&product, &variants, Some("256"), Some("12"));
        assert_eq!(session.original_quote_price, 40_000.0 * (1.1 * 1.05));

        let missing_price = Product {
            base_price: None,
            ..product
        };
        let zeroed = ValuationSession::from_product(&missing_price, &variants, None, None);
        assert_eq!(zeroed.original_quote_price, 0.0);
    }

    #[test]
    fn snapshot_round_trips_with_document_field_names() {
        let config = phone_config();
        let mut session =
            ValuationSession::new("Apple", "iPhone 13", DeviceCategory::Phone, 60_000.0);
        session.record_assessment(&config, answered("screenCondition", true));
        session.record_warranty(&config, true);

        let snapshot = session.to_snapshot();
        assert_eq!(snapshot.final_price(), session.final_price());

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["brandName"], "Apple");
        assert_eq!(json["originalQuotePrice"], 60_000.0);
        assert_eq!(json["priceAfterWarranty"], 61_500.0);
        assert_eq!(json["category"], "phone");
    }

    #[test]
    fn lens_selection_only_accepts_offered_lenses() {
        let mut session =
            ValuationSession::new("Canon", "EOS 90D", DeviceCategory::Dslr, 50_000.0);
        let offered = vec![CompatibleLens {
            id: "lens-1".to_string(),
            name: "Canon EF 50mm f/1.8 STM".to_string(),
            bonus: 1_575.0,
            mount: "apscEFS".to_string(),
            price: Some(10_500.0),
        }];

        session.record_lenses(
            &offered,
            &["lens-1".to_string(), "lens-unknown".to_string()],
        );
        assert_eq!(session.selected_lenses, vec!["lens-1".to_string()]);
        assert_eq!(session.price_after_lenses, Some(51_575.0));
    }
}
