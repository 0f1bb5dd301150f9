//! The valuation price engine.
//!
//! Every stage consumes the previous stage's output price. Percentage
//! deductions are always fractions of the *original* base price, applied
//! additively; they never compound against the running total. Stages
//! with no applicable selections return their input unchanged, which is
//! what lets the breakdown detect no-op stages by exact comparison.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::config::{Accessory, AssessmentQuestion, ConditionGroup, FunctionalIssue};
use super::entities::{CompatibleLens, IssueOverrides};

/// Treat absent and non-numeric catalog values as zero.
fn numeric(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Assessment stage: subtract `deduction * base` for every question
/// answered negatively. Lens-gate questions never deduct. Unanswered
/// questions deduct nothing.
pub fn apply_assessment(
    base: f64,
    questions: &[AssessmentQuestion],
    answers: &HashMap<String, bool>,
) -> f64 {
    let mut price = base;
    for question in questions {
        if question.is_lens_question {
            continue;
        }
        if let Some(false) = answers.get(&question.id).copied() {
            price -= numeric(question.deduction) * base;
        }
    }
    price
}

/// Lens stage: each selected lens adds its resolved bonus.
pub fn apply_lenses(price: f64, lenses: &[CompatibleLens]) -> f64 {
    lenses
        .iter()
        .fold(price, |acc, lens| acc + numeric(lens.bonus))
}

/// Physical-condition stage: per group, the single selected option's
/// `deduction * base` is subtracted. Unknown groups or option ids are
/// ignored.
pub fn apply_physical(
    price: f64,
    base: f64,
    groups: &[ConditionGroup],
    selections: &HashMap<String, String>,
) -> f64 {
    let mut price = price;
    for group in groups {
        let Some(option_id) = selections.get(&group.id) else {
            continue;
        };
        if let Some(option) = group.options.iter().find(|o| &o.id == option_id) {
            price -= numeric(option.deduction) * base;
        }
    }
    price
}

/// Functional-issues stage. A per-product override amount (flat) wins over
/// the category default fraction for the same issue id.
pub fn apply_issues(
    price: f64,
    base: f64,
    issues: &[FunctionalIssue],
    selected: &HashSet<String>,
    overrides: Option<&IssueOverrides>,
) -> f64 {
    let mut price = price;
    for issue in issues {
        if !selected.contains(&issue.id) {
            continue;
        }
        let amount = overrides
            .and_then(|table| table.amount(&issue.id))
            .unwrap_or_else(|| numeric(issue.deduction) * base);
        price -= amount;
    }
    price
}

/// Accessories stage: flat bonuses only.
pub fn apply_accessories(price: f64, accessories: &[Accessory], selected: &HashSet<String>) -> f64 {
    accessories
        .iter()
        .filter(|a| selected.contains(&a.id))
        .fold(price, |acc, a| acc + numeric(a.bonus))
}

/// Warranty stage: one flat bonus when the device is still under warranty.
pub fn apply_warranty(price: f64, bonus: f64, has_warranty: bool) -> f64 {
    if has_warranty {
        price + numeric(bonus)
    } else {
        price
    }
}

/// Quotes never go below zero, whatever the deductions added up to.
pub fn clamp_price(price: f64) -> f64 {
    if price.is_finite() {
        price.max(0.0)
    } else {
        0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Base,
    Bonus,
    Deduction,
}

/// One line of the itemized quote breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub label: String,
    /// Signed amount; positive for the base row and bonuses.
    pub delta: f64,
    pub kind: RowKind,
}

/// Build the itemized breakdown by diffing consecutive stage prices.
///
/// `stages` is the ordered `(label, price_after_stage)` chain; absent
/// stages and stages whose price equals the prior price emit no row.
/// The sum of all non-base deltas equals `final - base` exactly.
pub fn breakdown(base: f64, stages: &[(&str, Option<f64>)]) -> Vec<BreakdownRow> {
    let mut rows = vec![BreakdownRow {
        label: "Base".to_string(),
        delta: base,
        kind: RowKind::Base,
    }];

    let mut previous = base;
    for (label, price) in stages {
        let Some(price) = price else {
            continue;
        };
        let delta = price - previous;
        if delta != 0.0 {
            rows.push(BreakdownRow {
                label: (*label).to_string(),
                delta,
                kind: if delta > 0.0 {
                    RowKind::Bonus
                } else {
                    RowKind::Deduction
                },
            });
        }
        previous = *price;
    }

    rows
}
