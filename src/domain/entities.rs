use serde::{Deserialize, Serialize};

/// Device categories served by the trade-in wizard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCategory {
    #[default]
    Phone,
    Laptop,
    #[serde(rename = "ipad")]
    IPad,
    Dslr,
}

impl DeviceCategory {
    /// Key used by the config tables and the catalog service.
    pub fn key(&self) -> &'static str {
        match self {
            DeviceCategory::Phone => "phone",
            DeviceCategory::Laptop => "laptop",
            DeviceCategory::IPad => "ipad",
            DeviceCategory::Dslr => "dslr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeviceCategory::Phone => "Phone",
            DeviceCategory::Laptop => "Laptop",
            DeviceCategory::IPad => "iPad",
            DeviceCategory::Dslr => "DSLR / Mirrorless",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "phone" => Some(DeviceCategory::Phone),
            "laptop" => Some(DeviceCategory::Laptop),
            "ipad" => Some(DeviceCategory::IPad),
            "dslr" | "lens" | "dslr/lens" => Some(DeviceCategory::Dslr),
            _ => None,
        }
    }
}

/// A catalog product: one sellable device model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub category: DeviceCategory,
    /// "Lens" marks entries belonging to the lens catalog rather than bodies.
    pub subcategory: Option<String>,
    pub image_url: Option<String>,
    /// Catalog base price before variant multipliers. Absent or non-numeric
    /// upstream values stay `None` rather than poisoning the quote.
    pub base_price: Option<f64>,
}

/// A lens from the lens catalog (built-in asset or catalog service).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lens {
    pub id: String,
    pub name: String,
    pub brand: String,
    #[serde(default)]
    pub mount: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// A lens that passed the compatibility filter, with its trade-in bonus
/// resolved. This is the shape handed to the wizard's lens step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompatibleLens {
    pub id: String,
    pub name: String,
    pub bonus: f64,
    pub mount: String,
    pub price: Option<f64>,
}

/// Per-product overrides for functional-issue deductions, maintained by
/// admins on the catalog service. Amounts are flat currency values and
/// take precedence over the category's default fractions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueOverrides {
    pub product_id: String,
    #[serde(default)]
    pub amounts: std::collections::HashMap<String, f64>,
}

impl IssueOverrides {
    pub fn amount(&self, issue_id: &str) -> Option<f64> {
        self.amounts.get(issue_id).copied().filter(|v| v.is_finite())
    }
}

/// Customer contact and address block captured at booking time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub pincode: String,
}

/// Requested pickup window.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupSchedule {
    /// Calendar date in YYYY-MM-DD form, as picked in the booking modal.
    pub date: String,
    /// Slot label, e.g. "10 AM - 1 PM".
    pub slot: String,
}
