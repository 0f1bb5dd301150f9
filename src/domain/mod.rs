//! Domain logic for device valuation lives here.

pub mod config;
pub mod entities;
pub mod lens_match;
pub mod pricing;
pub mod request;
pub mod session;

#[allow(unused_imports)]
pub use config::{
    Accessory, AssessmentQuestion, CategoryConfig, ConditionGroup, ConditionOption,
    FunctionalIssue, MountRules, MountTable, VariantEntry, VariantOption, VariantSet, VariantTable,
};
#[allow(unused_imports)]
pub use entities::{
    CompatibleLens, CustomerContact, DeviceCategory, IssueOverrides, Lens, PickupSchedule, Product,
};
#[allow(unused_imports)]
pub use lens_match::{
    compatible_lenses, filter_catalog, is_compatible, lens_bonus, normalize_brand, resolve_mount,
};
#[allow(unused_imports)]
pub use pricing::{
    apply_accessories, apply_assessment, apply_issues, apply_lenses, apply_physical,
    apply_warranty, breakdown, clamp_price, BreakdownRow, RowKind,
};
#[allow(unused_imports)]
pub use request::{NotificationEvent, PickupRequest, RequestStatus, StatusError};
#[allow(unused_imports)]
pub use session::{QuoteSnapshot, ValuationSession};
