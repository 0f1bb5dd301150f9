//! WorthyTen device trade-in valuation.
//!
//! Two computational cores, both pure functions over catalog data:
//!
//! - the price engine ([`domain::pricing`], driven through
//!   [`domain::session::ValuationSession`]): a base catalog price adjusted
//!   by assessment, physical-condition and functional-issue deductions and
//!   by accessory, lens and warranty bonuses, with an itemized breakdown;
//! - the lens compatibility matcher ([`domain::lens_match`]): camera model
//!   to mount group by longest-substring rules, then token filtering of a
//!   lens catalog.
//!
//! Around them sit the catalog-service client with its caches
//! ([`infra`]) and the embedded configuration tables ([`util::assets`]).
//! Both cores follow a no-throw policy: unknown categories, brands and
//! models degrade to empty results, never to errors.

pub mod domain;
pub mod infra;
pub mod util;

pub use domain::{
    compatible_lenses, BreakdownRow, CategoryConfig, CompatibleLens, CustomerContact,
    DeviceCategory, Lens, NotificationEvent, PickupRequest, PickupSchedule, QuoteSnapshot,
    RequestStatus, RowKind, ValuationSession,
};
pub use infra::{CatalogClient, CatalogError};
