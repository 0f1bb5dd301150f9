//! End-to-end wizard runs against the embedded configuration tables.

use std::collections::{HashMap, HashSet};

use worthyten_valuation::domain::{compatible_lenses, RowKind};
use worthyten_valuation::util::assets;
use worthyten_valuation::{
    CustomerContact, DeviceCategory, PickupRequest, PickupSchedule, RequestStatus,
    ValuationSession,
};

fn answers(pairs: &[(&str, bool)]) -> HashMap<String, bool> {
    pairs
        .iter()
        .map(|(id, value)| (id.to_string(), *value))
        .collect()
}

fn ids(values: &[&str]) -> HashSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[test]
fn phone_wizard_produces_the_documented_quote() {
    let config = assets::category_config("phone").expect("phone config embedded");
    let mut session = ValuationSession::new("Apple", "iPhone 13", DeviceCategory::Phone, 60_000.0);

    session.record_assessment(config, answers(&[("screenCondition", false)]));
    assert_eq!(session.price_after_assessment, Some(45_000.0));

    let mut selections = HashMap::new();
    selections.insert("display".to_string(), "display_cracked".to_string());
    session.record_physical(config, selections);
    assert_eq!(session.price_after_physical, Some(27_000.0));

    session.record_accessories(config, ids(&["box", "charger"]));
    assert_eq!(session.final_price(), 28_300.0);

    let rows = session.breakdown();
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec!["Base", "Assessment", "Physical Condition", "Accessories"]
    );
    assert_eq!(rows[1].delta, -15_000.0);
    assert_eq!(rows[2].delta, -18_000.0);
    assert_eq!(rows[3].delta, 1_300.0);

    let stage_sum: f64 = rows.iter().skip(1).map(|r| r.delta).sum();
    assert_eq!(stage_sum, session.final_price() - session.original_quote_price);
}

#[test]
fn dslr_wizard_runs_every_stage_including_lenses() {
    let config = assets::category_config("dslr").expect("dslr config embedded");
    let mut session = ValuationSession::new("Canon", "EOS 90D", DeviceCategory::Dslr, 55_000.0);

    session.record_assessment(
        config,
        answers(&[
            ("powerOn", true),
            ("autofocusWorks", true),
            ("sensorClean", false),
            ("additionalLens", true),
        ]),
    );
    assert!(session.has_additional_lens);
    assert_eq!(session.price_after_assessment, Some(48_400.0));

    let offered = compatible_lenses("Canon", "EOS 90D");
    assert!(offered.iter().any(|l| l.name.contains("EF-S 18-55mm")));
    assert!(offered.iter().all(|l| !l.name.contains("EF-M")));

    session.record_lenses(&offered, &["lens_canon_ef_50_f18".to_string()]);
    assert_eq!(session.price_after_lenses, Some(49_975.0));

    let mut selections = HashMap::new();
    selections.insert("body".to_string(), "body_minor_wear".to_string());
    session.record_physical(config, selections);
    assert_eq!(session.price_after_physical, Some(46_675.0));

    // No functional issues selected: the stage records but changes nothing,
    // so the breakdown must not show a row for it.
    session.record_issues(config, HashSet::new(), None);
    assert_eq!(session.price_after_issues, Some(46_675.0));

    session.record_accessories(config, ids(&["bag"]));
    assert_eq!(session.price_after_accessories, Some(47_375.0));

    session.record_warranty(config, true);
    assert_eq!(session.final_price(), 49_875.0);

    let rows = session.breakdown();
    let labels: Vec<&str> = rows.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(
        labels,
        vec![
            "Base",
            "Assessment",
            "Lenses",
            "Physical Condition",
            "Accessories",
            "Warranty"
        ]
    );
    assert!(rows
        .iter()
        .filter(|r| r.kind == RowKind::Deduction)
        .all(|r| r.delta < 0.0));

    let stage_sum: f64 = rows.iter().skip(1).map(|r| r.delta).sum();
    assert_eq!(stage_sum, session.final_price() - session.original_quote_price);
}

#[test]
fn full_frame_and_crop_bodies_disagree_only_on_ef_s_glass() {
    let crop: HashSet<String> = compatible_lenses("Canon", "EOS 90D")
        .into_iter()
        .map(|l| l.name)
        .collect();
    let full_frame: HashSet<String> = compatible_lenses("Canon", "EOS 5D Mark IV")
        .into_iter()
        .map(|l| l.name)
        .collect();

    assert!(full_frame.is_subset(&crop));
    let crop_only: Vec<&String> = crop.difference(&full_frame).collect();
    assert!(!crop_only.is_empty());
    assert!(crop_only.iter().all(|name| name.contains("EF-S")));
}

#[test]
fn unknown_and_fixed_lens_inputs_yield_empty_results() {
    assert!(compatible_lenses("Pentax", "K-1").is_empty());
    assert!(compatible_lenses("Canon", "PowerShot G7 X").is_empty());
    assert!(compatible_lenses("Nikon", "Coolpix P1000").is_empty());
    assert!(compatible_lenses("Canon", "Typewriter").is_empty());
}

#[test]
fn booking_freezes_the_quote_and_starts_the_status_machine() {
    let config = assets::category_config("phone").expect("phone config embedded");
    let product_base = 32_000.0;
    let mut session =
        ValuationSession::new("Samsung", "Galaxy S21", DeviceCategory::Phone, product_base);
    session.record_assessment(config, answers(&[("powerOn", true), ("calls", true)]));
    session.record_accessories(config, ids(&["charger"]));

    let request = PickupRequest::book(
        &session,
        CustomerContact {
            name: "Ravi Kumar".to_string(),
            phone: "+91 90000 00000".to_string(),
            email: Some("ravi@example.com".to_string()),
            address: "4 Lake View Road".to_string(),
            city: "Chennai".to_string(),
            pincode: "600001".to_string(),
        },
        PickupSchedule {
            date: "2024-04-02".to_string(),
            slot: "1 PM - 4 PM".to_string(),
        },
        "user-7",
    );

    assert_eq!(request.final_price, 32_800.0);
    assert_eq!(request.status, RequestStatus::New);
    assert_eq!(request.device.final_price(), request.final_price);

    let mut request = request;
    request
        .transition(RequestStatus::Completed, None)
        .expect("new requests may complete directly");
    let event = request.notification();
    assert_eq!(event.status, RequestStatus::Completed);
    assert!(event.body.contains("32800"));
}

#[test]
fn variant_tables_scale_quotes_by_model_match() {
    let variants = assets::variant_set("phone", "Samsung Galaxy S21");
    assert_eq!(variants.storage_multiplier("256"), 1.07);
    assert_eq!(variants.ram_multiplier("12"), 1.05);

    // Unknown model gets the category default; unknown value is neutral.
    let fallback = assets::variant_set("phone", "Fairphone 4");
    assert_eq!(fallback.storage_multiplier("999"), 1.0);
    assert!(!fallback.storage.is_empty());

    // DSLRs show no variant selectors at all.
    let dslr = assets::variant_set("dslr", "EOS 90D");
    assert!(dslr.storage.is_empty() && dslr.ram.is_empty());
}
