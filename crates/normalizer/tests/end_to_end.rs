//! Reproduces the literal end-to-end scenarios from spec §8, using the
//! fx_table `{ base: "USD", rates: { USD: 1, EUR: 1.1, GBP: 1.25, JPY: 0.007 } }`.

use std::collections::HashMap;

use econ_core::{FxTable, NormalizeConfig, Scale, InputRecord};

fn fx_table() -> FxTable {
    FxTable::new(
        "USD",
        HashMap::from([
            ("USD".to_string(), 1.0),
            ("EUR".to_string(), 1.1),
            ("GBP".to_string(), 1.25),
            ("JPY".to_string(), 0.007),
        ]),
        HashMap::new(),
    )
    .unwrap()
}

fn config() -> NormalizeConfig {
    NormalizeConfig::builder()
        .target_currency("USD")
        .target_magnitude(Scale::Millions)
        .target_time_scale(econ_core::TimeBasis::Month)
        .build()
        .unwrap()
}

fn record(id: &str, value: f64, unit: &str) -> InputRecord {
    InputRecord {
        id: id.to_string(),
        value,
        unit: unit.to_string(),
        periodicity: None,
        scale: None,
        currency_code: None,
        category_group: None,
        sample_values: vec![],
        name: None,
    }
}

#[test]
fn scenario_1_usd_million_passes_through() {
    let records = vec![record("1", 25000.0, "USD Million")];
    let (normalized, _) = normalizer::normalize_batch(&records, &config(), &fx_table(), None).unwrap();
    assert!((normalized[0].normalized_value - 25000.0).abs() < 1e-9);
    assert_eq!(normalized[0].normalized_unit, "USD millions");
    assert!(normalized[0].explain.as_ref().unwrap().fx.is_none());
}

#[test]
fn scenario_2_eur_billion_converts_to_usd_millions() {
    let records = vec![record("2", 5.0, "EUR Billion")];
    let (normalized, _) = normalizer::normalize_batch(&records, &config(), &fx_table(), None).unwrap();
    assert!((normalized[0].normalized_value - 5500.0).abs() < 1e-6);
    assert_eq!(normalized[0].normalized_unit, "USD millions");
    let explain = normalized[0].explain.as_ref().unwrap();
    assert_eq!(explain.fx.as_ref().unwrap().rate, 1.1);
    assert_eq!(explain.magnitude.as_ref().unwrap().factor, 1000.0);
}

#[test]
fn scenario_3_usd_per_year_rescales_to_millions_per_month() {
    let records = vec![record("3", 54000.0, "USD per year")];
    let (normalized, _) = normalizer::normalize_batch(&records, &config(), &fx_table(), None).unwrap();
    assert!((normalized[0].normalized_value - 0.004502).abs() < 1e-5);
    assert_eq!(normalized[0].normalized_unit, "USD millions per month");
}

#[test]
fn scenario_4_jpy_per_month_converts_and_rescales() {
    let records = vec![record("4", 280000.0, "JPY per month")];
    let (normalized, _) = normalizer::normalize_batch(&records, &config(), &fx_table(), None).unwrap();
    assert!((normalized[0].normalized_value - 0.00196).abs() < 1e-6);
}

#[test]
fn scenario_5_million_items_is_counts_expanded_to_ones() {
    let records = vec![record("5", 2.5, "Million items")];
    let (normalized, _) = normalizer::normalize_batch(&records, &config(), &fx_table(), None).unwrap();
    assert!((normalized[0].normalized_value - 2_500_000.0).abs() < 1e-6);
    assert_eq!(normalized[0].normalized_unit, "ones");
    assert_eq!(normalized[0].domain, econ_core::Domain::Counts);
}

#[test]
fn scenario_6_percent_is_untouched() {
    let records = vec![record("6", 5.2, "percent")];
    let (normalized, _) = normalizer::normalize_batch(&records, &config(), &fx_table(), None).unwrap();
    assert_eq!(normalized[0].normalized_value, 5.2);
    assert_eq!(normalized[0].normalized_unit, "%");
    assert_eq!(normalized[0].domain, econ_core::Domain::Percentages);
}

#[test]
fn full_batch_preserves_order_and_every_scenario_succeeds() {
    let records = vec![
        record("1", 25000.0, "USD Million"),
        record("2", 5.0, "EUR Billion"),
        record("3", 54000.0, "USD per year"),
        record("4", 280000.0, "JPY per month"),
        record("5", 2.5, "Million items"),
        record("6", 5.2, "percent"),
    ];
    let (normalized, report) = normalizer::normalize_batch(&records, &config(), &fx_table(), None).unwrap();
    assert_eq!(report.records_processed, 6);
    assert_eq!(report.records_failed, 0);
    assert_eq!(
        normalized.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
        vec!["1", "2", "3", "4", "5", "6"]
    );
}
