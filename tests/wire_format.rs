use chrono::{TimeZone, Utc};
use voltrade::application::session::{PurchaseOutcome, TickRecord};
use voltrade::domain::energy::{ForecastPoint, ObservationRecord, SOURCE_SOLAR, SOURCE_WIND};
use voltrade::domain::recommendation::{Recommendation, StorageStats};
use voltrade::domain::storage::{EnergyStore, StorageSnapshot};

fn snapshot() -> StorageSnapshot {
    let priority = vec![SOURCE_WIND.to_string(), SOURCE_SOLAR.to_string()];
    EnergyStore::new(&priority, 12.0, 30.0).unwrap().snapshot()
}

#[test]
fn test_tick_record_wire_shape() {
    let record = TickRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap(),
        observed: ObservationRecord::new(1.5, 0.5, 2.0),
        predicted_next: Some(ForecastPoint::new(1.2, 0.8, 1.9)),
        storage: snapshot(),
        recommendation: Some(
            Recommendation::buy(5.0, "deficit ahead")
                .with_confidence(0.9)
                .with_stats(StorageStats::flat(12.0)),
        ),
    };

    let json = serde_json::to_value(&record).unwrap();

    // Observed readings keep their upstream field names
    assert_eq!(json["observed"]["P_wind"], 1.5);
    assert_eq!(json["observed"]["P_solar"], 0.5);
    assert_eq!(json["observed"]["house_consumption"], 2.0);

    assert_eq!(json["predicted_next"]["P_wind"], 1.2);

    // Storage block
    assert_eq!(json["storage"]["total"], 12.0);
    assert_eq!(json["storage"]["capacity_max"], 30.0);
    assert_eq!(json["storage"]["reservoirs"][0]["source"], "wind");
    assert_eq!(json["storage"]["reservoirs"][0]["level"], 6.0);

    // Recommendation block
    let rec = &json["recommendation"];
    assert_eq!(rec["action"], "buy");
    assert_eq!(rec["amount"], 5.0);
    assert_eq!(rec["confidence"], 0.9);
    assert_eq!(rec["storageStats"]["current"], 12.0);
    assert_eq!(rec["storageStats"]["min_over_horizon"], 12.0);
    assert_eq!(rec["storageStats"]["max_over_horizon"], 12.0);
}

#[test]
fn test_failed_forecast_omits_optional_fields() {
    let record = TickRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap(),
        observed: ObservationRecord::new(0.0, 0.0, 1.0),
        predicted_next: None,
        storage: snapshot(),
        recommendation: None,
    };

    let json = serde_json::to_value(&record).unwrap();
    assert!(json.get("predicted_next").is_none());
    assert!(json.get("recommendation").is_none());
    assert!(json.get("observed").is_some());
    assert!(json.get("storage").is_some());
}

#[test]
fn test_purchase_outcome_wire_shape() {
    let outcome = PurchaseOutcome {
        succeeded: true,
        storage_after: 8.0,
    };

    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], true);
    // Display consumers interpolate this value directly, so it has to be
    // a bare number rather than a nested object.
    assert!(json["storage"].is_number());
    assert_eq!(json["storage"], 8.0);
    assert!(
        json.get("succeeded").is_none(),
        "rename must apply on the wire"
    );
    assert!(json.get("storage_after").is_none());
}

#[test]
fn test_timestamp_is_rfc3339() {
    let record = TickRecord {
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap(),
        observed: ObservationRecord::new(1.0, 1.0, 1.0),
        predicted_next: None,
        storage: snapshot(),
        recommendation: None,
    };
    let json = serde_json::to_value(&record).unwrap();
    let ts = json["timestamp"].as_str().unwrap();
    assert!(ts.starts_with("2024-06-01T12:30:00"));
}
