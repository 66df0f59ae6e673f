use super::*;
use crate::chain::ConnectionKind;
use crate::testkit::eve_db;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;

fn signature(extra: Value) -> Value {
    let mut base = json!({
        "id": "uuid-1",
        "name": "Unknown",
        "type": "B274",
        "group": "Wormhole",
        "kind": "Cosmic Signature",
        "eve_id": "ABC-123",
        "solar_system_id": 30000142,
        "linked_system_id": 31000001,
        "custom_info": "{\"time_status\": 1, \"mass_status\": 1}",
        "updated_at": (Utc::now() - Duration::minutes(6))
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    });
    base.as_object_mut()
        .unwrap()
        .extend(extra.as_object().unwrap().clone());
    base
}

#[test]
fn test_signature_translation() {
    let db = eve_db();
    let record = connection_from_value(&signature(json!({})), "wd-id", "Wanderer", &db).unwrap();

    assert_eq!(record.system_a, 30000142);
    assert_eq!(record.system_b, 31000001);
    match &record.kind {
        ConnectionKind::Wormhole(info) => {
            assert_eq!(info.sig_a, "ABC-123");
            assert_eq!(info.code_a, "B274");
            assert_eq!(info.code_b, "K162");
            assert_eq!(info.size, WormholeSize::Large);
            assert_eq!(info.life, WormholeTimespan::Stable);
            assert_eq!(info.mass, WormholeMassspan::Stable);
            assert_eq!(info.age_hours, 0.1);
        }
        other => panic!("expected wormhole, got {:?}", other),
    }
}

#[test]
fn test_non_wormhole_groups_are_ignored() {
    let db = eve_db();
    assert!(connection_from_value(
        &signature(json!({"group": "Combat Site"})),
        "wd-id",
        "Wanderer",
        &db
    )
    .is_none());
}

#[test]
fn test_unlinked_signature_is_ignored() {
    let db = eve_db();
    assert!(connection_from_value(
        &signature(json!({"linked_system_id": null})),
        "wd-id",
        "Wanderer",
        &db
    )
    .is_none());
}

#[test]
fn test_custom_info_statuses() {
    let db = eve_db();
    let record = connection_from_value(
        &signature(json!({"custom_info": "{\"time_status\": 2, \"mass_status\": 3}"})),
        "wd-id",
        "Wanderer",
        &db,
    )
    .unwrap();
    match &record.kind {
        ConnectionKind::Wormhole(info) => {
            assert_eq!(info.life, WormholeTimespan::Critical);
            assert_eq!(info.mass, WormholeMassspan::Critical);
        }
        other => panic!("expected wormhole, got {:?}", other),
    }

    // already-decoded object form
    let record = connection_from_value(
        &signature(json!({"custom_info": {"time_status": 1, "mass_status": 2}})),
        "wd-id",
        "Wanderer",
        &db,
    )
    .unwrap();
    match &record.kind {
        ConnectionKind::Wormhole(info) => {
            assert_eq!(info.life, WormholeTimespan::Stable);
            assert_eq!(info.mass, WormholeMassspan::Destab);
        }
        other => panic!("expected wormhole, got {:?}", other),
    }

    // missing custom_info defaults to stable
    let record = connection_from_value(
        &signature(json!({"custom_info": null})),
        "wd-id",
        "Wanderer",
        &db,
    )
    .unwrap();
    match &record.kind {
        ConnectionKind::Wormhole(info) => {
            assert_eq!(info.life, WormholeTimespan::Stable);
            assert_eq!(info.mass, WormholeMassspan::Stable);
        }
        other => panic!("expected wormhole, got {:?}", other),
    }
}

#[test]
fn test_unknown_type_yields_placeholders() {
    let db = eve_db();
    let record = connection_from_value(
        &signature(json!({"type": null})),
        "wd-id",
        "Wanderer",
        &db,
    )
    .unwrap();
    match &record.kind {
        ConnectionKind::Wormhole(info) => {
            assert_eq!(info.code_a, WTYPE_UNKNOWN);
            assert_eq!(info.code_b, WTYPE_UNKNOWN);
            // high-sec <-> C2 pair: large
            assert_eq!(info.size, WormholeSize::Large);
        }
        other => panic!("expected wormhole, got {:?}", other),
    }
}

#[test]
fn test_response_payload_shape() {
    let raw = json!({
        "data": [signature(json!({})), {"group": "Data Site"}]
    });
    let response: WandererResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(response.data.len(), 2);
}

#[test]
fn test_config_round_trip() {
    let source = WandererSource::create(
        "Wanderer",
        "wanderer.example.com",
        "map-1",
        "token-1",
    );
    assert_eq!(source.url, "https://wanderer.example.com");

    let entry = SourceEntry {
        id: source.id().to_string(),
        source_type: source.source_type(),
        name: source.name().to_string(),
        enabled: source.enabled(),
        config: source.to_config(),
    };
    let rebuilt = WandererSource::from_entry(&entry).unwrap();
    assert_eq!(rebuilt.id(), source.id());
    assert_eq!(rebuilt.to_config(), source.to_config());
}
