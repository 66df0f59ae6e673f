use super::*;
use crate::chain::ConnectionKind;
use crate::testkit::eve_db;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;

fn recent() -> String {
    (Utc::now() - Duration::minutes(30)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[test]
fn test_wrapped_response_shape() {
    let raw = json!({
        "connections": [
            {"source": "30000142", "target": "31000001"},
            {"source": 30002659, "target": 30002661}
        ]
    });
    let response: PathfinderResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(response.connections().len(), 2);
}

#[test]
fn test_bare_list_response_shape() {
    let raw = json!([{"source": "30000142", "target": "31000001"}]);
    let response: PathfinderResponse = serde_json::from_value(raw).unwrap();
    assert_eq!(response.connections().len(), 1);
}

#[test]
fn test_connection_translation() {
    let db = eve_db();
    let raw = json!({
        "source": "30000142",
        "target": "31000001",
        "source_sig": "ABC-123",
        "target_sig": "DEF-456",
        "type": "B274",
        "life": "stable",
        "mass": "stable",
        "updated_at": recent()
    });

    let record = connection_from_value(&raw, "pf-id", "Pathfinder", &db).unwrap();
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
            assert_eq!(info.age_hours, 0.5);
        }
        other => panic!("expected wormhole, got {:?}", other),
    }
}

#[test]
fn test_health_substring_mapping() {
    let db = eve_db();
    let raw = json!({
        "source": 30000142,
        "target": 31000001,
        "type": "H296",
        "life": "critical",
        "mass": "destabilized"
    });

    let record = connection_from_value(&raw, "pf-id", "Pathfinder", &db).unwrap();
    match &record.kind {
        ConnectionKind::Wormhole(info) => {
            assert_eq!(info.life, WormholeTimespan::Critical);
            assert_eq!(info.mass, WormholeMassspan::Destab);
            assert_eq!(info.size, WormholeSize::XLarge);
            // no updated_at: a fresh record
            assert_eq!(info.age_hours, 0.0);
        }
        other => panic!("expected wormhole, got {:?}", other),
    }
}

#[test]
fn test_explicit_size_word_beats_class_inference() {
    let db = eve_db();
    let raw = json!({
        "source": 30000142,
        "target": 31000001,
        "type": "X999",
        "size": "xlarge"
    });

    let record = connection_from_value(&raw, "pf-id", "Pathfinder", &db).unwrap();
    match &record.kind {
        ConnectionKind::Wormhole(info) => assert_eq!(info.size, WormholeSize::XLarge),
        other => panic!("expected wormhole, got {:?}", other),
    }
}

#[test]
fn test_unknown_code_and_size_falls_back_to_class_pair() {
    let db = eve_db();
    let raw = json!({
        "source": 30000142,
        "target": 31000001,
        "type": "X999"
    });

    let record = connection_from_value(&raw, "pf-id", "Pathfinder", &db).unwrap();
    match &record.kind {
        // high-sec <-> C2 caps at large
        ConnectionKind::Wormhole(info) => assert_eq!(info.size, WormholeSize::Large),
        other => panic!("expected wormhole, got {:?}", other),
    }
}

#[test]
fn test_missing_ids_are_skipped() {
    let db = eve_db();
    assert!(connection_from_value(&json!({}), "pf-id", "Pathfinder", &db).is_none());
    assert!(connection_from_value(
        &json!({"source": 0, "target": 30000142}),
        "pf-id",
        "Pathfinder",
        &db
    )
    .is_none());
}

#[test]
fn test_target_url_shapes() {
    let source = PathfinderSource::create("PF", "pathfinder.example.com", "tok");
    assert_eq!(
        source.target_url(),
        "https://pathfinder.example.com/api/connections"
    );

    let source = PathfinderSource::create("PF", "https://host/exports/map.json", "tok");
    assert_eq!(source.target_url(), "https://host/exports/map.json");
}

#[test]
fn test_config_round_trip() {
    let source = PathfinderSource::create("PF", "pathfinder.example.com", "tok");
    let entry = SourceEntry {
        id: source.id().to_string(),
        source_type: source.source_type(),
        name: source.name().to_string(),
        enabled: source.enabled(),
        config: source.to_config(),
    };
    let rebuilt = PathfinderSource::from_entry(&entry).unwrap();
    assert_eq!(rebuilt.id(), source.id());
    assert_eq!(rebuilt.to_config(), source.to_config());
}
