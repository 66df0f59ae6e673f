use super::*;
use crate::config::settings::Settings;
use crate::map::SolarMap;
use crate::testkit::eve_db;
use crate::upstream::{MapSource, SourceType};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Test double: a source that sleeps, then reports a fixed count.
struct SlowSource {
    id: String,
    delay_ms: u64,
    count: usize,
}

impl SlowSource {
    fn new(delay_ms: u64, count: usize) -> Self {
        Self {
            id: format!("slow-{}", delay_ms),
            delay_ms,
            count,
        }
    }
}

#[async_trait]
impl MapSource for SlowSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        "Slow"
    }

    fn set_name(&mut self, _name: String) {}

    fn enabled(&self) -> bool {
        true
    }

    fn set_enabled(&mut self, _enabled: bool) {}

    fn source_type(&self) -> SourceType {
        SourceType::EveScout
    }

    async fn test(&self) -> (bool, String) {
        (true, "ok".to_string())
    }

    async fn fetch(&self, _map: &SharedMap) -> Result<usize, crate::error::Error> {
        tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        Ok(self.count)
    }

    fn to_config(&self) -> Value {
        json!({})
    }
}

fn shared_map() -> SharedMap {
    Arc::new(Mutex::new(SolarMap::new(eve_db())))
}

#[tokio::test]
async fn test_fetch_lifecycle_events() {
    let mut manager = SourceManager::new(Settings::in_memory());
    manager.add(Box::new(SlowSource::new(10, 7)));
    let manager = Arc::new(Mutex::new(manager));

    let (processor, mut events) = NavProcessor::spawn(manager, shared_map());
    processor.request(FetchRequest::All).unwrap();

    match events.recv().await.unwrap() {
        FetchEvent::Started(FetchRequest::All) => {}
        other => panic!("expected Started, got {:?}", other),
    }
    match events.recv().await.unwrap() {
        FetchEvent::Finished(results) => {
            assert_eq!(results.get("Slow"), Some(&7));
        }
        other => panic!("expected Finished, got {:?}", other),
    }
    assert!(!processor.is_busy());
}

#[tokio::test]
async fn test_second_request_while_busy_is_rejected() {
    let mut manager = SourceManager::new(Settings::in_memory());
    manager.add(Box::new(SlowSource::new(300, 1)));
    let manager = Arc::new(Mutex::new(manager));

    let (processor, mut events) = NavProcessor::spawn(manager, shared_map());
    processor.request(FetchRequest::All).unwrap();
    assert!(processor.is_busy());

    // user-initiated surface: an explicit error
    match processor.request(FetchRequest::All) {
        Err(crate::error::Error::ProcessRunning) => {}
        other => panic!("expected ProcessRunning, got {:?}", other),
    }
    // auto-refresh surface: a silent skip
    assert!(!processor.try_request(FetchRequest::All));

    // drain: one Started, one Finished, nothing else queued
    match events.recv().await.unwrap() {
        FetchEvent::Started(_) => {}
        other => panic!("expected Started, got {:?}", other),
    }
    match events.recv().await.unwrap() {
        FetchEvent::Finished(_) => {}
        other => panic!("expected Finished, got {:?}", other),
    }
    assert!(!processor.is_busy());
    assert!(processor.try_request(FetchRequest::All));
}

#[tokio::test]
async fn test_fetch_one_targets_a_single_source() {
    let mut manager = SourceManager::new(Settings::in_memory());
    let slow = SlowSource::new(5, 3);
    let slow_id = slow.id().to_string();
    manager.add(Box::new(slow));
    manager.add(Box::new(SlowSource::new(6, 9)));
    let manager = Arc::new(Mutex::new(manager));

    let (processor, mut events) = NavProcessor::spawn(manager, shared_map());
    processor.request(FetchRequest::One(slow_id)).unwrap();

    match events.recv().await.unwrap() {
        FetchEvent::Started(FetchRequest::One(_)) => {}
        other => panic!("expected Started, got {:?}", other),
    }
    match events.recv().await.unwrap() {
        FetchEvent::Finished(results) => {
            assert_eq!(results.len(), 1);
            assert_eq!(results.get("Slow"), Some(&3));
        }
        other => panic!("expected Finished, got {:?}", other),
    }
}
