
pub mod evescout;
pub mod pathfinder;
pub mod tripwire;
pub mod wanderer;

use crate::config::settings::Settings;
use crate::error::Error;
use crate::map::SolarMap;
use crate::util::naive_now;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::{Display, EnumIter, EnumString};
use tokio::sync::Mutex;

use self::evescout::EveScoutSource;
use self::pathfinder::PathfinderSource;
use self::tripwire::TripwireSource;
use self::wanderer::WandererSource;

/// The solar map as shared between the request side and the fetch worker.
pub type SharedMap = Arc<Mutex<SolarMap>>;

/// Placeholder for a signature the upstream did not report.
pub const SIG_UNKNOWN: &str = "-------";
/// Placeholder for a wormhole type code the upstream did not report.
pub const WTYPE_UNKNOWN: &str = "----";

/// All chain-mapping service kinds. The tag routes (de)serialization.
#[derive(
    Serialize,
    Deserialize,
    Debug,
    Clone,
    Copy,
    Display,
    EnumString,
    EnumIter,
    PartialEq,
    Eq,
    Hash,
)]
pub enum SourceType {
    #[strum(serialize = "tripwire")]
    #[serde(rename = "tripwire")]
    Tripwire,
    #[strum(serialize = "pathfinder")]
    #[serde(rename = "pathfinder")]
    Pathfinder,
    #[strum(serialize = "evescout")]
    #[serde(rename = "evescout")]
    EveScout,
    #[strum(serialize = "wanderer")]
    #[serde(rename = "wanderer")]
    Wanderer,
}

/// MapSource defines how to fetch chain data from one upstream service.
#[async_trait]
pub trait MapSource: Send + Sync {
    /// Stable process-unique id; records in the connection database are
    /// tagged with it. Renaming a source must not change it.
    fn id(&self) -> &str;

    /// User-facing label. May change at any time.
    fn name(&self) -> &str;

    fn set_name(&mut self, name: String);

    fn enabled(&self) -> bool;

    fn set_enabled(&mut self, enabled: bool);

    fn source_type(&self) -> SourceType;

    /// Probe credentials / URL. Must not touch the solar map.
    async fn test(&self) -> (bool, String);

    /// Fetch upstream and add one record per reported connection.
    /// Returns the number of records added; transport or auth failure
    /// is an `Err` (the manager reports it as the `-1` sentinel).
    async fn fetch(&self, map: &SharedMap) -> Result<usize, Error>;

    /// User-editable configuration, round-trippable through the factory
    /// registered for this source type.
    fn to_config(&self) -> Value;
}

/// Persisted shape of one configured source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub name: String,
    pub enabled: bool,
    #[serde(default)]
    pub config: Value,
}

pub type SourceFactory = fn(&SourceEntry) -> Result<Box<dyn MapSource>, Error>;

#[derive(Clone, Debug, PartialEq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Fetching,
    Ok(usize),
    Error,
}

/// Per-source fetch state. `last_updated` moves only on success.
#[derive(Clone, Debug, Default)]
pub struct SourceState {
    pub status: FetchStatus,
    pub last_updated: Option<NaiveDateTime>,
}

const MAP_SOURCES_KEY: &str = "MapSources";

/// Owns the configured map sources, their persisted configuration and
/// the refresh orchestration.
pub struct SourceManager {
    sources: Vec<Box<dyn MapSource>>,
    registry: HashMap<SourceType, SourceFactory>,
    states: HashMap<String, SourceState>,
    settings: Settings,
}

impl SourceManager {
    pub fn new(settings: Settings) -> Self {
        Self {
            sources: vec![],
            registry: HashMap::new(),
            states: HashMap::new(),
            settings,
        }
    }

    pub fn register(&mut self, kind: SourceType, factory: SourceFactory) {
        self.registry.insert(kind, factory);
    }

    /// Register every built-in source kind.
    pub fn register_defaults(&mut self) {
        self.register(SourceType::Tripwire, TripwireSource::from_entry);
        self.register(SourceType::Pathfinder, PathfinderSource::from_entry);
        self.register(SourceType::EveScout, EveScoutSource::from_entry);
        self.register(SourceType::Wanderer, WandererSource::from_entry);
    }

    pub fn add(&mut self, source: Box<dyn MapSource>) {
        self.sources.push(source);
        if let Err(err) = self.save_configuration() {
            error!("Failed to save source configuration: {}", err);
        }
    }

    pub fn remove(&mut self, source_id: &str) {
        self.sources.retain(|s| s.id() != source_id);
        self.states.remove(source_id);
        if let Err(err) = self.save_configuration() {
            error!("Failed to save source configuration: {}", err);
        }
    }

    pub fn sources(&self) -> &[Box<dyn MapSource>] {
        &self.sources
    }

    pub fn has_enabled(&self) -> bool {
        self.sources.iter().any(|s| s.enabled())
    }

    pub fn enabled_sources(&self) -> Vec<&dyn MapSource> {
        self.sources
            .iter()
            .filter(|s| s.enabled())
            .map(|s| s.as_ref())
            .collect()
    }

    pub fn state(&self, source_id: &str) -> Option<&SourceState> {
        self.states.get(source_id)
    }

    /// Refresh every enabled source in list order. Returns
    /// `{display name -> record count, or -1 on failure}`.
    pub async fn fetch_all(&mut self, map: &SharedMap) -> HashMap<String, i64> {
        let mut results = HashMap::new();
        for idx in 0..self.sources.len() {
            if !self.sources[idx].enabled() {
                continue;
            }
            let (name, count) = self.fetch_source(idx, map).await;
            results.insert(name, count);
        }
        results
    }

    /// Refresh a single source by id; other sources' records stay put.
    pub async fn fetch_one(&mut self, source_id: &str, map: &SharedMap) -> HashMap<String, i64> {
        let mut results = HashMap::new();
        let Some(idx) = self.sources.iter().position(|s| s.id() == source_id) else {
            warn!("fetch_one: unknown source id {}", source_id);
            return results;
        };
        if self.sources[idx].enabled() {
            let (name, count) = self.fetch_source(idx, map).await;
            results.insert(name, count);
        }
        results
    }

    /// Clear-then-fetch for one source. The clear runs first so that
    /// connections the upstream no longer reports disappear; on failure
    /// the cleared state stands and the caller sees `-1`.
    async fn fetch_source(&mut self, idx: usize, map: &SharedMap) -> (String, i64) {
        let id = self.sources[idx].id().to_string();
        let name = self.sources[idx].name().to_string();

        map.lock().await.clear_provider(&id);
        self.states.entry(id.clone()).or_default().status = FetchStatus::Fetching;

        match self.sources[idx].fetch(map).await {
            Ok(count) => {
                info!("{}: fetched {} connections", name, count);
                let state = self.states.entry(id).or_default();
                state.status = FetchStatus::Ok(count);
                state.last_updated = Some(naive_now());
                (name, count as i64)
            }
            Err(err) => {
                error!("Error fetching data from source {}: {}", name, err);
                self.states.entry(id).or_default().status = FetchStatus::Error;
                (name, -1)
            }
        }
    }

    /// Load sources from the persisted `MapSources` array, falling back
    /// to a one-shot migration of legacy flat keys.
    pub fn load_configuration(&mut self) {
        self.sources.clear();

        if let Some(value) = self.settings.value(MAP_SOURCES_KEY).cloned() {
            match serde_json::from_value::<Vec<SourceEntry>>(value) {
                Ok(entries) => {
                    for entry in entries {
                        match self.registry.get(&entry.source_type) {
                            Some(factory) => match factory(&entry) {
                                Ok(source) => self.sources.push(source),
                                Err(err) => {
                                    warn!("Skipping source {}: {}", entry.id, err)
                                }
                            },
                            None => warn!(
                                "No factory registered for source type {}",
                                entry.source_type
                            ),
                        }
                    }
                }
                Err(err) => error!("Failed to load MapSources: {}", err),
            }
        }

        if self.sources.is_empty() {
            self.migrate_legacy_configuration();
        }
    }

    /// Recognize configuration written by old releases (flat per-source
    /// keys) and rewrite it as `MapSources` records.
    fn migrate_legacy_configuration(&mut self) {
        let mut migrated = false;

        // Legacy Tripwire, flat keys
        let tw_url = self.settings.value_str("tripwire_url").unwrap_or_default();
        let tw_user = self.settings.value_str("tripwire_user").unwrap_or_default();
        let tw_pass = self.settings.value_str("tripwire_pass").unwrap_or_default();
        if !tw_url.is_empty() && !tw_user.is_empty() {
            info!("Migrating legacy Tripwire configuration.");
            self.sources.push(Box::new(TripwireSource::create(
                "Legacy Tripwire",
                &tw_url,
                &tw_user,
                &tw_pass,
            )));
            migrated = true;
        }

        // Legacy Tripwire, grouped keys
        let tw_url = self.settings.value_str("Tripwire/url").unwrap_or_default();
        let tw_user = self
            .settings
            .value_str("Tripwire/username")
            .unwrap_or_default();
        let tw_pass = self
            .settings
            .value_str("Tripwire/password")
            .unwrap_or_default();
        if !tw_url.is_empty() && !tw_user.is_empty() {
            info!("Migrating legacy Tripwire (Alt) configuration.");
            self.sources.push(Box::new(TripwireSource::create(
                "Legacy Tripwire (Alt)",
                &tw_url,
                &tw_user,
                &tw_pass,
            )));
            migrated = true;
        }

        // Legacy Wanderer
        let wand_url = self
            .settings
            .value_str("wanderer_url")
            .filter(|v| !v.is_empty())
            .or_else(|| self.settings.value_str("Wanderer/url"))
            .unwrap_or_default();
        let wand_map = self
            .settings
            .value_str("Wanderer/map_id")
            .unwrap_or_default();
        let wand_token = self
            .settings
            .value_str("Wanderer/token")
            .unwrap_or_default();
        if !wand_url.is_empty() && !wand_map.is_empty() && !wand_token.is_empty() {
            info!("Migrating legacy Wanderer configuration.");
            self.sources.push(Box::new(WandererSource::create(
                "Legacy Wanderer",
                &wand_url,
                &wand_map,
                &wand_token,
            )));
            migrated = true;
        }

        // Legacy EveScout
        let es_enabled = self
            .settings
            .value_str("eve_scout_enable")
            .filter(|v| v.to_lowercase() == "true")
            .or_else(|| {
                self.settings
                    .value_str("Tripwire/evescout_enabled")
                    .filter(|v| v.to_lowercase() == "true")
            })
            .is_some();
        if es_enabled {
            info!("Migrating legacy EveScout configuration.");
            self.sources
                .push(Box::new(EveScoutSource::create("Eve Scout", true)));
            migrated = true;
        }

        // Legacy Pathfinder
        let pf_url = self.settings.value_str("Pathfinder/url").unwrap_or_default();
        let pf_token = self
            .settings
            .value_str("Pathfinder/token")
            .unwrap_or_default();
        if !pf_url.is_empty() && !pf_token.is_empty() {
            info!("Migrating legacy Pathfinder configuration.");
            let enabled = self
                .settings
                .value_str("Pathfinder/enabled")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false);
            let mut source = PathfinderSource::create("Legacy Pathfinder", &pf_url, &pf_token);
            source.set_enabled(enabled);
            self.sources.push(Box::new(source));
            migrated = true;
        }

        if migrated {
            for key in [
                "tripwire_url",
                "tripwire_user",
                "tripwire_pass",
                "Tripwire/url",
                "Tripwire/username",
                "Tripwire/password",
                "wanderer_url",
                "Wanderer/url",
                "Wanderer/map_id",
                "Wanderer/token",
                "eve_scout_enable",
                "Tripwire/evescout_enabled",
                "Pathfinder/url",
                "Pathfinder/token",
                "Pathfinder/enabled",
            ] {
                self.settings.remove(key);
            }
            if let Err(err) = self.save_configuration() {
                error!("Failed to save migrated configuration: {}", err);
            }
        }
    }

    pub fn save_configuration(&mut self) -> Result<(), Error> {
        let entries: Vec<SourceEntry> = self
            .sources
            .iter()
            .map(|s| SourceEntry {
                id: s.id().to_string(),
                source_type: s.source_type(),
                name: s.name().to_string(),
                enabled: s.enabled(),
                config: s.to_config(),
            })
            .collect();
        self.settings
            .set(MAP_SOURCES_KEY, serde_json::to_value(entries)?);
        self.settings.save()
    }

    #[cfg(test)]
    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Trim, drop trailing slashes and default the scheme to https.
pub(crate) fn normalize_url(raw: &str) -> String {
    let url = raw.trim().trim_end_matches('/');
    if url.is_empty() {
        return String::new();
    }
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

/// Normalize a scanned signature into `AAA-NNN` form. Handles missing
/// values and the common user error of typing digits and letters in the
/// wrong halves.
pub(crate) fn format_signature(raw: Option<&str>) -> String {
    let Some(sig) = raw else {
        return SIG_UNKNOWN.to_string();
    };
    if sig.is_empty() || sig == "???" {
        return SIG_UNKNOWN.to_string();
    }

    let left: String = sig.chars().take(3).collect();
    let right: String = sig.chars().skip(3).take(3).collect();
    let is_alpha = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic());
    let is_num = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    let letters = if is_alpha(&left) {
        left.to_uppercase()
    } else if is_alpha(&right) {
        right.to_uppercase()
    } else {
        "---".to_string()
    };
    let numbers = if is_num(&right) {
        right
    } else if is_num(&left) {
        left
    } else {
        "---".to_string()
    };
    format!("{}-{}", letters, numbers)
}

/// Upstream ids arrive as numbers or digit strings; anything else is 0.
pub(crate) fn int_from_value(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0) as u32,
        Value::String(s) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

/// Serialize a config struct, falling back to `{}` rather than panicking.
pub(crate) fn config_value<T: Serialize>(config: &T) -> Value {
    serde_json::to_value(config).unwrap_or_else(|_| json!({}))
}

/// Decode a persisted per-source config; an absent blob means defaults.
pub(crate) fn entry_config<T>(entry: &SourceEntry) -> Result<T, Error>
where
    T: serde::de::DeserializeOwned + Default,
{
    if entry.config.is_null() {
        return Ok(T::default());
    }
    Ok(serde_json::from_value(entry.config.clone())?)
}
