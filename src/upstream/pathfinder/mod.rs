#[cfg(test)]
mod tests;

use crate::chain::{ConnectionRecord, WormholeInfo};
use crate::error::Error;
use crate::evedb::{EveDb, WormholeMassspan, WormholeSize, WormholeTimespan, MIN_SYSTEM_ID};
use crate::upstream::{
    config_value, entry_config, int_from_value, normalize_url, MapSource, SharedMap, SourceEntry,
    SourceType, SIG_UNKNOWN,
};
use crate::util::{hours_since, make_client, parse_body, timed_request};
use crate::USER_AGENT;
use async_trait::async_trait;
use chrono::DateTime;
use http::{header, Method, Request, StatusCode, Uri};
use hyper::Body;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Deserialize, Debug)]
pub struct PathfinderConnection {
    #[serde(default)]
    pub source: Value,
    #[serde(default)]
    pub target: Value,
    #[serde(default)]
    pub source_sig: Option<String>,
    #[serde(default)]
    pub target_sig: Option<String>,
    #[serde(rename = "type", default)]
    pub wh_type: Option<String>,
    #[serde(default)]
    pub life: Option<String>,
    #[serde(default)]
    pub mass: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Pathfinder exports either `{"connections": [...]}` or a bare list.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
pub enum PathfinderResponse {
    Wrapped {
        #[serde(default)]
        connections: Vec<Value>,
    },
    List(Vec<Value>),
}

impl PathfinderResponse {
    fn connections(self) -> Vec<Value> {
        match self {
            Self::Wrapped { connections } => connections,
            Self::List(connections) => connections,
        }
    }
}

#[derive(Serialize, Deserialize, Default)]
struct PathfinderConfig {
    #[serde(default)]
    url: String,
    #[serde(default)]
    token: String,
}

/// Token-authenticated Pathfinder map export.
pub struct PathfinderSource {
    id: String,
    name: String,
    enabled: bool,
    url: String,
    token: String,
}

impl PathfinderSource {
    pub fn create(name: &str, url: &str, token: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            enabled: true,
            url: normalize_url(url),
            token: token.to_string(),
        }
    }

    pub fn from_entry(entry: &SourceEntry) -> Result<Box<dyn MapSource>, Error> {
        let config: PathfinderConfig = entry_config(entry)?;
        Ok(Box::new(Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            enabled: entry.enabled,
            url: normalize_url(&config.url),
            token: config.token,
        }))
    }

    /// The export endpoint, unless the user already points at one.
    fn target_url(&self) -> String {
        if self.url.ends_with(".json") || self.url.contains("/api") {
            self.url.clone()
        } else {
            format!("{}/api/connections", self.url)
        }
    }

    fn request(&self, uri: Uri) -> Result<Request<Body>, Error> {
        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json");
        if !self.token.is_empty() {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
        }
        Ok(builder.body(Body::empty())?)
    }
}

#[async_trait]
impl MapSource for PathfinderSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn source_type(&self) -> SourceType {
        SourceType::Pathfinder
    }

    async fn test(&self) -> (bool, String) {
        if self.url.is_empty() {
            return (false, "URL is missing.".to_string());
        }
        let uri: Uri = match self.url.parse() {
            Ok(uri) => uri,
            Err(err) => return (false, format!("Bad URL: {}", err)),
        };
        let client = make_client();
        let req = match self.request(uri) {
            Ok(req) => req,
            Err(err) => return (false, format!("{}", err)),
        };
        match timed_request(&client, req).await {
            Ok(resp) if resp.status().as_u16() < 400 => {
                (true, "Connection successful (URL reachable)".to_string())
            }
            Ok(resp) => (false, format!("HTTP Error {}", resp.status())),
            Err(err) => (false, format!("Connection failed: {}", err)),
        }
    }

    async fn fetch(&self, map: &SharedMap) -> Result<usize, Error> {
        let uri: Uri = self
            .target_url()
            .parse()
            .map_err(|err| Error::ParamError(format!("Uri format Error: {}", err)))?;
        let client = make_client();
        let mut resp = timed_request(&client, self.request(uri)?).await?;
        if resp.status() != StatusCode::OK {
            return Err(Error::General(
                format!("Pathfinder API returned {}", resp.status()),
                resp.status(),
            ));
        }

        let response: PathfinderResponse = parse_body(&mut resp).await?;
        let eve_db = { map.lock().await.eve_db() };
        let records: Vec<ConnectionRecord> = response
            .connections()
            .iter()
            .filter_map(|raw| connection_from_value(raw, &self.id, &self.name, &eve_db))
            .collect();

        let count = records.len();
        let mut map = map.lock().await;
        for record in records {
            map.add_connection(record);
        }
        Ok(count)
    }

    fn to_config(&self) -> Value {
        config_value(&PathfinderConfig {
            url: self.url.clone(),
            token: self.token.clone(),
        })
    }
}

/// Translate one exported connection; malformed entries are skipped.
pub fn connection_from_value(
    raw: &Value,
    provider_id: &str,
    provider_name: &str,
    eve_db: &EveDb,
) -> Option<ConnectionRecord> {
    let conn: PathfinderConnection = match serde_json::from_value(raw.clone()) {
        Ok(conn) => conn,
        Err(err) => {
            warn!("Error processing Pathfinder connection: {}", err);
            return None;
        }
    };

    let source_id = int_from_value(&conn.source);
    let target_id = int_from_value(&conn.target);
    if source_id < MIN_SYSTEM_ID || target_id < MIN_SYSTEM_ID {
        return None;
    }

    let sig_source = conn.source_sig.unwrap_or_else(|| SIG_UNKNOWN.to_string());
    let sig_target = conn.target_sig.unwrap_or_else(|| SIG_UNKNOWN.to_string());
    let wh_type = conn.wh_type.unwrap_or_else(|| "K162".to_string());

    let life_raw = conn.life.unwrap_or_else(|| "stable".to_string()).to_lowercase();
    let life = if life_raw.contains("crit") {
        WormholeTimespan::Critical
    } else {
        WormholeTimespan::Stable
    };

    let mass_raw = conn.mass.unwrap_or_else(|| "stable".to_string()).to_lowercase();
    let mass = if mass_raw.contains("destab") {
        WormholeMassspan::Destab
    } else if mass_raw.contains("crit") {
        WormholeMassspan::Critical
    } else {
        WormholeMassspan::Stable
    };

    let mut size = eve_db.whsize_by_code(&wh_type);
    if !size.is_known() {
        let size_raw = conn.size.unwrap_or_default().to_lowercase();
        size = if size_raw.contains("xl") {
            WormholeSize::XLarge
        } else if size_raw.contains("large") {
            WormholeSize::Large
        } else if size_raw.contains("medium") {
            WormholeSize::Medium
        } else if size_raw.contains("small") {
            WormholeSize::Small
        } else {
            eve_db.whsize_by_system(source_id, target_id)
        };
    }

    let mut age_hours = 0.0;
    if let Some(updated_at) = &conn.updated_at {
        match DateTime::parse_from_rfc3339(updated_at) {
            Ok(when) => age_hours = hours_since(when.naive_utc()),
            Err(err) => warn!("Bad Pathfinder updated_at {:?}: {}", updated_at, err),
        }
    }

    Some(
        ConnectionRecord::wormhole(
            provider_id,
            source_id,
            target_id,
            WormholeInfo {
                sig_a: sig_source,
                code_a: wh_type,
                sig_b: sig_target,
                code_b: "K162".to_string(),
                size,
                life,
                mass,
                age_hours,
            },
        )
        .with_provider_name(provider_name),
    )
}
