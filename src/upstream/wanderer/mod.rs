#[cfg(test)]
mod tests;

use crate::chain::{ConnectionRecord, WormholeInfo};
use crate::error::Error;
use crate::evedb::{EveDb, WormholeMassspan, WormholeSize, WormholeTimespan, MIN_SYSTEM_ID};
use crate::upstream::{
    config_value, entry_config, int_from_value, normalize_url, MapSource, SharedMap, SourceEntry,
    SourceType, SIG_UNKNOWN, WTYPE_UNKNOWN,
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
pub struct WandererSignature {
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub solar_system_id: Value,
    #[serde(default)]
    pub linked_system_id: Value,
    #[serde(rename = "type", default)]
    pub wh_type: Option<String>,
    #[serde(default)]
    pub eve_id: Option<String>,
    /// JSON with `time_status` / `mass_status`, sometimes double-encoded.
    #[serde(default)]
    pub custom_info: Value,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct WandererResponse {
    #[serde(default)]
    pub data: Vec<Value>,
}

#[derive(Serialize, Deserialize, Default)]
struct WandererConfig {
    #[serde(default)]
    url: String,
    #[serde(default)]
    map_id: String,
    #[serde(default)]
    token: String,
}

/// Token-authenticated Wanderer map API.
pub struct WandererSource {
    id: String,
    name: String,
    enabled: bool,
    url: String,
    map_id: String,
    token: String,
}

impl WandererSource {
    pub fn create(name: &str, url: &str, map_id: &str, token: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            enabled: true,
            url: normalize_url(url),
            map_id: map_id.to_string(),
            token: token.to_string(),
        }
    }

    pub fn from_entry(entry: &SourceEntry) -> Result<Box<dyn MapSource>, Error> {
        let config: WandererConfig = entry_config(entry)?;
        Ok(Box::new(Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            enabled: entry.enabled,
            url: normalize_url(&config.url),
            map_id: config.map_id,
            token: config.token,
        }))
    }

    fn signatures_request(&self) -> Result<Request<Body>, Error> {
        let uri: Uri = format!("{}/api/maps/{}/signatures", self.url, self.map_id)
            .parse()
            .map_err(|err| Error::ParamError(format!("Uri format Error: {}", err)))?;
        Ok(Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())?)
    }
}

#[async_trait]
impl MapSource for WandererSource {
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
        SourceType::Wanderer
    }

    async fn test(&self) -> (bool, String) {
        if self.url.is_empty() || self.map_id.is_empty() || self.token.is_empty() {
            return (false, "Missing URL, Map ID, or Token".to_string());
        }
        let req = match self.signatures_request() {
            Ok(req) => req,
            Err(err) => return (false, format!("{}", err)),
        };
        let client = make_client();
        match timed_request(&client, req).await {
            Ok(resp) => match resp.status() {
                StatusCode::OK => (true, "Connection successful".to_string()),
                StatusCode::UNAUTHORIZED => (false, "Unauthorized: Check your token".to_string()),
                StatusCode::NOT_FOUND => (false, "Map not found or invalid URL".to_string()),
                status => (false, format!("HTTP Error: {}", status)),
            },
            Err(err) => (false, format!("Connection error: {}", err)),
        }
    }

    async fn fetch(&self, map: &SharedMap) -> Result<usize, Error> {
        let client = make_client();
        let mut resp = timed_request(&client, self.signatures_request()?).await?;
        if resp.status() != StatusCode::OK {
            return Err(Error::General(
                format!("Wanderer API error: {}", resp.status()),
                resp.status(),
            ));
        }

        let response: WandererResponse = parse_body(&mut resp).await?;
        let eve_db = { map.lock().await.eve_db() };
        let records: Vec<ConnectionRecord> = response
            .data
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
        config_value(&WandererConfig {
            url: self.url.clone(),
            map_id: self.map_id.clone(),
            token: self.token.clone(),
        })
    }
}

/// `custom_info` arrives as an object or as a JSON string containing one.
fn custom_statuses(custom_info: &Value) -> (u32, u32) {
    let parsed;
    let info = match custom_info {
        Value::Object(_) => custom_info,
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(value) => {
                parsed = value;
                &parsed
            }
            Err(_) => return (1, 1),
        },
        _ => return (1, 1),
    };
    let time_status = info
        .get("time_status")
        .map(int_from_value)
        .filter(|v| *v > 0)
        .unwrap_or(1);
    let mass_status = info
        .get("mass_status")
        .map(int_from_value)
        .filter(|v| *v > 0)
        .unwrap_or(1);
    (time_status, mass_status)
}

/// Translate one map signature. Non-wormhole groups and unlinked
/// signatures are not connections.
pub fn connection_from_value(
    raw: &Value,
    provider_id: &str,
    provider_name: &str,
    eve_db: &EveDb,
) -> Option<ConnectionRecord> {
    let sig: WandererSignature = match serde_json::from_value(raw.clone()) {
        Ok(sig) => sig,
        Err(err) => {
            warn!("Error processing Wanderer signature: {}", err);
            return None;
        }
    };

    if sig.group.as_deref() != Some("Wormhole") {
        return None;
    }

    let system_id = int_from_value(&sig.solar_system_id);
    let linked_id = int_from_value(&sig.linked_system_id);
    if system_id < MIN_SYSTEM_ID || linked_id < MIN_SYSTEM_ID {
        return None;
    }

    let (time_status, mass_status) = custom_statuses(&sig.custom_info);
    // time: 1 = stable, 2 = EOL
    let life = if time_status == 2 {
        WormholeTimespan::Critical
    } else {
        WormholeTimespan::Stable
    };
    // mass: 1 = stable, 2 = destab, 3 = critical
    let mass = match mass_status {
        2 => WormholeMassspan::Destab,
        3 => WormholeMassspan::Critical,
        _ => WormholeMassspan::Stable,
    };

    let wh_type = match sig.wh_type.as_deref() {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => WTYPE_UNKNOWN.to_string(),
    };
    let code_out = if wh_type != WTYPE_UNKNOWN && wh_type != "K162" {
        "K162".to_string()
    } else {
        WTYPE_UNKNOWN.to_string()
    };

    let mut size = eve_db.whsize_by_code(&wh_type);
    if !size.is_known() {
        size = eve_db.whsize_by_system(system_id, linked_id);
    }

    let mut age_hours = 0.0;
    if let Some(updated_at) = &sig.updated_at {
        match DateTime::parse_from_rfc3339(updated_at) {
            Ok(when) => age_hours = hours_since(when.naive_utc()),
            Err(err) => warn!("Bad Wanderer updated_at {:?}: {}", updated_at, err),
        }
    }

    Some(
        ConnectionRecord::wormhole(
            provider_id,
            system_id,
            linked_id,
            WormholeInfo {
                sig_a: sig.eve_id.unwrap_or_else(|| SIG_UNKNOWN.to_string()),
                code_a: wh_type,
                sig_b: SIG_UNKNOWN.to_string(),
                code_b: code_out,
                size,
                life,
                mass,
                age_hours,
            },
        )
        .with_provider_name(provider_name),
    )
}
