
use crate::chain::{ConnectionRecord, WormholeInfo};
use crate::error::Error;
use crate::evedb::{EveDb, WormholeMassspan, WormholeSize, WormholeTimespan, MIN_SYSTEM_ID};
use crate::upstream::{
    config_value, entry_config, normalize_url, MapSource, SharedMap, SourceEntry, SourceType,
    SIG_UNKNOWN, WTYPE_UNKNOWN,
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

pub const DEFAULT_URL: &str = "https://api.eve-scout.com/v2/public/signatures";

/// Holes with less than this left to live are reported as critical.
const EOL_THRESHOLD_HOURS: f64 = 4.0;

#[derive(Deserialize, Debug)]
pub struct EveScoutSignature {
    #[serde(default)]
    pub in_system_id: u32,
    #[serde(default)]
    pub in_signature: Option<String>,
    #[serde(default)]
    pub out_system_id: u32,
    #[serde(default)]
    pub out_signature: Option<String>,
    #[serde(default)]
    pub wh_exits_outward: bool,
    #[serde(default)]
    pub wh_type: Option<String>,
    #[serde(default)]
    pub remaining_hours: f64,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct EveScoutConfig {
    #[serde(default = "default_url")]
    url: String,
}

impl Default for EveScoutConfig {
    fn default() -> Self {
        Self { url: default_url() }
    }
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

/// Public read-only feed of Thera and Turnur connections. No auth.
pub struct EveScoutSource {
    id: String,
    name: String,
    enabled: bool,
    url: String,
}

impl EveScoutSource {
    pub fn create(name: &str, enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            enabled,
            url: DEFAULT_URL.to_string(),
        }
    }

    pub fn from_entry(entry: &SourceEntry) -> Result<Box<dyn MapSource>, Error> {
        let config: EveScoutConfig = entry_config(entry)?;
        Ok(Box::new(Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            enabled: entry.enabled,
            url: normalize_url(&config.url),
        }))
    }
}

#[async_trait]
impl MapSource for EveScoutSource {
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
        SourceType::EveScout
    }

    async fn test(&self) -> (bool, String) {
        if self.url.is_empty() {
            (false, "URL is missing.".to_string())
        } else {
            (true, "URL is set.".to_string())
        }
    }

    async fn fetch(&self, map: &SharedMap) -> Result<usize, Error> {
        let uri: Uri = self
            .url
            .parse()
            .map_err(|err| Error::ParamError(format!("Uri format Error: {}", err)))?;
        let req = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())?;

        let client = make_client();
        let mut resp = timed_request(&client, req).await?;
        if resp.status() != StatusCode::OK {
            return Err(Error::General(
                "Eve Scout result code is not 200".to_string(),
                resp.status(),
            ));
        }

        let signatures: Vec<Value> = parse_body(&mut resp).await?;
        let eve_db = { map.lock().await.eve_db() };
        let records: Vec<ConnectionRecord> = signatures
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
        config_value(&EveScoutConfig {
            url: self.url.clone(),
        })
    }
}

/// Translate one public signature into a connection record.
pub fn connection_from_value(
    raw: &Value,
    provider_id: &str,
    provider_name: &str,
    eve_db: &EveDb,
) -> Option<ConnectionRecord> {
    let sig: EveScoutSignature = match serde_json::from_value(raw.clone()) {
        Ok(sig) => sig,
        Err(err) => {
            warn!("Error processing Eve Scout signature: {}", err);
            return None;
        }
    };

    if sig.in_system_id < MIN_SYSTEM_ID || sig.out_system_id < MIN_SYSTEM_ID {
        return None;
    }

    let wh_type = match sig.wh_type.as_deref() {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => WTYPE_UNKNOWN.to_string(),
    };
    // The typed side is where the hole spawned; the other side is K162.
    let (code_in, code_out) = if sig.wh_exits_outward {
        ("K162".to_string(), wh_type.clone())
    } else {
        (wh_type.clone(), "K162".to_string())
    };

    let life = if sig.remaining_hours >= EOL_THRESHOLD_HOURS {
        WormholeTimespan::Stable
    } else {
        WormholeTimespan::Critical
    };

    let mut size = eve_db.whsize_by_code(&code_in);
    if !size.is_known() {
        size = eve_db.whsize_by_code(&code_out);
    }
    if !size.is_known() {
        size = eve_db.whsize_by_system(sig.in_system_id, sig.out_system_id);
    }

    let mut age_hours = 0.0;
    if let Some(updated_at) = &sig.updated_at {
        match DateTime::parse_from_rfc3339(updated_at) {
            Ok(when) => age_hours = hours_since(when.naive_utc()),
            Err(err) => warn!("Bad Eve Scout updated_at {:?}: {}", updated_at, err),
        }
    }

    Some(
        ConnectionRecord::wormhole(
            provider_id,
            sig.in_system_id,
            sig.out_system_id,
            WormholeInfo {
                sig_a: sig.in_signature.unwrap_or_else(|| SIG_UNKNOWN.to_string()),
                code_a: code_in,
                sig_b: sig.out_signature.unwrap_or_else(|| SIG_UNKNOWN.to_string()),
                code_b: code_out,
                size,
                life,
                // the feed does not report mass state
                mass: WormholeMassspan::Unknown,
                age_hours,
            },
        )
        .with_provider_name(provider_name),
    )
}
