
use crate::chain::{ConnectionRecord, WormholeInfo};
use crate::error::Error;
use crate::evedb::{EveDb, WormholeMassspan, WormholeSize, WormholeTimespan, MIN_SYSTEM_ID};
use crate::upstream::{
    config_value, entry_config, format_signature, int_from_value, normalize_url, MapSource,
    SharedMap, SourceEntry, SourceType, WTYPE_UNKNOWN,
};
use crate::util::{hours_since, make_client, read_body, timed_request, HttpClient};
use crate::USER_AGENT;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use http::{header, Method, Request, StatusCode, Uri};
use hyper::Body;
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

const MODIFIED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Any valid system works for the init call; Jita is the original's pick.
const REFRESH_SYSTEM_ID: &str = "30000142";

/// A scan result in a solar system. Wormhole connections reference two
/// of these by id.
#[derive(Deserialize, Debug)]
pub struct TripwireSignature {
    #[serde(rename = "signatureID", default)]
    pub signature_id: Option<String>,
    #[serde(rename = "systemID", default)]
    pub system_id: Value,
    #[serde(rename = "modifiedTime", default)]
    pub modified_time: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TripwireWormhole {
    #[serde(rename = "initialID", default)]
    pub initial_id: Value,
    #[serde(rename = "secondaryID", default)]
    pub secondary_id: Value,
    /// Wormhole type code, `"GATE"` for permanent bridges, or empty.
    #[serde(rename = "type", default)]
    pub wh_type: Option<String>,
    /// Which side is the entry: "initial", "secondary", or unset.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub life: Option<String>,
    #[serde(default)]
    pub mass: Option<String>,
}

/// The chain payload. Tripwire serializes `signatures` and `wormholes`
/// as objects keyed by id, or as `[]` when the chain is empty.
#[derive(Deserialize, Debug, Default)]
pub struct TripwireChain {
    #[serde(default, deserialize_with = "object_or_empty")]
    pub signatures: HashMap<String, TripwireSignature>,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub wormholes: HashMap<String, TripwireWormhole>,
}

fn object_or_empty<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(HashMap::new()),
    }
}

#[derive(Serialize, Deserialize, Default)]
struct TripwireConfig {
    #[serde(default)]
    url: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Session-authenticated Tripwire client. Logs in with form credentials
/// and keeps the session cookies across fetches.
pub struct TripwireSource {
    id: String,
    name: String,
    enabled: bool,
    url: String,
    username: String,
    password: String,
    cookies: Mutex<Option<String>>,
}

impl TripwireSource {
    pub fn create(name: &str, url: &str, username: &str, password: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            enabled: true,
            url: normalize_url(url),
            username: username.to_string(),
            password: password.to_string(),
            cookies: Mutex::new(None),
        }
    }

    pub fn from_entry(entry: &SourceEntry) -> Result<Box<dyn MapSource>, Error> {
        let config: TripwireConfig = entry_config(entry)?;
        Ok(Box::new(Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            enabled: entry.enabled,
            url: normalize_url(&config.url),
            username: config.username,
            password: config.password,
            cookies: Mutex::new(None),
        }))
    }

    fn cookie_header(&self) -> Option<String> {
        self.cookies.lock().ok()?.clone()
    }

    fn store_cookies(&self, cookies: String) {
        if let Ok(mut guard) = self.cookies.lock() {
            *guard = Some(cookies);
        }
    }

    async fn login(&self, client: &HttpClient) -> Result<(), Error> {
        debug!("Tripwire login...");
        let login_url = format!("{}/login.php", self.url);
        let uri: Uri = login_url
            .parse()
            .map_err(|err| Error::ParamError(format!("Uri format Error: {}", err)))?;
        let form = serde_urlencoded::to_string([
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("mode", "login"),
        ])?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::REFERER, &login_url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))?;
        let mut resp = timed_request(client, req).await?;
        let status = resp.status();

        let cookies: Vec<String> = resp
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .map(str::to_string)
            .collect();
        if !cookies.is_empty() {
            self.store_cookies(cookies.join("; "));
        }

        if !status.is_success() && !status.is_redirection() {
            return Err(Error::General(
                format!("Tripwire login result code is not 200: {}", status),
                status,
            ));
        }

        let body = read_body(&mut resp).await?;
        if let Ok(value) = serde_json::from_str::<Value>(&body) {
            if value.get("result").and_then(Value::as_str) == Some("success") {
                return Ok(());
            }
        }
        if body.to_lowercase().contains("name=\"password\"") {
            return Err(Error::General(
                "Tripwire login failed: invalid credentials or stuck on login page".to_string(),
                StatusCode::UNAUTHORIZED,
            ));
        }
        Ok(())
    }

    /// One `refresh.php` round trip. `None` means the session is not
    /// valid (non-200 or a login page instead of chain JSON).
    async fn refresh(&self, client: &HttpClient) -> Result<Option<TripwireChain>, Error> {
        let refresh_url = format!("{}/refresh.php", self.url);
        let uri: Uri = format!(
            "{}?mode=init&systemID={}",
            refresh_url, REFRESH_SYSTEM_ID
        )
        .parse()
        .map_err(|err| Error::ParamError(format!("Uri format Error: {}", err)))?;

        let mut builder = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(header::REFERER, &refresh_url)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(cookie) = self.cookie_header() {
            builder = builder.header(header::COOKIE, cookie);
        }
        let req = builder.body(Body::empty())?;

        let mut resp = timed_request(client, req).await?;
        if !resp.status().is_success() {
            warn!("Tripwire refresh result code is not 200: {}", resp.status());
            return Ok(None);
        }
        let body = read_body(&mut resp).await?;
        match serde_json::from_str::<TripwireChain>(&body) {
            Ok(chain) => Ok(Some(chain)),
            Err(err) => {
                warn!("Tripwire refresh response is not chain JSON: {}", err);
                Ok(None)
            }
        }
    }

    /// Fetch the chain, re-logging-in once if the session has expired.
    /// A failed fetch never produces an empty chain value.
    async fn get_chain(&self) -> Result<TripwireChain, Error> {
        let client = make_client();
        if let Some(chain) = self.refresh(&client).await? {
            debug!("Tripwire fetch successful with existing session");
            return Ok(chain);
        }

        info!("Tripwire fetch failed or session expired, attempting login...");
        self.login(&client).await?;
        match self.refresh(&client).await? {
            Some(chain) => Ok(chain),
            None => Err(Error::General(
                "Failed to fetch Tripwire chain after login attempt".to_string(),
                StatusCode::UNAUTHORIZED,
            )),
        }
    }
}

#[async_trait]
impl MapSource for TripwireSource {
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
        SourceType::Tripwire
    }

    async fn test(&self) -> (bool, String) {
        if self.url.is_empty() || self.username.is_empty() {
            return (false, "Missing URL or username".to_string());
        }
        let client = make_client();
        match self.login(&client).await {
            Ok(()) => (true, "Login successful".to_string()),
            Err(err) => (false, format!("{}", err)),
        }
    }

    async fn fetch(&self, map: &SharedMap) -> Result<usize, Error> {
        let chain = self.get_chain().await?;
        let eve_db = { map.lock().await.eve_db() };
        let records = connections_from_chain(&chain, &self.id, &self.name, &eve_db);
        let count = records.len();
        let mut map = map.lock().await;
        for record in records {
            map.add_connection(record);
        }
        Ok(count)
    }

    fn to_config(&self) -> Value {
        config_value(&TripwireConfig {
            url: self.url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
        })
    }
}

fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

/// Translate a fetched chain into connection records. Malformed entries
/// are logged and skipped; the rest go through.
pub fn connections_from_chain(
    chain: &TripwireChain,
    provider_id: &str,
    provider_name: &str,
    eve_db: &EveDb,
) -> Vec<ConnectionRecord> {
    let mut records = vec![];
    for (wormhole_id, wormhole) in &chain.wormholes {
        match connection_from_wormhole(chain, wormhole, provider_id, provider_name, eve_db) {
            Some(record) => records.push(record),
            None => debug!("Skipping Tripwire wormhole {}", wormhole_id),
        }
    }
    records
}

fn connection_from_wormhole(
    chain: &TripwireChain,
    wormhole: &TripwireWormhole,
    provider_id: &str,
    provider_name: &str,
    eve_db: &EveDb,
) -> Option<ConnectionRecord> {
    // The parent field picks which signature is the entry side.
    let (parent_key, sibling_key) = if wormhole.parent.as_deref() == Some("secondary") {
        (&wormhole.secondary_id, &wormhole.initial_id)
    } else {
        (&wormhole.initial_id, &wormhole.secondary_id)
    };
    let signature_in = chain.signatures.get(&value_key(parent_key))?;
    let signature_out = chain.signatures.get(&value_key(sibling_key))?;

    let system_from = int_from_value(&signature_in.system_id);
    let system_to = int_from_value(&signature_out.system_id);
    if system_from < MIN_SYSTEM_ID || system_to < MIN_SYSTEM_ID {
        return None;
    }

    // Permanent bridges: stable, ageless, exempt from wormhole filtering.
    if wormhole.wh_type.as_deref() == Some("GATE") {
        return Some(
            ConnectionRecord::gate(provider_id, system_from, system_to)
                .with_provider_name(provider_name),
        );
    }

    let sig_in = format_signature(signature_in.signature_id.as_deref());
    let sig_out = format_signature(signature_out.signature_id.as_deref());

    let type_in = match wormhole.wh_type.as_deref() {
        Some(code) if !code.is_empty() => code.to_string(),
        _ => WTYPE_UNKNOWN.to_string(),
    };
    let type_out = if type_in == WTYPE_UNKNOWN {
        WTYPE_UNKNOWN.to_string()
    } else {
        "K162".to_string()
    };

    let life = match wormhole.life.as_deref() {
        Some("stable") => WormholeTimespan::Stable,
        _ => WormholeTimespan::Critical,
    };
    let mass = match wormhole.mass.as_deref() {
        Some("stable") => WormholeMassspan::Stable,
        Some("destab") => WormholeMassspan::Destab,
        _ => WormholeMassspan::Critical,
    };

    let mut size = eve_db.whsize_by_code(&type_in);
    if !size.is_known() {
        // Unknown code: infer from the classes of the two endpoints.
        size = eve_db.whsize_by_system(system_from, system_to);
    }

    let modified = signature_in.modified_time.as_deref()?;
    let age_hours = match NaiveDateTime::parse_from_str(modified, MODIFIED_TIME_FORMAT) {
        Ok(when) => hours_since(when),
        Err(err) => {
            warn!("Bad Tripwire modifiedTime {:?}: {}", modified, err);
            return None;
        }
    };

    Some(
        ConnectionRecord::wormhole(
            provider_id,
            system_from,
            system_to,
            WormholeInfo {
                sig_a: sig_in,
                code_a: type_in,
                sig_b: sig_out,
                code_b: type_out,
                size,
                life,
                mass,
                age_hours,
            },
        )
        .with_provider_name(provider_name),
    )
}
