
use crate::evedb::{WormholeMassspan, WormholeSize, WormholeTimespan};
use crate::util::naive_now;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

/// Synthetic provider id for static gates seeded from the reference data.
pub const REF_PROVIDER_ID: &str = "ref";
/// Records older than this are invisible to the resolver.
pub const DEFAULT_MAX_AGE_HOURS: f64 = 48.0;

/// Wormhole metadata as reported by a provider. Side `a`/`b` match the
/// record's endpoints; signatures stay with their own end.
#[derive(Clone, Debug, PartialEq)]
pub struct WormholeInfo {
    pub sig_a: String,
    pub code_a: String,
    pub sig_b: String,
    pub code_b: String,
    pub size: WormholeSize,
    pub life: WormholeTimespan,
    pub mass: WormholeMassspan,
    /// Hours since the upstream last touched this signature.
    pub age_hours: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConnectionKind {
    /// Permanent link: a static gate or a provider-reported bridge.
    /// Ageless; never subject to wormhole filtering.
    Gate,
    Wormhole(WormholeInfo),
}

/// One edge contribution from one provider.
#[derive(Clone, Debug)]
pub struct ConnectionRecord {
    pub provider_id: String,
    pub provider_name: Option<String>,
    pub system_a: u32,
    pub system_b: u32,
    pub kind: ConnectionKind,
    /// Set by the database on insertion.
    pub ingested_at: NaiveDateTime,
}

impl ConnectionRecord {
    pub fn gate(provider_id: impl Into<String>, system_a: u32, system_b: u32) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_name: None,
            system_a,
            system_b,
            kind: ConnectionKind::Gate,
            ingested_at: naive_now(),
        }
    }

    pub fn wormhole(
        provider_id: impl Into<String>,
        system_a: u32,
        system_b: u32,
        info: WormholeInfo,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            provider_name: None,
            system_a,
            system_b,
            kind: ConnectionKind::Wormhole(info),
            ingested_at: naive_now(),
        }
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    fn age_hours(&self) -> Option<f64> {
        match &self.kind {
            ConnectionKind::Gate => None,
            ConnectionKind::Wormhole(info) => Some(info.age_hours),
        }
    }
}

/// Unordered endpoint pair; `lo <= hi` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SystemPair {
    lo: u32,
    hi: u32,
}

impl SystemPair {
    pub fn new(a: u32, b: u32) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }
}

/// In-memory store of connection records from all providers, keyed by
/// unordered endpoint pair. Conflict resolution happens at query time.
#[derive(Default)]
pub struct ConnectionDb {
    // BTreeMap keyed by provider id: iteration order doubles as the
    // deterministic last-resort tie-break.
    records: HashMap<SystemPair, BTreeMap<String, ConnectionRecord>>,
}

impl ConnectionDb {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record at `(pair, provider_id)`.
    pub fn add(&mut self, mut record: ConnectionRecord) {
        record.ingested_at = naive_now();
        let key = SystemPair::new(record.system_a, record.system_b);
        self.records
            .entry(key)
            .or_default()
            .insert(record.provider_id.clone(), record);
    }

    /// Remove every record tagged with `provider_id`.
    pub fn clear_provider(&mut self, provider_id: &str) {
        for by_provider in self.records.values_mut() {
            by_provider.remove(provider_id);
        }
        self.records.retain(|_, by_provider| !by_provider.is_empty());
    }

    /// Deduplicated view: at most one record per endpoint pair.
    ///
    /// Resolution order: stale wormholes dropped, gates beat wormholes,
    /// fresher beats older, stable life beats critical, and remaining
    /// ties fall to the lexicographically smallest provider id.
    pub fn resolved(&self, max_age_hours: f64) -> Vec<&ConnectionRecord> {
        let mut out = vec![];
        for by_provider in self.records.values() {
            let mut best: Option<&ConnectionRecord> = None;
            for record in by_provider.values() {
                if matches!(record.age_hours(), Some(age) if age > max_age_hours) {
                    continue;
                }
                best = match best {
                    None => Some(record),
                    Some(current) if beats(record, current) => Some(record),
                    Some(current) => Some(current),
                };
            }
            if let Some(best) = best {
                out.push(best);
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Whether `challenger` displaces `incumbent` for the same pair.
/// Ties keep the incumbent, which arrived earlier in provider-id order.
fn beats(challenger: &ConnectionRecord, incumbent: &ConnectionRecord) -> bool {
    match (&challenger.kind, &incumbent.kind) {
        (ConnectionKind::Gate, ConnectionKind::Wormhole(_)) => true,
        (ConnectionKind::Wormhole(_), ConnectionKind::Gate) => false,
        (ConnectionKind::Gate, ConnectionKind::Gate) => false,
        (ConnectionKind::Wormhole(c), ConnectionKind::Wormhole(i)) => {
            if c.age_hours != i.age_hours {
                return c.age_hours < i.age_hours;
            }
            c.life == WormholeTimespan::Stable && i.life == WormholeTimespan::Critical
        }
    }
}
