
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use strum_macros::{Display, EnumString};

/// Zarzakh is lore-locked from transit (emanation locks) but remains a
/// legitimate route endpoint.
pub const ZARZAKH_SYSTEM_ID: u32 = 30100000;
/// Pochven. Every system in it is Triglavian space.
pub const POCHVEN_REGION_ID: u32 = 10000070;
/// System ids below this are not solar systems in the reference export.
pub const MIN_SYSTEM_ID: u32 = 10000;

const WH_SYSTEM_RANGE: std::ops::Range<u32> = 31_000_000..32_000_000;

/// Security class of a solar system.
#[derive(
    Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum SpaceType {
    #[strum(serialize = "HS")]
    #[serde(rename = "HS")]
    HighSec,
    #[strum(serialize = "LS")]
    #[serde(rename = "LS")]
    LowSec,
    #[strum(serialize = "NS")]
    #[serde(rename = "NS")]
    NullSec,
    #[strum(serialize = "WH")]
    #[serde(rename = "WH")]
    Wormhole,
    #[strum(serialize = "TRIG")]
    #[serde(rename = "TRIG")]
    Triglavian,
    #[strum(serialize = "ZARZAKH")]
    #[serde(rename = "ZARZAKH")]
    Zarzakh,
}

/// Size class of a wormhole. Ordering is by jumpable ship size.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    EnumString,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
pub enum WormholeSize {
    #[strum(serialize = "small")]
    #[serde(rename = "small")]
    Small,
    #[strum(serialize = "medium")]
    #[serde(rename = "medium")]
    Medium,
    #[strum(serialize = "large")]
    #[serde(rename = "large")]
    Large,
    #[strum(serialize = "xlarge")]
    #[serde(rename = "xlarge")]
    XLarge,
    #[strum(serialize = "unknown")]
    #[serde(rename = "unknown")]
    Unknown,
}

impl WormholeSize {
    pub fn is_known(self) -> bool {
        self != WormholeSize::Unknown
    }
}

#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WormholeTimespan {
    #[strum(serialize = "stable")]
    #[serde(rename = "stable")]
    Stable,
    #[strum(serialize = "critical")]
    #[serde(rename = "critical")]
    Critical,
}

#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WormholeMassspan {
    #[strum(serialize = "unknown")]
    #[serde(rename = "unknown")]
    Unknown,
    #[strum(serialize = "stable")]
    #[serde(rename = "stable")]
    Stable,
    #[strum(serialize = "destab")]
    #[serde(rename = "destab")]
    Destab,
    #[strum(serialize = "critical")]
    #[serde(rename = "critical")]
    Critical,
}

/// One solar system from the reference export.
#[derive(Clone, Debug)]
pub struct System {
    pub id: u32,
    pub name: String,
    pub region_id: u32,
    pub security: f64,
}

/// Route-display description of a system.
#[derive(Clone, Debug)]
pub struct SystemDescription {
    pub id: u32,
    pub name: String,
    pub region: String,
    pub class: SpaceType,
}

/// Immutable reference database: systems, static gates, wormhole classes
/// and the wormhole type catalogue. Loaded once at startup.
pub struct EveDb {
    systems: HashMap<u32, System>,
    names: HashMap<String, u32>,
    regions: HashMap<u32, String>,
    gates: Vec<(u32, u32)>,
    wh_classes: HashMap<u32, i32>,
    /// type code -> (destination class, size)
    statics: HashMap<String, (i32, WormholeSize)>,
}

// CSV row shapes, field names as in the reference exports.
#[derive(Deserialize)]
struct SolarSystemRow {
    #[serde(rename = "solarSystemID")]
    id: u32,
    #[serde(rename = "solarSystemName")]
    name: String,
    #[serde(rename = "regionID")]
    region_id: u32,
    security: f64,
}

#[derive(Deserialize)]
struct JumpRow {
    #[serde(rename = "fromSolarSystemID")]
    from: u32,
    #[serde(rename = "toSolarSystemID")]
    to: u32,
}

#[derive(Deserialize)]
struct RegionRow {
    #[serde(rename = "regionID")]
    id: u32,
    #[serde(rename = "regionName")]
    name: String,
}

#[derive(Deserialize)]
struct WormholeClassRow {
    #[serde(rename = "locationID")]
    location_id: u32,
    #[serde(rename = "wormholeClassID")]
    class_id: i32,
}

#[derive(Deserialize)]
struct StaticRow {
    code: String,
    class: i32,
    size: WormholeSize,
}

#[derive(Deserialize)]
struct RenameRow {
    #[serde(rename = "solarSystemID")]
    id: u32,
    #[serde(rename = "solarSystemName")]
    name: String,
}

fn parse_systems(rdr: impl Read) -> Result<Vec<System>, Error> {
    let mut out = vec![];
    for row in csv::Reader::from_reader(rdr).deserialize() {
        let row: SolarSystemRow = row?;
        out.push(System {
            id: row.id,
            name: row.name,
            region_id: row.region_id,
            security: row.security,
        });
    }
    Ok(out)
}

fn parse_jumps(rdr: impl Read) -> Result<Vec<(u32, u32)>, Error> {
    let mut out = vec![];
    for row in csv::Reader::from_reader(rdr).deserialize() {
        let row: JumpRow = row?;
        out.push((row.from, row.to));
    }
    Ok(out)
}

fn parse_regions(rdr: impl Read) -> Result<Vec<(u32, String)>, Error> {
    let mut out = vec![];
    for row in csv::Reader::from_reader(rdr).deserialize() {
        let row: RegionRow = row?;
        out.push((row.id, row.name));
    }
    Ok(out)
}

fn parse_wh_classes(rdr: impl Read) -> Result<Vec<(u32, i32)>, Error> {
    let mut out = vec![];
    for row in csv::Reader::from_reader(rdr).deserialize() {
        let row: WormholeClassRow = row?;
        out.push((row.location_id, row.class_id));
    }
    Ok(out)
}

fn parse_statics(rdr: impl Read) -> Result<Vec<(String, i32, WormholeSize)>, Error> {
    let mut out = vec![];
    for row in csv::Reader::from_reader(rdr).deserialize() {
        let row: StaticRow = row?;
        out.push((row.code, row.class, row.size));
    }
    Ok(out)
}

fn parse_renames(rdr: impl Read) -> Result<Vec<(u32, String)>, Error> {
    let mut out = vec![];
    for row in csv::Reader::from_reader(rdr).deserialize() {
        let row: RenameRow = row?;
        out.push((row.id, row.name));
    }
    Ok(out)
}

impl EveDb {
    /// Load the reference exports from `dir`. `renames.csv` is optional.
    pub fn load(dir: &Path) -> Result<Self, Error> {
        let systems = parse_systems(File::open(dir.join("mapSolarSystems.csv"))?)?;
        let gates = parse_jumps(File::open(dir.join("mapSolarSystemJumps.csv"))?)?;
        let regions = parse_regions(File::open(dir.join("mapRegions.csv"))?)?;
        let wh_classes = parse_wh_classes(File::open(dir.join("mapLocationWormholeClasses.csv"))?)?;
        let statics = parse_statics(File::open(dir.join("statics.csv"))?)?;
        let renames = match File::open(dir.join("renames.csv")) {
            Ok(file) => parse_renames(file)?,
            Err(_) => vec![],
        };
        Ok(Self::from_parts(
            systems, gates, regions, wh_classes, statics, renames,
        ))
    }

    pub fn from_parts(
        systems: Vec<System>,
        gates: Vec<(u32, u32)>,
        regions: Vec<(u32, String)>,
        wh_classes: Vec<(u32, i32)>,
        statics: Vec<(String, i32, WormholeSize)>,
        renames: Vec<(u32, String)>,
    ) -> Self {
        let mut systems: HashMap<u32, System> =
            systems.into_iter().map(|s| (s.id, s)).collect();
        for (id, name) in renames {
            if let Some(system) = systems.get_mut(&id) {
                system.name = name;
            }
        }
        let names = systems
            .values()
            .map(|s| (s.name.to_lowercase(), s.id))
            .collect();
        Self {
            systems,
            names,
            regions: regions.into_iter().collect(),
            gates,
            wh_classes: wh_classes.into_iter().collect(),
            statics: statics
                .into_iter()
                .map(|(code, class, size)| (code.to_uppercase(), (class, size)))
                .collect(),
        }
    }

    /// Static gate pairs, one row per undirected link.
    pub fn gates(&self) -> &[(u32, u32)] {
        &self.gates
    }

    /// Case-insensitive name lookup.
    pub fn name2id(&self, name: &str) -> Option<u32> {
        self.names.get(&name.to_lowercase()).copied()
    }

    pub fn id2name(&self, id: u32) -> Option<&str> {
        self.systems.get(&id).map(|s| s.name.as_str())
    }

    pub fn region_name(&self, region_id: u32) -> Option<&str> {
        self.regions.get(&region_id).map(|s| s.as_str())
    }

    pub fn contains(&self, id: u32) -> bool {
        self.systems.contains_key(&id)
    }

    /// Security class of a system. Special ids are recognized first,
    /// then the wormhole id range, then the security numeric.
    pub fn system_type(&self, id: u32) -> SpaceType {
        if id == ZARZAKH_SYSTEM_ID {
            return SpaceType::Zarzakh;
        }
        if let Some(system) = self.systems.get(&id) {
            if system.region_id == POCHVEN_REGION_ID {
                return SpaceType::Triglavian;
            }
        }
        if WH_SYSTEM_RANGE.contains(&id) {
            return SpaceType::Wormhole;
        }
        match self.systems.get(&id) {
            Some(system) if system.security >= 0.5 => SpaceType::HighSec,
            Some(system) if system.security > 0.0 => SpaceType::LowSec,
            _ => SpaceType::NullSec,
        }
    }

    pub fn system_desc(&self, id: u32) -> Option<SystemDescription> {
        let system = self.systems.get(&id)?;
        Some(SystemDescription {
            id,
            name: system.name.clone(),
            region: self
                .regions
                .get(&system.region_id)
                .cloned()
                .unwrap_or_default(),
            class: self.system_type(id),
        })
    }

    /// Wormhole class of a system: explicit system entry first, then the
    /// region entry, then derived from the security class.
    pub fn wh_class(&self, id: u32) -> Option<i32> {
        if let Some(class) = self.wh_classes.get(&id) {
            return Some(*class);
        }
        if let Some(system) = self.systems.get(&id) {
            if let Some(class) = self.wh_classes.get(&system.region_id) {
                return Some(*class);
            }
        }
        match self.system_type(id) {
            SpaceType::HighSec => Some(7),
            SpaceType::LowSec => Some(8),
            SpaceType::NullSec => Some(9),
            _ => None,
        }
    }

    /// Size of a wormhole by its type code, `Unknown` if the code is not
    /// in the catalogue.
    pub fn whsize_by_code(&self, code: &str) -> WormholeSize {
        self.statics
            .get(&code.to_uppercase())
            .map(|(_, size)| *size)
            .unwrap_or(WormholeSize::Unknown)
    }

    /// Infer a wormhole's size from the classes of its two endpoints: the
    /// hole is capped by the smaller of the two sides.
    pub fn whsize_by_system(&self, system_a: u32, system_b: u32) -> WormholeSize {
        let cap_a = self.wh_class(system_a).map(size_cap);
        let cap_b = self.wh_class(system_b).map(size_cap);
        match (cap_a, cap_b) {
            (Some(a), Some(b)) if a.is_known() && b.is_known() => a.min(b),
            (Some(a), _) if a.is_known() => a,
            (_, Some(b)) if b.is_known() => b,
            _ => WormholeSize::Unknown,
        }
    }

    /// Expected static wormhole type codes leading into `class`.
    pub fn class_statics(&self, class: i32) -> Vec<&str> {
        let mut codes: Vec<&str> = self
            .statics
            .iter()
            .filter(|(_, (c, _))| *c == class)
            .map(|(code, _)| code.as_str())
            .collect();
        codes.sort_unstable();
        codes
    }
}

/// Largest hole size a wormhole class admits.
fn size_cap(class: i32) -> WormholeSize {
    match class {
        13 => WormholeSize::Small,
        1 => WormholeSize::Medium,
        2..=4 | 7 | 8 | 12 | 14..=18 | 25 => WormholeSize::Large,
        5 | 6 | 9 => WormholeSize::XLarge,
        _ => WormholeSize::Unknown,
    }
}
