//! Shared fixture universe for routing tests. Mirrors the corridor
//! between Dodixie and Jita: the direct chain through Tama, the longer
//! Genesis detour, a low-sec corridor, and the Zarzakh pocket.

use crate::chain::{ConnectionRecord, WormholeInfo};
use crate::evedb::{
    EveDb, System, WormholeMassspan, WormholeSize, WormholeTimespan, ZARZAKH_SYSTEM_ID,
};
use std::sync::Arc;

fn sys(id: u32, name: &str, region_id: u32, security: f64) -> System {
    System {
        id,
        name: name.into(),
        region_id,
        security,
    }
}

pub fn eve_db() -> Arc<EveDb> {
    let systems = vec![
        // Sinq Laison
        sys(30002659, "Dodixie", 10000032, 0.83),
        sys(30002661, "Botane", 10000032, 0.86),
        // Genesis, direct leg
        sys(30003001, "Ourapheh", 10000067, 0.90),
        sys(30003002, "Chantrousse", 10000067, 0.85),
        // The Citadel
        sys(30003003, "Tierijev", 10000033, 0.85),
        sys(30003004, "Tannolen", 10000033, 0.80),
        sys(30003005, "Onatoh", 10000033, 0.75),
        sys(30003006, "Sujarento", 10000033, 0.30),
        sys(30002813, "Tama", 10000033, 0.30),
        sys(30003007, "Nourvukaiken", 10000033, 0.80),
        sys(30003008, "Tunttaras", 10000033, 0.75),
        // The Forge
        sys(30000135, "Ikuchi", 10000002, 0.90),
        sys(30000142, "Jita", 10000002, 0.95),
        sys(30000144, "Perimeter", 10000002, 0.95),
        sys(30003009, "Hykkota", 10000002, 0.80),
        sys(30003010, "Ansila", 10000002, 0.85),
        // Genesis detour
        sys(30003011, "Manarq", 10000067, 0.70),
        sys(30003012, "Tar", 10000067, 0.60),
        sys(30003013, "Tekaima", 10000067, 0.65),
        sys(30003014, "Tarta", 10000067, 0.70),
        sys(30003015, "Vecamia", 10000067, 0.75),
        sys(30003016, "Cleyd", 10000067, 0.80),
        sys(30003017, "Lor", 10000067, 0.85),
        sys(30003018, "Ahbazon", 10000067, 0.90),
        // Low-sec corridor
        sys(30003021, "Erme", 10000068, 0.40),
        sys(30003022, "Villore", 10000068, 0.35),
        sys(30003023, "Old Man Star", 10000068, 0.30),
        sys(30003024, "Heydieles", 10000068, 0.30),
        sys(30003025, "Fliet", 10000068, 0.35),
        sys(30003026, "Deven", 10000068, 0.30),
        sys(30003027, "Nagamanen", 10000068, 0.25),
        // Zarzakh pocket
        sys(30004563, "G-0Q86", 10000067, -0.04),
        sys(30004564, "H-PA29", 10000067, -0.10),
        sys(ZARZAKH_SYSTEM_ID, "Zarzakh", 10001000, -0.99),
        sys(30002086, "Turnur", 10000042, 0.38),
        // J-space
        sys(31000001, "J123450", 11000001, -0.99),
        sys(31000005, "Thera", 11000031, -0.99),
    ];

    let gates = vec![
        // direct chain
        (30002659, 30002661), // Dodixie - Botane
        (30002661, 30003001), // Botane - Ourapheh
        (30003001, 30003002), // Ourapheh - Chantrousse
        (30003002, 30003003), // Chantrousse - Tierijev
        (30003003, 30003004), // Tierijev - Tannolen
        (30003004, 30003005), // Tannolen - Onatoh
        (30003005, 30003006), // Onatoh - Sujarento
        (30003006, 30002813), // Sujarento - Tama
        (30002813, 30003007), // Tama - Nourvukaiken
        (30003007, 30003008), // Nourvukaiken - Tunttaras
        (30003008, 30000135), // Tunttaras - Ikuchi
        (30000135, 30000142), // Ikuchi - Jita
        (30000142, 30000144), // Jita - Perimeter
        // Genesis detour
        (30003001, 30003011), // Ourapheh - Manarq
        (30003011, 30003012), // Manarq - Tar
        (30003012, 30003013), // Tar - Tekaima
        (30003013, 30003014), // Tekaima - Tarta
        (30003014, 30003015), // Tarta - Vecamia
        (30003015, 30003016), // Vecamia - Cleyd
        (30003016, 30003017), // Cleyd - Lor
        (30003017, 30003018), // Lor - Ahbazon
        (30003018, 30003009), // Ahbazon - Hykkota
        (30003009, 30003010), // Hykkota - Ansila
        (30003010, 30000135), // Ansila - Ikuchi
        // low-sec corridor
        (30002661, 30003021), // Botane - Erme
        (30003021, 30003022), // Erme - Villore
        (30003022, 30003023), // Villore - Old Man Star
        (30003023, 30003024), // Old Man Star - Heydieles
        (30003024, 30003025), // Heydieles - Fliet
        (30003025, 30003026), // Fliet - Deven
        (30003026, 30003027), // Deven - Nagamanen
        (30003027, 30003006), // Nagamanen - Sujarento
        // Zarzakh pocket
        (30004563, ZARZAKH_SYSTEM_ID), // G-0Q86 - Zarzakh
        (ZARZAKH_SYSTEM_ID, 30004564), // Zarzakh - H-PA29
        (30002086, ZARZAKH_SYSTEM_ID), // Turnur - Zarzakh
    ];

    let regions = vec![
        (10000002, "The Forge".to_string()),
        (10000032, "Sinq Laison".to_string()),
        (10000033, "The Citadel".to_string()),
        (10000042, "Metropolis".to_string()),
        (10000067, "Genesis".to_string()),
        (10000068, "Verge Vendor".to_string()),
        (10001000, "Yasna Zakh".to_string()),
        (11000001, "A-R00001".to_string()),
        (11000031, "G-R00031".to_string()),
    ];

    let wh_classes = vec![(31000001, 2), (31000005, 12)];

    let statics = vec![
        ("N110".to_string(), 7, WormholeSize::Medium),
        ("B274".to_string(), 7, WormholeSize::Large),
        ("Q063".to_string(), 7, WormholeSize::Small),
        ("H296".to_string(), 5, WormholeSize::XLarge),
    ];

    Arc::new(EveDb::from_parts(
        systems,
        gates,
        regions,
        wh_classes,
        statics,
        vec![],
    ))
}

pub fn wormhole(
    provider: &str,
    a: u32,
    b: u32,
    size: WormholeSize,
    life: WormholeTimespan,
    mass: WormholeMassspan,
    age_hours: f64,
) -> ConnectionRecord {
    ConnectionRecord::wormhole(
        provider,
        a,
        b,
        WormholeInfo {
            sig_a: "ABC-123".into(),
            code_a: "B274".into(),
            sig_b: "DEF-456".into(),
            code_b: "K162".into(),
            size,
            life,
            mass,
            age_hours,
        },
    )
}

pub fn id_of(db: &EveDb, name: &str) -> u32 {
    db.name2id(name).unwrap()
}
