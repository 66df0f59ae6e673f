use super::*;
use crate::evedb::{WormholeMassspan, WormholeSize, WormholeTimespan};
use crate::map::Restrictions;
use crate::testkit::{eve_db, id_of, wormhole};

#[test]
fn test_route_with_wormhole_hop() {
    let db = eve_db();
    let mut map = SolarMap::new(db.clone());
    map.add_connection(
        wormhole(
            "test",
            id_of(&db, "Botane"),
            id_of(&db, "Ikuchi"),
            WormholeSize::Large,
            WormholeTimespan::Stable,
            WormholeMassspan::Destab,
            4.2,
        )
        .with_provider_name("Tripwire"),
    );

    let nav = Navigation::new(db.clone());
    let (route, short) = nav.route(
        &mut map,
        id_of(&db, "Dodixie"),
        id_of(&db, "Jita"),
        &Restrictions::default(),
    );

    let names: Vec<&str> = route.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Dodixie", "Botane", "Ikuchi", "Jita"]);

    assert_eq!(route[0].action, "Jump gate");
    assert_eq!(route[0].region, "Sinq Laison");
    assert_eq!(
        route[1].action,
        "Jump wormhole\nABC-123 [B274] [Tripwire]"
    );
    // The jump step carries the return side of the hole.
    let info = route[1].info.as_deref().unwrap();
    assert!(info.starts_with("Return sig: DEF-456 [K162], Updated: 4.2h ago"));
    assert!(info.contains("Size: Large, Life: Stable, Mass: Destab"));
    assert!(info.contains("Source: Tripwire"));
    assert!(route[2].info.is_none());
    assert_eq!(route[3].action, "Destination reached");

    assert_eq!(
        short,
        "Short Circuit: `Dodixie --> Botane [ABC-123] ~~> Ikuchi --> Jita`"
    );
}

#[test]
fn test_short_format_elides_gate_runs() {
    let db = eve_db();
    let mut map = SolarMap::new(db.clone());
    map.add_connection(wormhole(
        "test",
        id_of(&db, "Tama"),
        id_of(&db, "Jita"),
        WormholeSize::Large,
        WormholeTimespan::Stable,
        WormholeMassspan::Stable,
        1.0,
    ));

    let nav = Navigation::new(db.clone());
    let (route, short) = nav.route(
        &mut map,
        id_of(&db, "Dodixie"),
        id_of(&db, "Jita"),
        &Restrictions::default(),
    );

    assert_eq!(route.len(), 10);
    assert_eq!(
        short,
        "Short Circuit: `Dodixie --> ... --> Tama [ABC-123] ~~> Jita`"
    );
}

#[test]
fn test_gate_only_route_short_format() {
    let db = eve_db();
    let mut map = SolarMap::new(db.clone());
    let nav = Navigation::new(db.clone());
    let (route, short) = nav.route(
        &mut map,
        id_of(&db, "Ikuchi"),
        id_of(&db, "Perimeter"),
        &Restrictions::default(),
    );
    let names: Vec<&str> = route.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Ikuchi", "Jita", "Perimeter"]);
    assert_eq!(short, "Short Circuit: `Ikuchi --> ... --> Perimeter`");
}

#[test]
fn test_no_path() {
    let db = eve_db();
    let mut map = SolarMap::new(db.clone());
    let nav = Navigation::new(db.clone());
    let (route, short) = nav.route(
        &mut map,
        id_of(&db, "Jita"),
        id_of(&db, "J123450"),
        &Restrictions::default(),
    );
    assert!(route.is_empty());
    assert_eq!(short, "Path is not found");
    assert_eq!(
        Navigation::route_message(&route),
        "No path found between the solar systems"
    );
}

#[test]
fn test_route_messages() {
    let db = eve_db();
    let mut map = SolarMap::new(db.clone());
    let nav = Navigation::new(db.clone());

    let jita = id_of(&db, "Jita");
    let (route, _) = nav.route(&mut map, jita, jita, &Restrictions::default());
    assert_eq!(
        Navigation::route_message(&route),
        "Set the same source and destination :P"
    );

    let (route, _) = nav.route(
        &mut map,
        id_of(&db, "Dodixie"),
        id_of(&db, "Ikuchi"),
        &Restrictions::default(),
    );
    assert_eq!(Navigation::route_message(&route), "11 JUMPS");
}
