use log::info;
use shortcircuit::config::settings::Settings;
use shortcircuit::config::C;
use shortcircuit::error::{Error, Result};
use shortcircuit::evedb::EveDb;
use shortcircuit::map::{Restrictions, SolarMap};
use shortcircuit::navigation::Navigation;
use shortcircuit::upstream::{SharedMap, SourceManager};
use shortcircuit::worker::{FetchEvent, FetchRequest, NavProcessor};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// `shortcircuit [--watch] <source> <destination> [avoid...]`
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let watch = args.iter().any(|a| a == "--watch");
    args.retain(|a| a != "--watch");
    let (source_name, destination_name) = match args.as_slice() {
        [source, destination, ..] => (source.clone(), destination.clone()),
        _ => {
            eprintln!("usage: shortcircuit [--watch] <source> <destination> [avoid...]");
            std::process::exit(2);
        }
    };

    let eve_db = Arc::new(EveDb::load(Path::new(&C.db.data_dir))?);
    let source = eve_db
        .name2id(&source_name)
        .ok_or_else(|| Error::UnknownSystem(source_name.clone()))?;
    let destination = eve_db
        .name2id(&destination_name)
        .ok_or_else(|| Error::UnknownSystem(destination_name.clone()))?;
    let avoidance = args[2..]
        .iter()
        .map(|name| {
            eve_db
                .name2id(name)
                .ok_or_else(|| Error::UnknownSystem(name.clone()))
        })
        .collect::<Result<Vec<u32>>>()?;

    let map: SharedMap = Arc::new(Mutex::new(SolarMap::new(eve_db.clone())));
    let mut manager = SourceManager::new(Settings::load(&C.sources.file));
    manager.register_defaults();
    manager.load_configuration();
    let has_sources = manager.has_enabled();
    let manager = Arc::new(Mutex::new(manager));

    let restrictions = Restrictions {
        avoidance,
        ..Restrictions::default()
    };
    let navigation = Navigation::new(eve_db.clone());

    if !watch {
        if has_sources {
            let results = manager.lock().await.fetch_all(&map).await;
            report_counts(&results);
        }
        print_route(&navigation, &map, source, destination, &restrictions).await;
        return Ok(());
    }

    // Watch mode: one background fetch worker, periodic refresh, and a
    // route recomputation after every finished fetch.
    let (processor, mut events) = NavProcessor::spawn(manager.clone(), map.clone());
    let _auto_refresh = processor.spawn_auto_refresh(manager.clone(), C.fetch.auto_refresh_secs);
    if let Err(err) = processor.request(FetchRequest::All) {
        info!("Initial fetch not started: {}", err);
    }

    while let Some(event) = events.recv().await {
        match event {
            FetchEvent::Started(request) => info!("Fetch started: {:?}", request),
            FetchEvent::Finished(results) => {
                report_counts(&results);
                print_route(&navigation, &map, source, destination, &restrictions).await;
            }
        }
    }
    Ok(())
}

fn report_counts(results: &std::collections::HashMap<String, i64>) {
    for (name, count) in results {
        if *count < 0 {
            info!("{}: fetch failed", name);
        } else {
            info!("{}: {} connections", name, count);
        }
    }
}

async fn print_route(
    navigation: &Navigation,
    map: &SharedMap,
    source: u32,
    destination: u32,
    restrictions: &Restrictions,
) {
    let (route, short_format) = {
        let mut map = map.lock().await;
        navigation.route(&mut map, source, destination, restrictions)
    };

    println!("{}", Navigation::route_message(&route));
    for step in &route {
        println!(
            "{:<24} {:<16} {:<6} {}",
            step.name,
            step.region,
            step.class,
            step.action.replace('\n', " ")
        );
    }
    if !route.is_empty() {
        println!("{}", short_format);
    }
}
