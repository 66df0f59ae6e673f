#[cfg(test)]
mod tests;

use crate::evedb::{
    EveDb, SpaceType, WormholeMassspan, WormholeSize, WormholeTimespan,
};
use crate::map::{Edge, Restrictions, SolarMap};
use std::sync::Arc;

/// One hop of a computed route, ready for display.
#[derive(Clone, Debug)]
pub struct RouteStep {
    pub system_id: u32,
    pub name: String,
    pub region: String,
    pub class: SpaceType,
    /// What to do in this system to reach the next one.
    pub action: String,
    /// Return-side wormhole details, when the next hop is a wormhole.
    pub info: Option<String>,
}

/// Builds display routes on top of the solar map.
pub struct Navigation {
    eve_db: Arc<EveDb>,
}

impl Navigation {
    pub fn new(eve_db: Arc<EveDb>) -> Self {
        Self { eve_db }
    }

    /// Compute a route and its short-format string.
    /// No path yields `(vec![], "Path is not found")`.
    pub fn route(
        &self,
        map: &mut SolarMap,
        source: u32,
        destination: u32,
        restrictions: &Restrictions,
    ) -> (Vec<RouteStep>, String) {
        let path = map.shortest_path(source, destination, restrictions);
        if path.is_empty() {
            return (vec![], "Path is not found".to_string());
        }

        // edges[i] leads from path[i] to path[i + 1].
        let mut edges: Vec<Option<Edge>> = vec![];
        let mut edges_back: Vec<Option<Edge>> = vec![];
        for hop in path.windows(2) {
            edges.push(map.edge_between(hop[0], hop[1]));
            edges_back.push(map.edge_between(hop[1], hop[0]));
        }
        edges.push(None);
        edges_back.push(None);

        let mut route = vec![];
        for (idx, &system_id) in path.iter().enumerate() {
            let (name, region, class) = match self.eve_db.system_desc(system_id) {
                Some(desc) => (desc.name, desc.region, desc.class),
                None => (system_id.to_string(), String::new(), SpaceType::Wormhole),
            };
            route.push(RouteStep {
                system_id,
                name,
                region,
                class,
                action: instructions(edges[idx].as_ref()),
                info: additional_info(edges_back[idx].as_ref()),
            });
        }

        let short = short_format(&route, &edges);
        (route, short)
    }

    /// User-facing banner for a computed route.
    pub fn route_message(route: &[RouteStep]) -> String {
        match route.len() {
            0 => "No path found between the solar systems".to_string(),
            1 => "Set the same source and destination :P".to_string(),
            n => format!("{} JUMPS", n - 1),
        }
    }
}

fn instructions(edge: Option<&Edge>) -> String {
    match edge {
        None => "Destination reached".to_string(),
        Some(Edge::Gate) => "Jump gate".to_string(),
        Some(Edge::Wormhole(side)) => {
            let mut out = format!("Jump wormhole\n{} [{}]", side.sig, side.code);
            if let Some(provider) = &side.provider_name {
                out.push_str(&format!(" [{}]", provider));
            }
            out
        }
    }
}

/// Details of the return side of the wormhole the traveller just used.
fn additional_info(edge_back: Option<&Edge>) -> Option<String> {
    let Some(Edge::Wormhole(side)) = edge_back else {
        return None;
    };
    let mut out = format!(
        "Return sig: {} [{}], Updated: {}h ago\nSize: {}, Life: {}, Mass: {}",
        side.sig,
        side.code,
        side.age_hours,
        size_text(side.size),
        life_text(side.life),
        mass_text(side.mass),
    );
    if let Some(provider) = &side.provider_name {
        out.push_str(&format!("\nSource: {}", provider));
    }
    Some(out)
}

fn size_text(size: WormholeSize) -> &'static str {
    match size {
        WormholeSize::Small => "Small",
        WormholeSize::Medium => "Medium",
        WormholeSize::Large => "Large",
        WormholeSize::XLarge => "X-large",
        WormholeSize::Unknown => "Unknown",
    }
}

fn life_text(life: WormholeTimespan) -> &'static str {
    match life {
        WormholeTimespan::Stable => "Stable",
        WormholeTimespan::Critical => "Critical",
    }
}

fn mass_text(mass: WormholeMassspan) -> &'static str {
    match mass {
        WormholeMassspan::Stable => "Stable",
        WormholeMassspan::Destab => "Destab",
        WormholeMassspan::Critical => "Critical",
        WormholeMassspan::Unknown => "Massspan unknown",
    }
}

/// Compact route string: wormhole hops are named with their entry-side
/// signature, runs of more than one gate jump collapse into `...`.
fn short_format(route: &[RouteStep], edges: &[Option<Edge>]) -> String {
    let mut tokens: Vec<String> = vec![];
    let mut gate_run = 0;

    for idx in 1..route.len() {
        let prev = &route[idx - 1];
        match &edges[idx - 1] {
            Some(Edge::Wormhole(side)) => {
                if gate_run > 1 {
                    tokens.push("...".to_string());
                    tokens.push("-->".to_string());
                }
                tokens.push(format!("{} [{}]", prev.name, side.sig));
                tokens.push("~~>".to_string());
                gate_run = 0;
            }
            _ => {
                if gate_run > 0 {
                    gate_run += 1;
                    continue;
                }
                tokens.push(prev.name.clone());
                tokens.push("-->".to_string());
                gate_run = 1;
            }
        }
    }

    if gate_run > 1 {
        tokens.push("...".to_string());
        tokens.push("-->".to_string());
    }
    if let Some(last) = route.last() {
        tokens.push(last.name.clone());
    }

    format!("Short Circuit: `{}`", tokens.join(" "))
}
