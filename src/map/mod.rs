
use crate::chain::{
    ConnectionDb, ConnectionKind, ConnectionRecord, DEFAULT_MAX_AGE_HOURS, REF_PROVIDER_ID,
};
use crate::evedb::{
    EveDb, WormholeMassspan, WormholeSize, WormholeTimespan, ZARZAKH_SYSTEM_ID,
};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

/// Per-direction wormhole edge metadata: the signature and type code of
/// the side the traveller jumps from.
#[derive(Clone, Debug)]
pub struct WormholeSide {
    pub sig: String,
    pub code: String,
    pub size: WormholeSize,
    pub life: WormholeTimespan,
    pub mass: WormholeMassspan,
    pub age_hours: f64,
    pub provider_name: Option<String>,
}

#[derive(Clone, Debug)]
pub enum Edge {
    Gate,
    Wormhole(WormholeSide),
}

struct Node {
    system_id: u32,
    edges: Vec<(usize, Edge)>,
}

/// Which wormhole sizes a route may use. Unknown-size holes always pass.
#[derive(Clone, Debug)]
pub struct SizeAllowed {
    pub small: bool,
    pub medium: bool,
    pub large: bool,
    pub xlarge: bool,
}

impl Default for SizeAllowed {
    fn default() -> Self {
        Self {
            small: true,
            medium: true,
            large: true,
            xlarge: true,
        }
    }
}

impl SizeAllowed {
    pub fn allows(&self, size: WormholeSize) -> bool {
        match size {
            WormholeSize::Small => self.small,
            WormholeSize::Medium => self.medium,
            WormholeSize::Large => self.large,
            WormholeSize::XLarge => self.xlarge,
            WormholeSize::Unknown => true,
        }
    }
}

/// Traversal cost of entering a system of the given class. All ones is
/// pure hop count; raise a class to steer routes away from it.
#[derive(Clone, Debug)]
pub struct SecurityPrio {
    pub hs: u32,
    pub ls: u32,
    pub ns: u32,
    pub wh: u32,
}

impl Default for SecurityPrio {
    fn default() -> Self {
        Self {
            hs: 1,
            ls: 1,
            ns: 1,
            wh: 1,
        }
    }
}

impl SecurityPrio {
    fn for_class(&self, class: crate::evedb::SpaceType) -> u32 {
        use crate::evedb::SpaceType::*;
        match class {
            HighSec => self.hs,
            LowSec => self.ls,
            // Triglavian space and Zarzakh weigh as null-sec.
            NullSec | Triglavian | Zarzakh => self.ns,
            Wormhole => self.wh,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Restrictions {
    pub size_allowed: SizeAllowed,
    /// Reject end-of-life wormholes.
    pub ignore_eol: bool,
    /// Reject mass-critical wormholes.
    pub ignore_masscrit: bool,
    /// Reject wormholes older than this many hours. INFINITY disables.
    pub age_threshold_hours: f64,
    pub security_prio: SecurityPrio,
    /// Systems never to traverse. Source and destination are exempt.
    pub avoidance: Vec<u32>,
}

impl Default for Restrictions {
    fn default() -> Self {
        Self {
            size_allowed: SizeAllowed::default(),
            ignore_eol: false,
            ignore_masscrit: false,
            age_threshold_hours: f64::INFINITY,
            security_prio: SecurityPrio::default(),
            avoidance: vec![],
        }
    }
}

/// Routable view of the universe: static gates plus the resolved
/// wormhole chain. Rebuilt lazily after any connection mutation.
pub struct SolarMap {
    eve_db: Arc<EveDb>,
    connections: ConnectionDb,
    dirty: bool,
    index: HashMap<u32, usize>,
    nodes: Vec<Node>,
}

impl SolarMap {
    pub fn new(eve_db: Arc<EveDb>) -> Self {
        let mut connections = ConnectionDb::new();
        for &(a, b) in eve_db.gates() {
            connections.add(ConnectionRecord::gate(REF_PROVIDER_ID, a, b));
        }
        Self {
            eve_db,
            connections,
            dirty: true,
            index: HashMap::new(),
            nodes: vec![],
        }
    }

    pub fn eve_db(&self) -> Arc<EveDb> {
        self.eve_db.clone()
    }

    pub fn add_connection(&mut self, record: ConnectionRecord) {
        self.connections.add(record);
        self.dirty = true;
    }

    pub fn clear_provider(&mut self, provider_id: &str) {
        self.connections.clear_provider(provider_id);
        self.dirty = true;
    }

    pub fn contains(&mut self, system_id: u32) -> bool {
        self.build();
        self.index.contains_key(&system_id)
    }

    pub fn system_ids(&mut self) -> Vec<u32> {
        self.build();
        self.nodes.iter().map(|n| n.system_id).collect()
    }

    /// The edge from `from` to `to`, if any, with `from`-side metadata.
    pub fn edge_between(&mut self, from: u32, to: u32) -> Option<Edge> {
        self.build();
        let from = *self.index.get(&from)?;
        let to = *self.index.get(&to)?;
        self.nodes[from]
            .edges
            .iter()
            .find(|(neighbor, _)| *neighbor == to)
            .map(|(_, edge)| edge.clone())
    }

    /// Rebuild the adjacency from the resolved connection view. The built
    /// form is immutable until the next mutation.
    fn build(&mut self) {
        if !self.dirty {
            return;
        }
        self.index.clear();
        self.nodes.clear();

        let index = &mut self.index;
        let nodes = &mut self.nodes;
        let mut intern = |system_id: u32, nodes: &mut Vec<Node>| -> usize {
            *index.entry(system_id).or_insert_with(|| {
                nodes.push(Node {
                    system_id,
                    edges: vec![],
                });
                nodes.len() - 1
            })
        };

        for record in self.connections.resolved(DEFAULT_MAX_AGE_HOURS) {
            let a = intern(record.system_a, nodes);
            let b = intern(record.system_b, nodes);
            match &record.kind {
                ConnectionKind::Gate => {
                    nodes[a].edges.push((b, Edge::Gate));
                    nodes[b].edges.push((a, Edge::Gate));
                }
                ConnectionKind::Wormhole(info) => {
                    let forward = WormholeSide {
                        sig: info.sig_a.clone(),
                        code: info.code_a.clone(),
                        size: info.size,
                        life: info.life,
                        mass: info.mass,
                        age_hours: info.age_hours,
                        provider_name: record.provider_name.clone(),
                    };
                    let backward = WormholeSide {
                        sig: info.sig_b.clone(),
                        code: info.code_b.clone(),
                        ..forward.clone()
                    };
                    nodes[a].edges.push((b, Edge::Wormhole(forward)));
                    nodes[b].edges.push((a, Edge::Wormhole(backward)));
                }
            }
        }
        self.dirty = false;
    }

    /// Cost of entering `neighbor_id` through `edge`, or None when the
    /// edge is closed by the restrictions.
    fn edge_cost(&self, edge: &Edge, neighbor_id: u32, restrictions: &Restrictions) -> Option<u32> {
        match edge {
            Edge::Gate => Some(
                restrictions
                    .security_prio
                    .for_class(self.eve_db.system_type(neighbor_id)),
            ),
            Edge::Wormhole(side) => {
                if !restrictions.size_allowed.allows(side.size) {
                    return None;
                }
                if restrictions.ignore_eol && side.life == WormholeTimespan::Critical {
                    return None;
                }
                if restrictions.ignore_masscrit && side.mass == WormholeMassspan::Critical {
                    return None;
                }
                if side.age_hours > restrictions.age_threshold_hours {
                    return None;
                }
                Some(restrictions.security_prio.wh)
            }
        }
    }

    /// Least-cost path under `restrictions`, as a system id sequence.
    /// Empty when either endpoint is unknown or no path survives.
    pub fn shortest_path(
        &mut self,
        source: u32,
        destination: u32,
        restrictions: &Restrictions,
    ) -> Vec<u32> {
        self.build();

        let (Some(&src), Some(&dst)) = (self.index.get(&source), self.index.get(&destination))
        else {
            return vec![];
        };

        if source == destination {
            return vec![source];
        }

        // Endpoints always override the avoidance list.
        let mut avoid: HashSet<u32> = restrictions.avoidance.iter().copied().collect();
        avoid.remove(&source);
        avoid.remove(&destination);

        // Zarzakh is transit-locked unless it is where we start or end.
        if source != ZARZAKH_SYSTEM_ID && destination != ZARZAKH_SYSTEM_ID {
            avoid.insert(ZARZAKH_SYSTEM_ID);
        }

        let mut visited = vec![false; self.nodes.len()];
        for system_id in &avoid {
            if let Some(&idx) = self.index.get(system_id) {
                visited[idx] = true;
            }
        }

        let mut distance = vec![u64::MAX; self.nodes.len()];
        let mut parent = vec![usize::MAX; self.nodes.len()];
        // (cost, insertion sequence, node): equal costs pop in insertion order.
        let mut queue: BinaryHeap<Reverse<(u64, u64, usize)>> = BinaryHeap::new();
        let mut sequence: u64 = 0;

        distance[src] = 0;
        queue.push(Reverse((0, sequence, src)));

        while let Some(Reverse((cost, _, current))) = queue.pop() {
            if visited[current] {
                continue;
            }
            visited[current] = true;

            if current == dst {
                let mut path = vec![];
                let mut step = dst;
                while step != usize::MAX {
                    path.push(self.nodes[step].system_id);
                    step = parent[step];
                }
                path.reverse();
                return path;
            }

            for (neighbor, edge) in &self.nodes[current].edges {
                if visited[*neighbor] {
                    continue;
                }
                let Some(step_cost) =
                    self.edge_cost(edge, self.nodes[*neighbor].system_id, restrictions)
                else {
                    continue;
                };
                let next_cost = cost + u64::from(step_cost);
                if next_cost < distance[*neighbor] {
                    distance[*neighbor] = next_cost;
                    parent[*neighbor] = current;
                    sequence += 1;
                    queue.push(Reverse((next_cost, sequence, *neighbor)));
                }
            }
        }

        vec![]
    }
}
