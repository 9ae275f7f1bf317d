use std::collections::{HashMap, VecDeque};

use petgraph::graphmap::UnGraphMap;

use crate::graph::{Graph, PortId, RegionId};

pub const UNREACHABLE: u32 = u32::MAX;

/// Per-destination hop distances over the region-adjacency graph, computed
/// once per distinct end region with an unweighted BFS.
#[derive(Clone, Debug, Default)]
pub struct HopTables {
    tables: HashMap<RegionId, Vec<u32>>,
}

impl HopTables {
    pub fn compute<I>(graph: &Graph, destinations: I) -> Self
    where
        I: IntoIterator<Item = RegionId>,
    {
        let mut adjacency: UnGraphMap<u32, ()> = UnGraphMap::new();
        for region in &graph.regions {
            adjacency.add_node(region.id.0);
        }
        for port in &graph.ports {
            adjacency.add_edge(port.regions.0 .0, port.regions.1 .0, ());
        }

        let mut tables = HashMap::new();
        for destination in destinations {
            tables
                .entry(destination)
                .or_insert_with(|| bfs_distances(&adjacency, graph.regions.len(), destination));
        }
        HopTables { tables }
    }

    pub fn region_distance(&self, destination: RegionId, region: RegionId) -> u32 {
        self.tables
            .get(&destination)
            .map(|table| table[region])
            .unwrap_or(UNREACHABLE)
    }

    /// Minimum hop distance of the port's two adjacent regions.
    pub fn port_distance(&self, graph: &Graph, destination: RegionId, port: PortId) -> u32 {
        let port = graph.port(port);
        self.region_distance(destination, port.regions.0)
            .min(self.region_distance(destination, port.regions.1))
    }
}

fn bfs_distances(adjacency: &UnGraphMap<u32, ()>, num_regions: usize, from: RegionId) -> Vec<u32> {
    let mut distances = vec![UNREACHABLE; num_regions];
    let mut queue = VecDeque::new();
    distances[from] = 0;
    queue.push_back(from.0);

    while let Some(region) = queue.pop_front() {
        let next = distances[region as usize] + 1;
        for neighbor in adjacency.neighbors(region) {
            if distances[neighbor as usize] == UNREACHABLE {
                distances[neighbor as usize] = next;
                queue.push_back(neighbor);
            }
        }
    }
    distances
}
