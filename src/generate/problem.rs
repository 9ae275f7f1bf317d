use rand::{Rng, RngCore};
use tracing::debug;

use crate::error::RouteError;
use crate::graph::{Connection, ConnectionId, Graph, NetId, RegionId, RegionKind};
use crate::routing::count_chord_crossings;

/// 64-bit linear congruential generator (Knuth MMIX constants) behind the
/// standard `RngCore` surface. Identical seeds replay identical problems.
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg { state: seed }
    }
}

impl RngCore for Lcg {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

const ATTEMPTS_PER_SIZE: u32 = 64;
const MAX_TOTAL_ATTEMPTS: u32 = 4096;

/// Place random perimeter connection endpoints until their chords induce
/// exactly `num_crossings` different-net interleavings. Consistent
/// under-crossing grows the connection count; exhausting the attempt cap
/// is `GenerationFailed`.
pub fn create_problem(
    graph: Graph,
    num_crossings: u32,
    seed: u64,
) -> Result<(Graph, Vec<Connection>), RouteError> {
    let frame_regions: Vec<RegionId> = graph
        .regions
        .iter()
        .filter(|region| {
            region.descriptor.kind == RegionKind::Frame && !region.ports.is_empty()
        })
        .map(|region| region.id)
        .collect();
    if frame_regions.len() < 4 {
        return Err(RouteError::GenerationFailed(
            "not enough perimeter regions for a problem".into(),
        ));
    }

    let bounds = graph.bounds();
    let perimeter = bounds.perimeter_len();
    let chord_t = |region: RegionId| {
        bounds.nearest_perimeter_t(&graph.regions[region].descriptor.center())
    };

    // Smallest connection count whose pair count can reach the target.
    let mut num_connections = 2usize;
    while (num_connections * (num_connections - 1) / 2) < num_crossings as usize {
        num_connections += 1;
    }
    let max_connections = frame_regions.len() / 2;
    num_connections = num_connections.min(max_connections);

    let mut rng = Lcg::new(seed);
    let mut attempts = 0;
    let mut window_attempts = 0;
    let mut window_best = 0;

    while attempts < MAX_TOTAL_ATTEMPTS {
        attempts += 1;
        window_attempts += 1;

        // Sample endpoint regions without replacement.
        let mut pool = frame_regions.clone();
        let mut endpoints = Vec::with_capacity(num_connections * 2);
        for _ in 0..num_connections * 2 {
            let index = rng.gen_range(0..pool.len());
            endpoints.push(pool.swap_remove(index));
        }

        let connections: Vec<Connection> = (0..num_connections)
            .map(|index| Connection {
                id: ConnectionId(index as u32),
                net: NetId(index as u32),
                start: endpoints[index * 2],
                end: endpoints[index * 2 + 1],
            })
            .collect();
        let chords: Vec<(f64, f64, NetId)> = connections
            .iter()
            .map(|connection| (chord_t(connection.start), chord_t(connection.end), connection.net))
            .collect();
        let crossings = count_chord_crossings(&chords, perimeter);
        window_best = window_best.max(crossings);

        if crossings == num_crossings {
            debug!(attempts, num_connections, "problem generated");
            return Ok((graph, connections));
        }

        // A whole window under target means the sample is too small.
        if window_attempts >= ATTEMPTS_PER_SIZE {
            if window_best < num_crossings && num_connections < max_connections {
                num_connections += 1;
            }
            window_attempts = 0;
            window_best = 0;
        }
    }

    Err(RouteError::GenerationFailed(format!(
        "no endpoint sample hit {} crossings in {} attempts",
        num_crossings, MAX_TOTAL_ATTEMPTS
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::grid::{generate_grid, GridParams};

    fn grid(cols: u32, rows: u32) -> Graph {
        generate_grid(&GridParams {
            cols,
            rows,
            ..GridParams::default()
        })
        .unwrap()
    }

    #[test]
    fn lcg_is_deterministic() {
        let mut a = Lcg::new(42);
        let mut b = Lcg::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
        assert_ne!(Lcg::new(1).next_u64(), Lcg::new(2).next_u64());
    }

    #[test]
    fn same_seed_replays_the_same_problem() {
        let (_, first) = create_problem(grid(2, 2), 1, 7).unwrap();
        let (_, second) = create_problem(grid(2, 2), 1, 7).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn generated_problem_hits_the_crossing_target() {
        let target = 2;
        let (graph, connections) = create_problem(grid(2, 2), target, 3).unwrap();
        let bounds = graph.bounds();
        let chords: Vec<(f64, f64, NetId)> = connections
            .iter()
            .map(|connection| {
                (
                    bounds.nearest_perimeter_t(
                        &graph.regions[connection.start].descriptor.center(),
                    ),
                    bounds
                        .nearest_perimeter_t(&graph.regions[connection.end].descriptor.center()),
                    connection.net,
                )
            })
            .collect();
        assert_eq!(count_chord_crossings(&chords, bounds.perimeter_len()), target);
        // Endpoints are sampled without replacement and land on the frame.
        let mut seen = Vec::new();
        for connection in &connections {
            for region in [connection.start, connection.end] {
                assert_eq!(graph.regions[region].descriptor.kind, RegionKind::Frame);
                assert!(!seen.contains(&region));
                seen.push(region);
            }
        }
    }

    #[test]
    fn unreachable_target_is_generation_failed() {
        let err = create_problem(grid(1, 1), 10_000, 0).unwrap_err();
        assert!(matches!(err, RouteError::GenerationFailed(_)));
    }

    #[test]
    fn crossing_free_problems_are_easy_to_sample() {
        let (_, connections) = create_problem(grid(1, 1), 0, 11).unwrap();
        assert_eq!(connections.len(), 2);
    }
}
