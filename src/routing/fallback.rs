use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::Rng;
use tracing::debug;

use crate::generate::Lcg;
use crate::graph::{Connection, Graph};

use super::engine::RouteEngine;
use super::types::{ConnectionOrder, SolverParameters};

/// Deterministic seed for parameter perturbation, derived from the
/// connection set so reruns of the same problem replay identically.
pub(crate) fn solver_seed(connections: &[Connection]) -> u64 {
    let mut hasher = DefaultHasher::new();
    connections.len().hash(&mut hasher);
    let mut keys: Vec<(u32, u32, u32, u32)> = connections
        .iter()
        .map(|connection| {
            (
                connection.id.0,
                connection.net.0,
                connection.start.0,
                connection.end.0,
            )
        })
        .collect();
    keys.sort_unstable();
    for key in keys {
        key.hash(&mut hasher);
    }
    hasher.finish()
}

const GREEDY_CHOICES: [f64; 4] = [1.0, 0.8, 1.5, 2.0];
const ORDER_CHOICES: [ConnectionOrder; 3] = [
    ConnectionOrder::NearFirst,
    ConnectionOrder::FarFirst,
    ConnectionOrder::Input,
];

/// Run the engine, and on failure retry whole solves with perturbed
/// parameters, adopting the first successful attempt. Each attempt works
/// on its own copy of the pristine graph.
pub fn solve_with_fallback(
    graph: &Graph,
    connections: &[Connection],
    params: &SolverParameters,
    extra_attempts: u32,
) -> RouteEngine {
    let mut engine = RouteEngine::new(graph.clone(), connections.to_vec(), *params);
    engine.solve();
    if engine.solved() || extra_attempts == 0 {
        return engine;
    }

    let mut rng = Lcg::new(solver_seed(connections));
    let mut last = engine;
    for attempt in 0..extra_attempts {
        let mut perturbed = *params;
        perturbed.greedy_multiplier = GREEDY_CHOICES[rng.gen_range(0..GREEDY_CHOICES.len())];
        perturbed.rip_cost = params.rip_cost * (1.0 + f64::from(attempt) * 0.5);
        perturbed.connection_order = ORDER_CHOICES[attempt as usize % ORDER_CHOICES.len()];
        debug!(
            attempt,
            greedy = perturbed.greedy_multiplier,
            rip_cost = perturbed.rip_cost,
            "fallback attempt"
        );

        let mut engine = RouteEngine::new(graph.clone(), connections.to_vec(), perturbed);
        engine.solve();
        if engine.solved() {
            return engine;
        }
        last = engine;
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Bounds, Point};
    use crate::graph::{ConnectionId, NetId, RegionDescriptor, RegionId, RegionKind};

    fn line_graph() -> Graph {
        let mut graph = Graph::new();
        for index in 0..3 {
            graph.add_region(RegionDescriptor {
                bounds: Bounds::new(
                    Point::new(index as f64 * 10.0, 0.0),
                    Point::new(index as f64 * 10.0 + 10.0, 10.0),
                ),
                kind: RegionKind::Channel,
                axis_aligned: true,
            });
        }
        graph
            .add_port(Point::new(10.0, 5.0), RegionId(0), RegionId(1))
            .unwrap();
        graph
            .add_port(Point::new(20.0, 5.0), RegionId(1), RegionId(2))
            .unwrap();
        graph
    }

    fn connections() -> Vec<Connection> {
        vec![Connection {
            id: ConnectionId(0),
            net: NetId(0),
            start: RegionId(0),
            end: RegionId(2),
        }]
    }

    #[test]
    fn solvable_problems_return_from_the_base_attempt() {
        let engine = solve_with_fallback(
            &line_graph(),
            &connections(),
            &SolverParameters::default(),
            3,
        );
        assert!(engine.solved());
        assert_eq!(
            engine.connections()[0].id,
            ConnectionId(0)
        );
    }

    #[test]
    fn unsolvable_problems_fail_after_all_attempts() {
        let mut graph = line_graph();
        // Detached target region.
        let island = graph.add_region(RegionDescriptor {
            bounds: Bounds::new(Point::new(50.0, 0.0), Point::new(60.0, 10.0)),
            kind: RegionKind::Channel,
            axis_aligned: true,
        });
        let connections = vec![Connection {
            id: ConnectionId(0),
            net: NetId(0),
            start: RegionId(0),
            end: island,
        }];
        let engine =
            solve_with_fallback(&graph, &connections, &SolverParameters::default(), 2);
        assert!(engine.failed());
    }

    #[test]
    fn seed_depends_only_on_the_connection_set() {
        let mut reversed = connections();
        reversed.reverse();
        assert_eq!(solver_seed(&connections()), solver_seed(&reversed));
    }
}
