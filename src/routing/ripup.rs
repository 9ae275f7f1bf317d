use std::collections::VecDeque;

use tracing::debug;

use crate::graph::{ConnectionId, Graph, RouteId};

use super::types::SolvedRoute;

/// Tear a solved route out of the graph: clear its port claims, bump every
/// rip counter on its path, drop its region records, and requeue the
/// connection.
pub(crate) fn rip_route(
    graph: &mut Graph,
    solved_routes: &mut Vec<SolvedRoute>,
    unprocessed: &mut VecDeque<ConnectionId>,
    route_id: RouteId,
) -> Option<ConnectionId> {
    let position = solved_routes.iter().position(|route| route.id == route_id)?;
    let route = solved_routes.remove(position);

    for step in &route.steps {
        let port = &mut graph.ports[step.port];
        if port.assignment.map(|a| a.route) == Some(route_id) {
            port.assignment = None;
        }
        port.rip_count += 1;
    }
    for step in &route.steps {
        graph.regions[step.region]
            .assignments
            .retain(|assignment| assignment.route != route_id);
    }

    unprocessed.push_back(route.connection);
    debug!(
        connection = %route.connection,
        route = %route_id,
        "ripped route, connection requeued"
    );
    Some(route.connection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Bounds, Point};
    use crate::graph::{
        NetId, PortAssignment, PortId, RegionAssignment, RegionDescriptor, RegionId, RegionKind,
    };
    use crate::routing::types::RouteStep;

    fn corridor() -> Graph {
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

    fn installed_route(graph: &mut Graph) -> SolvedRoute {
        let route_id = RouteId(0);
        let connection = ConnectionId(0);
        let net = NetId(0);
        for port in [PortId(0), PortId(1)] {
            graph.ports[port].assignment = Some(PortAssignment {
                connection,
                net,
                route: route_id,
            });
        }
        graph.regions[RegionId(1)].assignments.push(RegionAssignment {
            ports: (PortId(0), PortId(1)),
            connection,
            net,
            route: route_id,
        });
        SolvedRoute {
            id: route_id,
            connection,
            net,
            steps: vec![
                RouteStep {
                    port: PortId(0),
                    last_port: None,
                    region: RegionId(0),
                    next_region: RegionId(1),
                },
                RouteStep {
                    port: PortId(1),
                    last_port: Some(PortId(0)),
                    region: RegionId(1),
                    next_region: RegionId(2),
                },
            ],
            required_rip: false,
        }
    }

    #[test]
    fn rip_clears_ports_regions_and_requeues() {
        let mut graph = corridor();
        let route = installed_route(&mut graph);
        let mut solved_routes = vec![route];
        let mut unprocessed = VecDeque::new();

        let requeued = rip_route(&mut graph, &mut solved_routes, &mut unprocessed, RouteId(0));

        assert_eq!(requeued, Some(ConnectionId(0)));
        assert!(solved_routes.is_empty());
        assert_eq!(unprocessed, VecDeque::from([ConnectionId(0)]));
        for port in [PortId(0), PortId(1)] {
            assert_eq!(graph.ports[port].assignment, None);
            assert_eq!(graph.ports[port].rip_count, 1);
        }
        assert!(graph.regions[RegionId(1)].assignments.is_empty());
    }

    #[test]
    fn rip_leaves_foreign_port_claims_alone() {
        let mut graph = corridor();
        let route = installed_route(&mut graph);
        // Port 1 has since been taken over by another route of the same net.
        graph.ports[PortId(1)].assignment = Some(PortAssignment {
            connection: ConnectionId(1),
            net: NetId(0),
            route: RouteId(5),
        });
        let mut solved_routes = vec![route];
        let mut unprocessed = VecDeque::new();

        rip_route(&mut graph, &mut solved_routes, &mut unprocessed, RouteId(0));

        assert_eq!(graph.ports[PortId(0)].assignment, None);
        assert!(graph.ports[PortId(1)].assignment.is_some());
        assert_eq!(graph.ports[PortId(1)].rip_count, 1);
    }

    #[test]
    fn unknown_route_is_a_no_op() {
        let mut graph = corridor();
        let mut solved_routes = Vec::new();
        let mut unprocessed = VecDeque::new();
        assert_eq!(
            rip_route(&mut graph, &mut solved_routes, &mut unprocessed, RouteId(9)),
            None
        );
        assert!(unprocessed.is_empty());
    }
}
