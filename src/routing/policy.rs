use crate::graph::{Connection, Graph, NetId, PortId, RegionAssignment, RegionId};

use super::crossing::crossings_in_region;
use super::heuristic::{HopTables, UNREACHABLE};
use super::types::{SolverParameters, UnitOfCost};

/// Capability set consulted by the engine. The base implementation prices
/// everything at zero; the jumper policy wires in the hop tables and the
/// region crossing predicate.
pub trait SolverPolicy {
    fn estimate_cost_to_end(&self, graph: &Graph, port: PortId, end: RegionId) -> f64;

    fn port_usage_penalty(&self, graph: &Graph, port: PortId) -> f64;

    fn increased_region_cost(
        &self,
        graph: &Graph,
        region: RegionId,
        enter: PortId,
        exit: PortId,
        net: NetId,
    ) -> f64;

    fn rips_required(
        &self,
        graph: &Graph,
        region: RegionId,
        enter: PortId,
        exit: PortId,
        net: NetId,
    ) -> Vec<RegionAssignment>;
}

/// All-zero cost policy. Search degenerates to breadth-order flooding and
/// nothing is ever ripped for crossing.
pub struct BasePolicy;

impl SolverPolicy for BasePolicy {
    fn estimate_cost_to_end(&self, _graph: &Graph, _port: PortId, _end: RegionId) -> f64 {
        0.0
    }

    fn port_usage_penalty(&self, _graph: &Graph, _port: PortId) -> f64 {
        0.0
    }

    fn increased_region_cost(
        &self,
        _graph: &Graph,
        _region: RegionId,
        _enter: PortId,
        _exit: PortId,
        _net: NetId,
    ) -> f64 {
        0.0
    }

    fn rips_required(
        &self,
        _graph: &Graph,
        _region: RegionId,
        _enter: PortId,
        _exit: PortId,
        _net: NetId,
    ) -> Vec<RegionAssignment> {
        Vec::new()
    }
}

pub struct JumperPolicy {
    params: SolverParameters,
    hops: HopTables,
}

impl JumperPolicy {
    pub fn new(graph: &Graph, connections: &[Connection], params: SolverParameters) -> Self {
        let hops = HopTables::compute(graph, connections.iter().map(|c| c.end));
        JumperPolicy { params, hops }
    }

    pub fn hop_tables(&self) -> &HopTables {
        &self.hops
    }
}

impl SolverPolicy for JumperPolicy {
    fn estimate_cost_to_end(&self, graph: &Graph, port: PortId, end: RegionId) -> f64 {
        match self.params.unit_of_cost {
            UnitOfCost::Hops => {
                let hops = self.hops.port_distance(graph, end, port);
                if hops == UNREACHABLE {
                    f64::INFINITY
                } else {
                    f64::from(hops)
                }
            }
            UnitOfCost::Distance => graph
                .port(port)
                .position
                .distance_to(&graph.region(end).descriptor.center()),
        }
    }

    fn port_usage_penalty(&self, graph: &Graph, port: PortId) -> f64 {
        self.params.port_usage_penalty * f64::from(graph.port(port).rip_count)
    }

    fn increased_region_cost(
        &self,
        graph: &Graph,
        region: RegionId,
        enter: PortId,
        exit: PortId,
        net: NetId,
    ) -> f64 {
        let check = crossings_in_region(graph, region, enter, exit, net);
        self.params.crossing_penalty * f64::from(check.count)
    }

    fn rips_required(
        &self,
        graph: &Graph,
        region: RegionId,
        enter: PortId,
        exit: PortId,
        net: NetId,
    ) -> Vec<RegionAssignment> {
        // Crossings persist legally under jumpers. Anywhere else the
        // crossed assignments have to go.
        if graph.region(region).descriptor.allows_crossings() {
            return Vec::new();
        }
        crossings_in_region(graph, region, enter, exit, net).offenders
    }
}
