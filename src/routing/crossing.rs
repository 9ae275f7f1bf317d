use crate::geometry::chords_cross;
use crate::graph::{Graph, NetId, PortId, Region, RegionAssignment, RegionId};

/// Result of checking a candidate port pair against a region's assignments.
#[derive(Clone, Debug, Default)]
pub struct CrossingCheck {
    /// Different-net assignments the candidate chord would interleave with.
    pub count: u32,
    pub offenders: Vec<RegionAssignment>,
}

/// Boundary parameter of a port on a region. Axis-aligned regions use the
/// geometric perimeter-t of the port position; others fall back to the
/// port's index in the region's cyclic port order.
pub(crate) fn port_parameter(graph: &Graph, region: &Region, port: PortId) -> f64 {
    if region.descriptor.axis_aligned {
        region
            .descriptor
            .bounds
            .perimeter_t(&graph.port(port).position)
    } else {
        region
            .ports
            .iter()
            .position(|&p| p == port)
            .map(|index| index as f64)
            .unwrap_or(0.0)
    }
}

fn boundary_len(region: &Region) -> f64 {
    if region.descriptor.axis_aligned {
        region.descriptor.bounds.perimeter_len()
    } else {
        region.ports.len().max(1) as f64
    }
}

/// Count how many different-net assignments of `region_id` the chord
/// (enter, exit) would cross, and collect them for potential rip-up.
pub fn crossings_in_region(
    graph: &Graph,
    region_id: RegionId,
    enter: PortId,
    exit: PortId,
    net: NetId,
) -> CrossingCheck {
    let region = graph.region(region_id);
    let perimeter = boundary_len(region);
    let t_enter = port_parameter(graph, region, enter);
    let t_exit = port_parameter(graph, region, exit);

    let mut check = CrossingCheck::default();
    for assignment in &region.assignments {
        if assignment.net == net {
            continue;
        }
        let t_a = port_parameter(graph, region, assignment.ports.0);
        let t_b = port_parameter(graph, region, assignment.ports.1);
        if chords_cross(t_enter, t_exit, t_a, t_b, perimeter) {
            check.count += 1;
            check.offenders.push(*assignment);
        }
    }
    check
}

/// Pairwise different-net interleavings among endpoint chords expressed as
/// perimeter parameters. Shared by the problem generator and the budget
/// estimate.
pub fn count_chord_crossings(chords: &[(f64, f64, NetId)], perimeter: f64) -> u32 {
    let mut crossings = 0;
    for (index, &(a, b, net_a)) in chords.iter().enumerate() {
        for &(c, d, net_b) in &chords[index + 1..] {
            if net_a != net_b && chords_cross(a, b, c, d, perimeter) {
                crossings += 1;
            }
        }
    }
    crossings
}
