use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::geometry::{Bounds, Point};

#[repr(transparent)]
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RegionId(pub u32);

#[repr(transparent)]
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PortId(pub u32);

#[repr(transparent)]
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ConnectionId(pub u32);

#[repr(transparent)]
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NetId(pub u32);

#[repr(transparent)]
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Debug, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RouteId(pub u64);

macro_rules! display_id {
    ($id:ty) => {
        impl fmt::Display for $id {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

display_id!(RegionId);
display_id!(PortId);
display_id!(ConnectionId);
display_id!(NetId);
display_id!(RouteId);

impl<T> Index<RegionId> for Vec<T> {
    type Output = T;

    fn index(&self, index: RegionId) -> &Self::Output {
        &self[index.0 as usize]
    }
}

impl<T> IndexMut<RegionId> for Vec<T> {
    fn index_mut(&mut self, index: RegionId) -> &mut Self::Output {
        &mut self[index.0 as usize]
    }
}

impl<T> Index<PortId> for Vec<T> {
    type Output = T;

    fn index(&self, index: PortId) -> &Self::Output {
        &self[index.0 as usize]
    }
}

impl<T> IndexMut<PortId> for Vec<T> {
    fn index_mut(&mut self, index: PortId) -> &mut Self::Output {
        &mut self[index.0 as usize]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegionKind {
    /// Outer ring region where connection endpoints land.
    Frame,
    /// Under-jumper region. Different-net chords may cross here.
    Jumper,
    /// Plain routing area. Different-net crossings conflict here.
    Channel,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionDescriptor {
    pub bounds: Bounds,
    pub kind: RegionKind,
    pub axis_aligned: bool,
}

impl RegionDescriptor {
    pub fn center(&self) -> Point {
        self.bounds.center()
    }

    pub fn allows_crossings(&self) -> bool {
        self.kind == RegionKind::Jumper
    }
}

/// Live record of a port claimed by a solved route.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PortAssignment {
    pub connection: ConnectionId,
    pub net: NetId,
    pub route: RouteId,
}

/// Live record of a port pair traversing a region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegionAssignment {
    pub ports: (PortId, PortId),
    pub connection: ConnectionId,
    pub net: NetId,
    pub route: RouteId,
}

#[derive(Clone, Debug)]
pub struct Region {
    pub id: RegionId,
    /// Port construction order. Expansion iterates it, and it doubles as
    /// the cyclic boundary order for non-axis-aligned regions.
    pub ports: Vec<PortId>,
    pub descriptor: RegionDescriptor,
    pub assignments: Vec<RegionAssignment>,
}

#[derive(Clone, Debug)]
pub struct Port {
    pub id: PortId,
    pub regions: (RegionId, RegionId),
    pub position: Point,
    pub assignment: Option<PortAssignment>,
    pub rip_count: u32,
}

impl Port {
    /// The region on the other side of this port.
    pub fn other_region(&self, region: RegionId) -> RegionId {
        if self.regions.0 == region {
            self.regions.1
        } else {
            self.regions.0
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub net: NetId,
    pub start: RegionId,
    pub end: RegionId,
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    pub regions: Vec<Region>,
    pub ports: Vec<Port>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn add_region(&mut self, descriptor: RegionDescriptor) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        self.regions.push(Region {
            id,
            ports: Vec::new(),
            descriptor,
            assignments: Vec::new(),
        });
        id
    }

    pub fn add_port(
        &mut self,
        position: Point,
        region_a: RegionId,
        region_b: RegionId,
    ) -> Result<PortId, RouteError> {
        if region_a == region_b {
            return Err(RouteError::MalformedGraph(format!(
                "port would straddle region {} twice",
                region_a
            )));
        }
        for region in [region_a, region_b] {
            if region.0 as usize >= self.regions.len() {
                return Err(RouteError::MalformedGraph(format!(
                    "port references unknown region {}",
                    region
                )));
            }
        }
        let id = PortId(self.ports.len() as u32);
        self.ports.push(Port {
            id,
            regions: (region_a, region_b),
            position,
            assignment: None,
            rip_count: 0,
        });
        self.regions[region_a].ports.push(id);
        self.regions[region_b].ports.push(id);
        Ok(id)
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id]
    }

    pub fn port(&self, id: PortId) -> &Port {
        &self.ports[id]
    }

    /// Union of all region bounds.
    pub fn bounds(&self) -> Bounds {
        let mut iter = self.regions.iter().map(|r| r.descriptor.bounds);
        let first = iter
            .next()
            .unwrap_or_else(|| Bounds::new(Point::default(), Point::default()));
        iter.fold(first, |acc, b| acc.union(&b))
    }

    pub fn to_serialized(&self) -> SerializedGraph {
        SerializedGraph {
            ports: self
                .ports
                .iter()
                .map(|port| SerializedPort {
                    port_id: port.id.0,
                    region1_id: port.regions.0 .0,
                    region2_id: port.regions.1 .0,
                    d: port.position,
                })
                .collect(),
            regions: self
                .regions
                .iter()
                .map(|region| SerializedRegion {
                    region_id: region.id.0,
                    point_ids: region.ports.iter().map(|p| p.0).collect(),
                    d: region.descriptor,
                })
                .collect(),
        }
    }

    pub fn from_serialized(serialized: &SerializedGraph) -> Result<Self, RouteError> {
        let num_regions = serialized.regions.len();
        let num_ports = serialized.ports.len();

        // Ids double as arena indices, so they must cover 0..n exactly.
        let mut regions: Vec<Option<Region>> = vec![None; num_regions];
        for region in &serialized.regions {
            let slot = regions.get_mut(region.region_id as usize).ok_or_else(|| {
                RouteError::MalformedGraph(format!("region id {} out of range", region.region_id))
            })?;
            if slot.is_some() {
                return Err(RouteError::MalformedGraph(format!(
                    "duplicate region id {}",
                    region.region_id
                )));
            }
            *slot = Some(Region {
                id: RegionId(region.region_id),
                ports: Vec::with_capacity(region.point_ids.len()),
                descriptor: region.d,
                assignments: Vec::new(),
            });
        }

        let mut ports: Vec<Option<Port>> = vec![None; num_ports];
        for port in &serialized.ports {
            let slot = ports.get_mut(port.port_id as usize).ok_or_else(|| {
                RouteError::MalformedGraph(format!("port id {} out of range", port.port_id))
            })?;
            if slot.is_some() {
                return Err(RouteError::MalformedGraph(format!(
                    "duplicate port id {}",
                    port.port_id
                )));
            }
            for region_id in [port.region1_id, port.region2_id] {
                if region_id as usize >= num_regions {
                    return Err(RouteError::MalformedGraph(format!(
                        "port {} references unknown region {}",
                        port.port_id, region_id
                    )));
                }
            }
            if port.region1_id == port.region2_id {
                return Err(RouteError::MalformedGraph(format!(
                    "port {} straddles region {} twice",
                    port.port_id, port.region1_id
                )));
            }
            *slot = Some(Port {
                id: PortId(port.port_id),
                regions: (RegionId(port.region1_id), RegionId(port.region2_id)),
                position: port.d,
                assignment: None,
                rip_count: 0,
            });
        }

        let mut regions: Vec<Region> = regions
            .into_iter()
            .map(|region| region.expect("dense region ids"))
            .collect();
        let ports: Vec<Port> = ports
            .into_iter()
            .map(|port| port.expect("dense port ids"))
            .collect();

        // Region port lists come from the serialized order so the cyclic
        // boundary order survives the round trip.
        for region in &serialized.regions {
            let list = &mut regions[region.region_id as usize].ports;
            for &point_id in &region.point_ids {
                let port = ports.get(point_id as usize).ok_or_else(|| {
                    RouteError::MalformedGraph(format!(
                        "region {} references unknown port {}",
                        region.region_id, point_id
                    ))
                })?;
                if port.regions.0 .0 != region.region_id && port.regions.1 .0 != region.region_id {
                    return Err(RouteError::MalformedGraph(format!(
                        "region {} lists port {} that does not straddle it",
                        region.region_id, point_id
                    )));
                }
                list.push(PortId(point_id));
            }
        }

        // Every port must appear in exactly its two regions.
        for port in &ports {
            for region_id in [port.regions.0, port.regions.1] {
                if !regions[region_id].ports.contains(&port.id) {
                    return Err(RouteError::MalformedGraph(format!(
                        "port {} missing from region {}",
                        port.id, region_id
                    )));
                }
            }
        }

        Ok(Graph { regions, ports })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedPort {
    pub port_id: u32,
    pub region1_id: u32,
    pub region2_id: u32,
    pub d: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRegion {
    pub region_id: u32,
    pub point_ids: Vec<u32>,
    pub d: RegionDescriptor,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedGraph {
    pub ports: Vec<SerializedPort>,
    pub regions: Vec<SerializedRegion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedConnection {
    pub connection_id: u32,
    pub start_region_id: u32,
    pub end_region_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutually_connected_network_id: Option<u32>,
}

pub fn connections_to_serialized(connections: &[Connection]) -> Vec<SerializedConnection> {
    connections
        .iter()
        .map(|connection| SerializedConnection {
            connection_id: connection.id.0,
            start_region_id: connection.start.0,
            end_region_id: connection.end.0,
            // The implicit net of a standalone connection is its own id.
            mutually_connected_network_id: if connection.net.0 == connection.id.0 {
                None
            } else {
                Some(connection.net.0)
            },
        })
        .collect()
}

pub fn connections_from_serialized(
    serialized: &[SerializedConnection],
    graph: &Graph,
) -> Result<Vec<Connection>, RouteError> {
    serialized
        .iter()
        .map(|connection| {
            for region_id in [connection.start_region_id, connection.end_region_id] {
                if region_id as usize >= graph.regions.len() {
                    return Err(RouteError::MalformedGraph(format!(
                        "connection {} references unknown region {}",
                        connection.connection_id, region_id
                    )));
                }
            }
            if connection.start_region_id == connection.end_region_id {
                return Err(RouteError::MalformedGraph(format!(
                    "connection {} starts and ends in region {}",
                    connection.connection_id, connection.start_region_id
                )));
            }
            Ok(Connection {
                id: ConnectionId(connection.connection_id),
                net: NetId(
                    connection
                        .mutually_connected_network_id
                        .unwrap_or(connection.connection_id),
                ),
                start: RegionId(connection.start_region_id),
                end: RegionId(connection.end_region_id),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Bounds, Point};

    fn descriptor(kind: RegionKind) -> RegionDescriptor {
        RegionDescriptor {
            bounds: Bounds::new(Point::new(0.0, 0.0), Point::new(4.0, 4.0)),
            kind,
            axis_aligned: true,
        }
    }

    fn two_region_graph() -> Graph {
        let mut graph = Graph::new();
        let a = graph.add_region(descriptor(RegionKind::Frame));
        let b = graph.add_region(descriptor(RegionKind::Channel));
        graph.add_port(Point::new(2.0, 4.0), a, b).unwrap();
        graph
    }

    #[test]
    fn add_port_registers_in_both_regions() {
        let graph = two_region_graph();
        assert_eq!(graph.regions[0].ports, vec![PortId(0)]);
        assert_eq!(graph.regions[1].ports, vec![PortId(0)]);
        assert_eq!(
            graph.port(PortId(0)).other_region(RegionId(0)),
            RegionId(1)
        );
    }

    #[test]
    fn add_port_rejects_degenerate_regions() {
        let mut graph = two_region_graph();
        let err = graph
            .add_port(Point::new(0.0, 0.0), RegionId(0), RegionId(0))
            .unwrap_err();
        assert!(matches!(err, RouteError::MalformedGraph(_)));
    }

    #[test]
    fn serialization_round_trip_is_identical() {
        let graph = two_region_graph();
        let serialized = graph.to_serialized();
        let restored = Graph::from_serialized(&serialized).unwrap();
        assert_eq!(restored.to_serialized(), serialized);
        assert_eq!(restored.regions[0].ports, graph.regions[0].ports);
    }

    #[test]
    fn from_serialized_rejects_dangling_region_reference() {
        let mut serialized = two_region_graph().to_serialized();
        serialized.ports[0].region2_id = 9;
        let err = Graph::from_serialized(&serialized).unwrap_err();
        assert!(matches!(err, RouteError::MalformedGraph(_)));
    }

    #[test]
    fn from_serialized_rejects_duplicate_ids() {
        let mut serialized = two_region_graph().to_serialized();
        serialized.regions[1].region_id = 0;
        let err = Graph::from_serialized(&serialized).unwrap_err();
        assert!(matches!(err, RouteError::MalformedGraph(_)));
    }

    #[test]
    fn from_serialized_rejects_unknown_point_reference() {
        let mut serialized = two_region_graph().to_serialized();
        serialized.regions[0].point_ids = vec![7];
        let err = Graph::from_serialized(&serialized).unwrap_err();
        assert!(matches!(err, RouteError::MalformedGraph(_)));
    }

    #[test]
    fn connection_round_trip_preserves_nets() {
        let graph = two_region_graph();
        let connections = vec![
            Connection {
                id: ConnectionId(0),
                net: NetId(0),
                start: RegionId(0),
                end: RegionId(1),
            },
            Connection {
                id: ConnectionId(1),
                net: NetId(0),
                start: RegionId(1),
                end: RegionId(0),
            },
        ];
        let serialized = connections_to_serialized(&connections);
        assert_eq!(serialized[0].mutually_connected_network_id, None);
        assert_eq!(serialized[1].mutually_connected_network_id, Some(0));
        let restored = connections_from_serialized(&serialized, &graph).unwrap();
        assert_eq!(restored, connections);
    }

    #[test]
    fn degenerate_connection_is_rejected() {
        let graph = two_region_graph();
        let serialized = vec![SerializedConnection {
            connection_id: 0,
            start_region_id: 1,
            end_region_id: 1,
            mutually_connected_network_id: None,
        }];
        let err = connections_from_serialized(&serialized, &graph).unwrap_err();
        assert!(matches!(err, RouteError::MalformedGraph(_)));
    }
}
