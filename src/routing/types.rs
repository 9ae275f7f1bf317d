use serde::{Deserialize, Serialize};

use crate::graph::{ConnectionId, NetId, PortId, RegionId, RouteId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitOfCost {
    /// Heuristic measured in region hops from the precomputed tables.
    Hops,
    /// Heuristic measured as Euclidean distance to the end region center.
    Distance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionOrder {
    Input,
    NearFirst,
    FarFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntrySelection {
    /// Enqueue every expansion.
    All,
    /// Keep only the cheapest expansion per entered region.
    MinPerRegion,
}

/// Tunable policy surface of the solver. Defaults come from prior tuning
/// on generated jumper-array problems.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverParameters {
    /// Multiplier on a port's rip count, discouraging congested ports.
    pub port_usage_penalty: f64,
    /// Multiplier on different-net crossings inside a region.
    pub crossing_penalty: f64,
    /// Additive cost of entering a port owned by another net.
    pub rip_cost: f64,
    /// Heuristic weight. Values above 1 trade admissibility for speed.
    pub greedy_multiplier: f64,
    pub base_max_iterations: u64,
    pub additional_max_iterations_per_connection: u64,
    pub additional_max_iterations_per_crossing: u64,
    pub ripping_enabled: bool,
    pub unit_of_cost: UnitOfCost,
    pub connection_order: ConnectionOrder,
    pub entry_selection: EntrySelection,
}

impl Default for SolverParameters {
    fn default() -> Self {
        SolverParameters {
            port_usage_penalty: 4.0,
            crossing_penalty: 8.0,
            rip_cost: 10.0,
            greedy_multiplier: 1.1,
            base_max_iterations: 10_000,
            additional_max_iterations_per_connection: 2_000,
            additional_max_iterations_per_crossing: 1_000,
            ripping_enabled: true,
            unit_of_cost: UnitOfCost::Hops,
            connection_order: ConnectionOrder::Input,
            entry_selection: EntrySelection::All,
        }
    }
}

/// Search-frontier node. `next_region` is the region on the other side of
/// `port` from `last_region`, the one the candidate is about to enter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub port: PortId,
    pub parent: Option<u32>,
    pub last_region: RegionId,
    pub last_port: Option<PortId>,
    pub next_region: RegionId,
    pub hops: u32,
    pub g: f64,
    pub h: f64,
    pub f: f64,
    pub rip_required: bool,
}

/// One traversal of a solved route: `region` was crossed between
/// `last_port` (absent at the root) and `port`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteStep {
    pub port: PortId,
    pub last_port: Option<PortId>,
    pub region: RegionId,
    pub next_region: RegionId,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SolvedRoute {
    pub id: RouteId,
    pub connection: ConnectionId,
    pub net: NetId,
    pub steps: Vec<RouteStep>,
    pub required_rip: bool,
}

impl SolvedRoute {
    pub fn ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.steps.iter().map(|step| step.port)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Searching,
    Installing,
    Done,
    Failed,
}
