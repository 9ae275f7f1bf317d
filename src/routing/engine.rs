use std::collections::VecDeque;

use hashbrown::HashMap;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::RouteError;
use crate::graph::{
    connections_from_serialized, connections_to_serialized, Connection, ConnectionId, Graph, NetId,
    PortAssignment, PortId, RegionAssignment, RouteId, SerializedConnection, SerializedGraph,
};

use super::crossing::count_chord_crossings;
use super::policy::{JumperPolicy, SolverPolicy};
use super::queue::CandidateQueue;
use super::ripup::rip_route;
use super::trace::SolveTrace;
use super::types::{
    Candidate, ConnectionOrder, EngineState, EntrySelection, RouteStep, SolvedRoute,
    SolverParameters,
};

/// Serializable reconstruction input for an engine.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorParams {
    pub graph: SerializedGraph,
    pub connections: Vec<SerializedConnection>,
    pub parameters: SolverParameters,
}

/// Per-connection search state. Rebuilt from scratch whenever the engine
/// picks up the next connection.
struct SearchContext {
    connection_index: usize,
    arena: Vec<Candidate>,
    queue: CandidateQueue,
    visited: HashMap<PortId, f64>,
    steps: u64,
}

enum PopOutcome {
    Drained,
    Popped(u32),
}

/// Single-threaded A* router with rip-up-and-reroute over a region
/// hypergraph. One `step` pops one usable candidate and either expands it
/// or installs the finished route.
pub struct RouteEngine {
    graph: Graph,
    connections: Vec<Connection>,
    params: SolverParameters,
    policy: Box<dyn SolverPolicy>,
    unprocessed: VecDeque<ConnectionId>,
    solved_routes: Vec<SolvedRoute>,
    search: Option<SearchContext>,
    state: EngineState,
    iterations: u64,
    max_iterations: u64,
    error: Option<RouteError>,
    next_route: u64,
    last_candidate: Option<Candidate>,
    route_solved_hook: Option<Box<dyn FnMut(&SolvedRoute)>>,
    solve_trace: Option<SolveTrace>,
}

impl RouteEngine {
    pub fn new(graph: Graph, connections: Vec<Connection>, params: SolverParameters) -> Self {
        let policy = Box::new(JumperPolicy::new(&graph, &connections, params));
        Self::with_policy(graph, connections, params, policy)
    }

    pub fn with_policy(
        graph: Graph,
        connections: Vec<Connection>,
        params: SolverParameters,
        policy: Box<dyn SolverPolicy>,
    ) -> Self {
        let estimated_crossings = estimate_crossings(&graph, &connections);
        let max_iterations = params.base_max_iterations
            + params.additional_max_iterations_per_connection * connections.len() as u64
            + params.additional_max_iterations_per_crossing * u64::from(estimated_crossings);
        let unprocessed = order_connections(&graph, &connections, params.connection_order);
        debug!(
            connections = connections.len(),
            estimated_crossings,
            max_iterations,
            "engine constructed"
        );
        RouteEngine {
            graph,
            connections,
            params,
            policy,
            unprocessed,
            solved_routes: Vec::new(),
            search: None,
            state: EngineState::Idle,
            iterations: 0,
            max_iterations,
            error: None,
            next_route: 0,
            last_candidate: None,
            route_solved_hook: None,
            solve_trace: SolveTrace::from_env(),
        }
    }

    pub fn from_serialized(
        graph: &SerializedGraph,
        connections: &[SerializedConnection],
        params: SolverParameters,
    ) -> Result<Self, RouteError> {
        let graph = Graph::from_serialized(graph)?;
        let connections = connections_from_serialized(connections, &graph)?;
        Ok(Self::new(graph, connections, params))
    }

    /// Advance one search step. A step accounts for exactly one usable
    /// candidate; stale pops are discarded on the way.
    pub fn step(&mut self) {
        match self.state {
            EngineState::Done | EngineState::Failed => return,
            _ => {}
        }

        if self.search.is_none() {
            let Some(connection_id) = self.unprocessed.pop_front() else {
                self.finish_solved();
                return;
            };
            self.begin_connection(connection_id);
        }

        self.iterations += 1;
        if self.iterations > self.max_iterations {
            self.fail(RouteError::BudgetExhausted {
                iterations: self.iterations,
            });
            return;
        }

        let outcome = {
            let context = self.search.as_mut().expect("search context");
            context.steps += 1;
            loop {
                let Some(index) = context.queue.pop() else {
                    break PopOutcome::Drained;
                };
                let candidate = context.arena[index as usize];
                match context.visited.get(&candidate.port) {
                    // Only a strictly better g reopens a port.
                    Some(&best) if best <= candidate.g => continue,
                    _ => {}
                }
                context.visited.insert(candidate.port, candidate.g);
                break PopOutcome::Popped(index);
            }
        };

        match outcome {
            PopOutcome::Drained => {
                let context = self.search.as_ref().expect("search context");
                let connection = self.connections[context.connection_index].id;
                self.fail(RouteError::NoRouteFound { connection });
            }
            PopOutcome::Popped(index) => {
                let context = self.search.as_ref().expect("search context");
                let candidate = context.arena[index as usize];
                let end = self.connections[context.connection_index].end;
                self.last_candidate = Some(candidate);
                if candidate.next_region == end {
                    self.finalize(index);
                } else {
                    self.expand(index);
                }
            }
        }
    }

    /// Step until the solve reaches a terminal state.
    pub fn solve(&mut self) {
        while !self.is_terminal() {
            self.step();
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, EngineState::Done | EngineState::Failed)
    }

    pub fn solved(&self) -> bool {
        self.state == EngineState::Done
    }

    pub fn failed(&self) -> bool {
        self.state == EngineState::Failed
    }

    pub fn error(&self) -> Option<&RouteError> {
        self.error.as_ref()
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn solved_routes(&self) -> &[SolvedRoute] {
        &self.solved_routes
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn current_connection(&self) -> Option<&Connection> {
        self.search
            .as_ref()
            .map(|context| &self.connections[context.connection_index])
    }

    pub fn last_candidate(&self) -> Option<&Candidate> {
        self.last_candidate.as_ref()
    }

    /// Up to k cheapest queued candidates, for debugging and visualization.
    pub fn peek_candidates(&self, k: usize) -> Vec<Candidate> {
        let Some(context) = self.search.as_ref() else {
            return Vec::new();
        };
        context
            .queue
            .peek_k(k)
            .into_iter()
            .map(|index| context.arena[index as usize])
            .collect()
    }

    pub fn set_route_solved_hook(&mut self, hook: Box<dyn FnMut(&SolvedRoute)>) {
        self.route_solved_hook = Some(hook);
    }

    pub fn get_constructor_params(&self) -> ConstructorParams {
        ConstructorParams {
            graph: self.graph.to_serialized(),
            connections: connections_to_serialized(&self.connections),
            parameters: self.params,
        }
    }

    fn begin_connection(&mut self, connection_id: ConnectionId) {
        let connection_index = self
            .connections
            .iter()
            .position(|connection| connection.id == connection_id)
            .expect("queued connection exists");
        let connection = self.connections[connection_index];

        let mut context = SearchContext {
            connection_index,
            arena: Vec::new(),
            queue: CandidateQueue::new(),
            visited: HashMap::new(),
            steps: 0,
        };

        // Every port of the start region seeds a root candidate.
        for &port_id in &self.graph.regions[connection.start].ports {
            let port = &self.graph.ports[port_id];
            let rip_required = port
                .assignment
                .map_or(false, |assignment| assignment.net != connection.net);
            if rip_required && !self.params.ripping_enabled {
                continue;
            }
            let candidate = Candidate {
                port: port_id,
                parent: None,
                last_region: connection.start,
                last_port: None,
                next_region: port.other_region(connection.start),
                hops: 0,
                g: 0.0,
                h: 0.0,
                f: 0.0,
                rip_required,
            };
            let index = context.arena.len() as u32;
            context.arena.push(candidate);
            context.queue.push(0.0, index);
        }

        debug!(
            connection = %connection.id,
            roots = context.arena.len(),
            "searching connection"
        );
        self.search = Some(context);
        self.state = EngineState::Searching;
    }

    fn expand(&mut self, parent_index: u32) {
        let (parent, connection) = {
            let context = self.search.as_ref().expect("search context");
            (
                context.arena[parent_index as usize],
                self.connections[context.connection_index],
            )
        };
        let region = parent.next_region;

        let mut expansions: Vec<Candidate> = Vec::new();
        for &port_id in &self.graph.regions[region].ports {
            if port_id == parent.port {
                continue;
            }
            let port = &self.graph.ports[port_id];
            let next_region = port.other_region(region);
            let rip_required = port
                .assignment
                .map_or(false, |assignment| assignment.net != connection.net);
            if rip_required && !self.params.ripping_enabled {
                continue;
            }

            let g = parent.g
                + self.policy.increased_region_cost(
                    &self.graph,
                    region,
                    parent.port,
                    port_id,
                    connection.net,
                )
                + if rip_required { self.params.rip_cost } else { 0.0 }
                + self.policy.port_usage_penalty(&self.graph, port_id);
            let h = self
                .policy
                .estimate_cost_to_end(&self.graph, port_id, connection.end);
            let f = g + self.params.greedy_multiplier * h;

            expansions.push(Candidate {
                port: port_id,
                parent: Some(parent_index),
                last_region: region,
                last_port: Some(parent.port),
                next_region,
                hops: parent.hops + 1,
                g,
                h,
                f,
                rip_required,
            });
        }

        if self.params.entry_selection == EntrySelection::MinPerRegion {
            expansions = select_min_per_region(expansions);
        }

        trace!(
            port = %parent.port,
            region = %region,
            expansions = expansions.len(),
            "expanded candidate"
        );

        let context = self.search.as_mut().expect("search context");
        for candidate in expansions {
            let index = context.arena.len() as u32;
            context.queue.push(candidate.f, index);
            context.arena.push(candidate);
        }
    }

    fn finalize(&mut self, goal_index: u32) {
        self.state = EngineState::Installing;

        let (connection, steps, context_steps) = {
            let context = self.search.as_ref().expect("search context");
            let connection = self.connections[context.connection_index];

            let mut chain = Vec::new();
            let mut cursor = Some(goal_index);
            while let Some(index) = cursor {
                let candidate = context.arena[index as usize];
                chain.push(candidate);
                cursor = candidate.parent;
            }
            chain.reverse();

            let steps: Vec<RouteStep> = chain
                .iter()
                .map(|candidate| RouteStep {
                    port: candidate.port,
                    last_port: candidate.last_port,
                    region: candidate.last_region,
                    next_region: candidate.next_region,
                })
                .collect();
            (connection, steps, context.steps)
        };

        // Collect every route the new path displaces: ports owned by other
        // nets, then assignments crossed in regions that forbid it.
        let mut to_rip: Vec<RouteId> = Vec::new();
        if self.params.ripping_enabled {
            for step in &steps {
                if let Some(assignment) = self.graph.ports[step.port].assignment {
                    if assignment.net != connection.net && !to_rip.contains(&assignment.route) {
                        to_rip.push(assignment.route);
                    }
                }
            }
            for step in &steps {
                if let Some(last_port) = step.last_port {
                    let offenders = self.policy.rips_required(
                        &self.graph,
                        step.region,
                        last_port,
                        step.port,
                        connection.net,
                    );
                    for offender in offenders {
                        if !to_rip.contains(&offender.route) {
                            to_rip.push(offender.route);
                        }
                    }
                }
            }
        }

        let required_rip = !to_rip.is_empty();
        for route_id in &to_rip {
            rip_route(
                &mut self.graph,
                &mut self.solved_routes,
                &mut self.unprocessed,
                *route_id,
            );
        }

        let route_id = RouteId(self.next_route);
        self.next_route += 1;
        for step in &steps {
            self.graph.ports[step.port].assignment = Some(PortAssignment {
                connection: connection.id,
                net: connection.net,
                route: route_id,
            });
        }
        for step in &steps {
            let Some(last_port) = step.last_port else {
                continue;
            };
            let region = &mut self.graph.regions[step.region];
            let duplicate = region.assignments.iter().any(|assignment| {
                assignment.ports == (last_port, step.port)
                    || assignment.ports == (step.port, last_port)
            });
            if !duplicate {
                region.assignments.push(RegionAssignment {
                    ports: (last_port, step.port),
                    connection: connection.id,
                    net: connection.net,
                    route: route_id,
                });
            }
        }

        let route = SolvedRoute {
            id: route_id,
            connection: connection.id,
            net: connection.net,
            steps,
            required_rip,
        };
        debug!(
            connection = %connection.id,
            route = %route_id,
            length = route.steps.len(),
            ripped = to_rip.len(),
            "route installed"
        );
        if let Some(trace) = self.solve_trace.as_mut() {
            trace.record_connection(connection.id, context_steps, route.steps.len(), to_rip.len());
        }
        if let Some(hook) = self.route_solved_hook.as_mut() {
            hook(&route);
        }
        self.solved_routes.push(route);
        self.search = None;

        if self.unprocessed.is_empty() {
            self.finish_solved();
        } else {
            self.state = EngineState::Idle;
        }
    }

    fn finish_solved(&mut self) {
        self.state = EngineState::Done;
        debug!(
            iterations = self.iterations,
            routes = self.solved_routes.len(),
            "solve complete"
        );
        self.write_trace();
    }

    fn fail(&mut self, error: RouteError) {
        debug!(%error, iterations = self.iterations, "solve failed");
        self.error = Some(error);
        self.state = EngineState::Failed;
        self.write_trace();
    }

    fn write_trace(&self) {
        if let Some(trace) = self.solve_trace.as_ref() {
            trace.write(
                self.solved(),
                self.failed(),
                self.error.as_ref().map(|error| error.to_string()),
                self.iterations,
            );
        }
    }
}

/// Keep only the cheapest expansion per entered region, first wins on ties.
fn select_min_per_region(expansions: Vec<Candidate>) -> Vec<Candidate> {
    let mut kept: Vec<Candidate> = Vec::new();
    for expansion in expansions {
        match kept
            .iter_mut()
            .find(|candidate| candidate.next_region == expansion.next_region)
        {
            Some(candidate) => {
                if expansion.f < candidate.f {
                    *candidate = expansion;
                }
            }
            None => kept.push(expansion),
        }
    }
    kept
}

fn order_connections(
    graph: &Graph,
    connections: &[Connection],
    order: ConnectionOrder,
) -> VecDeque<ConnectionId> {
    let mut ids: Vec<ConnectionId> = connections.iter().map(|connection| connection.id).collect();
    let span = |id: ConnectionId| {
        let connection = connections
            .iter()
            .find(|connection| connection.id == id)
            .expect("connection exists");
        let start = graph.regions[connection.start].descriptor.center();
        let end = graph.regions[connection.end].descriptor.center();
        start.distance_to(&end)
    };
    match order {
        ConnectionOrder::Input => {}
        ConnectionOrder::NearFirst => ids.sort_by(|a, b| span(*a).total_cmp(&span(*b))),
        ConnectionOrder::FarFirst => ids.sort_by(|a, b| span(*b).total_cmp(&span(*a))),
    }
    ids.into()
}

/// Different-net interleavings among the endpoint chords on the graph
/// bounds perimeter. Feeds the per-crossing budget term.
pub fn estimate_crossings(graph: &Graph, connections: &[Connection]) -> u32 {
    if graph.regions.is_empty() {
        return 0;
    }
    let bounds = graph.bounds();
    let perimeter = bounds.perimeter_len();
    if perimeter <= 0.0 {
        return 0;
    }
    let chords: Vec<(f64, f64, NetId)> = connections
        .iter()
        .map(|connection| {
            (
                bounds.nearest_perimeter_t(&graph.regions[connection.start].descriptor.center()),
                bounds.nearest_perimeter_t(&graph.regions[connection.end].descriptor.center()),
                connection.net,
            )
        })
        .collect();
    count_chord_crossings(&chords, perimeter)
}
