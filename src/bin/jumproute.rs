use std::fs;
use std::process::ExitCode;

use serde::Deserialize;
use serde_json::json;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

use jumproute::generate::{create_problem, generate_grid, GridParams};
use jumproute::graph::{
    connections_from_serialized, Connection, SerializedConnection, SerializedGraph,
};
use jumproute::routing::solve_with_fallback;
use jumproute::{Graph, RouteError, SolverParameters};

/// Problem description accepted on the command line. Either a serialized
/// graph or grid parameters, and either explicit connections or a
/// crossing target for the generator.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ProblemSpec {
    graph: Option<SerializedGraph>,
    grid_params: Option<GridParams>,
    connections: Option<Vec<SerializedConnection>>,
    num_crossings: u32,
    seed: u64,
    parameters: SolverParameters,
    fallback_attempts: u32,
}

fn build_problem(problem: &ProblemSpec) -> Result<(Graph, Vec<Connection>), RouteError> {
    let graph = match (&problem.graph, &problem.grid_params) {
        (Some(serialized), _) => Graph::from_serialized(serialized)?,
        (None, Some(params)) => generate_grid(params)?,
        (None, None) => generate_grid(&GridParams::default())?,
    };
    match &problem.connections {
        Some(serialized) => {
            let connections = connections_from_serialized(serialized, &graph)?;
            Ok((graph, connections))
        }
        None => create_problem(graph, problem.num_crossings, problem.seed),
    }
}

fn run() -> Result<bool, String> {
    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| "usage: jumproute <problem.json>".to_string())?;
    let input = fs::read_to_string(&path).map_err(|error| format!("{}: {}", path, error))?;
    let problem: ProblemSpec =
        serde_json::from_str(&input).map_err(|error| format!("{}: {}", path, error))?;

    let (graph, connections) = build_problem(&problem).map_err(|error| error.to_string())?;
    let engine = solve_with_fallback(
        &graph,
        &connections,
        &problem.parameters,
        problem.fallback_attempts,
    );

    let rips_required = engine
        .solved_routes()
        .iter()
        .filter(|route| route.required_rip)
        .count();
    let summary = json!({
        "solved": engine.solved(),
        "failed": engine.failed(),
        "error": engine.error().map(|error| error.to_string()),
        "iterations": engine.iterations(),
        "maxIterations": engine.max_iterations(),
        "connections": connections.len(),
        "routes": engine.solved_routes().len(),
        "ripsRequired": rips_required,
    });
    println!("{}", serde_json::to_string_pretty(&summary).expect("summary"));
    Ok(engine.solved())
}

fn main() -> ExitCode {
    let fmt_layer = fmt::layer().compact();
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber).expect("set tracing subscriber");

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}
