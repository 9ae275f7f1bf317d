mod crossing;
mod engine;
mod fallback;
mod heuristic;
mod policy;
mod queue;
mod ripup;
mod trace;
mod types;

pub use crossing::{count_chord_crossings, crossings_in_region, CrossingCheck};
pub use engine::{estimate_crossings, ConstructorParams, RouteEngine};
pub use fallback::solve_with_fallback;
pub use heuristic::{HopTables, UNREACHABLE};
pub use policy::{BasePolicy, JumperPolicy, SolverPolicy};
pub use types::{
    Candidate, ConnectionOrder, EngineState, EntrySelection, RouteStep, SolvedRoute,
    SolverParameters, UnitOfCost,
};
