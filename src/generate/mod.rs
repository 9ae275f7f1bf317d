pub mod grid;
pub mod problem;

pub use grid::{generate_grid, GridParams, Orientation};
pub use problem::{create_problem, Lcg};
