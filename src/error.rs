use thiserror::Error;

use crate::graph::ConnectionId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Deserialization referenced an unknown id or left a dangling reference.
    #[error("malformed graph: {0}")]
    MalformedGraph(String),

    /// The candidate queue drained before the end region was reached.
    #[error("no route found for connection {connection}")]
    NoRouteFound { connection: ConnectionId },

    /// The composed step budget was exceeded.
    #[error("step budget exhausted after {iterations} iterations")]
    BudgetExhausted { iterations: u64 },

    /// The problem generator could not hit its crossing target.
    #[error("problem generation failed: {0}")]
    GenerationFailed(String),
}
