use std::fs;

use serde_json::{json, Value};
use tracing::warn;

use crate::graph::ConnectionId;

pub(crate) const TRACE_ENV_VAR: &str = "JUMPROUTE_TRACE_JSON";

/// Optional JSON record of a solve, written to the path named by
/// `JUMPROUTE_TRACE_JSON` when the engine reaches a terminal state.
pub(crate) struct SolveTrace {
    path: String,
    connections: Vec<Value>,
}

impl SolveTrace {
    pub fn from_env() -> Option<Self> {
        let path = std::env::var(TRACE_ENV_VAR).ok()?;
        Some(SolveTrace {
            path,
            connections: Vec::new(),
        })
    }

    pub fn record_connection(
        &mut self,
        connection: ConnectionId,
        steps: u64,
        route_len: usize,
        ripped: usize,
    ) {
        self.connections.push(json!({
            "connection": connection.0,
            "steps": steps,
            "routeLength": route_len,
            "ripped": ripped,
        }));
    }

    pub fn write(&self, solved: bool, failed: bool, error: Option<String>, iterations: u64) {
        let trace = json!({
            "solved": solved,
            "failed": failed,
            "error": error,
            "iterations": iterations,
            "connections": self.connections,
        });
        let serialized = match serde_json::to_string_pretty(&trace) {
            Ok(serialized) => serialized,
            Err(error) => {
                warn!(%error, "failed to serialize solve trace");
                return;
            }
        };
        if let Err(error) = fs::write(&self.path, serialized) {
            warn!(path = %self.path, %error, "failed to write solve trace");
        }
    }
}
