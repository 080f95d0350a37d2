use thiserror::Error;

/// Failure of a single automation-surface call.
///
/// The extraction engine never lets these escape a strategy: a failed
/// lookup or action means "not present here", and the next heuristic runs.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("nothing matched {pattern}")]
    NotFound { pattern: String },

    #[error("page script failed: {reason}")]
    Script { reason: String },

    #[error("browser error: {0}")]
    Backend(String),
}
