//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
///
/// Everything here is fatal for a run. Mistakes the model can recover from
/// (bad arguments, unknown tools, sandbox violations) never become an
/// `AgentError`; they are fed back into the transcript as tool output.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Provider answered with a non-success HTTP status
    #[error("{provider} error {status}: {body}")]
    Http {
        provider: String,
        status: u16,
        body: String,
    },

    /// Request never completed or the body could not be decoded
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider response carried no assistant message
    #[error("Empty response from model")]
    EmptyResponse,

    /// Assistant message had neither tool calls nor text
    #[error("No tool calls and no content. Raw response: {raw}")]
    NoFinalAnswer { raw: String },

    /// Iteration budget exhausted without a final answer
    #[error("Tool loop did not produce a final answer (maxIterations={max}). last={last}")]
    MaxIterations { max: usize, last: String },

    /// Tool not found in registry
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Http { provider, status, .. } => {
                format!("The {provider} API rejected the request (HTTP {status}).")
            }
            AgentError::Transport(_) => "The AI service could not be reached.".into(),
            AgentError::EmptyResponse | AgentError::NoFinalAnswer { .. } => {
                "The model returned an unusable response.".into()
            }
            AgentError::MaxIterations { max, .. } => {
                format!("The model did not finish within {max} iterations.")
            }
            AgentError::Config(msg) => format!("Configuration problem: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
