use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum LidcordionError {
    Graph(GraphError),
    Relay(RelayError),
    Config(ConfigError),
    Render(RenderError),
}

/// Misuse of one-shot audio graph scheduling, or a graph that cannot be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphError {
    AlreadyStarted,
    AlreadyStopped,
    NotStarted,
    /// A source would run at a zero, negative or non-finite frequency.
    InvalidFrequency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// The sensor process could not be spawned. Every stream created
    /// afterwards reports this same failure.
    Startup { command: String, reason: String },
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Parsed, but a value cannot be used.
    Invalid { path: PathBuf, reason: String },
}

/// A performance script that cannot be rendered.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Duration is non-finite or longer than `limit` seconds.
    TooLong { seconds: f64, limit: f64 },
}

impl fmt::Display for LidcordionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LidcordionError::Graph(e) => write!(f, "Audio graph error: {e}"),
            LidcordionError::Relay(e) => write!(f, "Relay error: {e}"),
            LidcordionError::Config(e) => write!(f, "Config error: {e}"),
            LidcordionError::Render(e) => write!(f, "Render error: {e}"),
        }
    }
}

impl std::error::Error for LidcordionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LidcordionError::Graph(e) => Some(e),
            LidcordionError::Relay(e) => Some(e),
            LidcordionError::Config(e) => Some(e),
            LidcordionError::Render(e) => Some(e),
        }
    }
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::AlreadyStarted => write!(f, "node was already started"),
            GraphError::AlreadyStopped => write!(f, "node was already stopped"),
            GraphError::NotStarted => write!(f, "node must be started before it can be stopped"),
            GraphError::InvalidFrequency => write!(f, "source frequency must be positive and finite"),
        }
    }
}

impl std::error::Error for GraphError {}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Startup { command, reason } => {
                write!(f, "sensor process '{command}' failed to start: {reason}")
            }
        }
    }
}

impl std::error::Error for RelayError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "cannot read {}: {source}", path.display())
            }
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config {}: {source}", path.display())
            }
            ConfigError::Invalid { path, reason } => {
                write!(f, "invalid config {}: {reason}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TooLong { seconds, limit } => {
                write!(f, "performance lasts {seconds}s, the limit is {limit}s")
            }
        }
    }
}

impl std::error::Error for RenderError {}

impl From<GraphError> for LidcordionError {
    fn from(e: GraphError) -> Self {
        LidcordionError::Graph(e)
    }
}

impl From<RelayError> for LidcordionError {
    fn from(e: RelayError) -> Self {
        LidcordionError::Relay(e)
    }
}

impl From<ConfigError> for LidcordionError {
    fn from(e: ConfigError) -> Self {
        LidcordionError::Config(e)
    }
}

impl From<RenderError> for LidcordionError {
    fn from(e: RenderError) -> Self {
        LidcordionError::Render(e)
    }
}
