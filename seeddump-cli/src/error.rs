//! Error types surfaced by the library

/// Error choosing the entity types for a run
#[derive(Debug)]
pub enum SelectionError {
    /// A configured name matched no type in the catalog
    UnknownEntity { name: String },
    /// The catalog itself failed
    Catalog(anyhow::Error),
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::UnknownEntity { name } => {
                write!(f, "Unknown entity type '{}' - not found in the catalog", name)
            }
            SelectionError::Catalog(err) => write!(f, "Catalog error: {:#}", err),
        }
    }
}

impl std::error::Error for SelectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SelectionError::Catalog(err) => Some(&**err),
            SelectionError::UnknownEntity { .. } => None,
        }
    }
}

/// Error reading run settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric setting could not be parsed
    InvalidNumber { key: String, value: String },
    /// Batch size must be at least one
    ZeroBatchSize { key: String },
    /// The settings file could not be parsed
    InvalidFile { path: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "Invalid value for {}: '{}' is not a non-negative integer", key, value)
            }
            ConfigError::ZeroBatchSize { key } => {
                write!(f, "Invalid value for {}: batch size must be greater than zero", key)
            }
            ConfigError::InvalidFile { path, message } => {
                write!(f, "Invalid settings file {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Error from a full export run
///
/// Emitter failures are carried unchanged in `Emit`.
#[derive(Debug)]
pub enum DumpError<E> {
    Selection(SelectionError),
    Graph(anyhow::Error),
    Emit(E),
}

impl<E: std::fmt::Display> std::fmt::Display for DumpError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DumpError::Selection(err) => write!(f, "{}", err),
            DumpError::Graph(err) => write!(f, "Failed to build dependency graph: {:#}", err),
            DumpError::Emit(err) => write!(f, "Emission failed: {}", err),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for DumpError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DumpError::Selection(err) => Some(err),
            DumpError::Graph(err) => Some(&**err),
            DumpError::Emit(err) => Some(err),
        }
    }
}
