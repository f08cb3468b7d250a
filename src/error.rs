use thiserror::Error;

/// Errors raised while building or querying a grid.
///
/// A search that finds no path is not an error; it yields an empty path.
#[derive(Debug, Error)]
pub enum NavError {
    #[error("layout holds {actual} cells but the grid requires {expected}")]
    LayoutSizeMismatch { expected: usize, actual: usize },

    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),

    #[error("heuristic multiplier must be finite and non-negative, got {0}")]
    InvalidMultiplier(f32),

    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },

    #[error("priority queue is full (capacity {capacity})")]
    QueueFull { capacity: usize },

    #[error("search was cancelled")]
    Cancelled,

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type NavResult<T> = Result<T, NavError>;
