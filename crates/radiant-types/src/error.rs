use thiserror::Error;

#[derive(Error, Debug)]
pub enum RadiantError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Physics constraint violated: {0}")]
    PhysicsViolation(String),

    #[error("Index out of bounds: cell={cell}, component={component}")]
    IndexOutOfBounds { cell: usize, component: usize },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RadiantResult<T> = Result<T, RadiantError>;
