use thiserror::Error;

/// Bad numeric input from the workout form. Recoverable: the form stays open.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    pub const NOT_POSITIVE: &'static str = "The input isn't a positive number!";

    pub fn not_positive() -> Self {
        Self {
            message: Self::NOT_POSITIVE.to_string(),
        }
    }
}

/// The geolocation collaborator could not produce a position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("The position couldn't be found.")]
pub struct GeolocationUnavailable;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map widget failed to mount: {0}")]
    Init(String),

    #[error("map view is not initialized (called {0} before initialize)")]
    NotReady(&'static str),

    #[error("{op} was given a view handle this map did not mount")]
    ForeignView { op: &'static str },
}

/// A lookup missed. Callers decide whether that is expected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("workout not found: {id}")]
pub struct NotFoundError {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serializing workouts: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geolocation(#[from] GeolocationUnavailable),

    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    /// Errors that end the session instead of being shown and recovered from.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Map(_))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
