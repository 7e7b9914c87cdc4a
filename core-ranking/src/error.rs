use core_library::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RankingError {
    #[error("Song not found: {0}")]
    SongNotFound(String),

    #[error("A song cannot be matched against itself: {0}")]
    InvalidMatchup(String),

    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    #[error(transparent)]
    Library(#[from] LibraryError),
}

impl RankingError {
    pub(crate) fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RankingError>;
