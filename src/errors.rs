use crate::storage::StorageError;
use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum DeskError {
    #[error("a category named '{0}' already exists")]
    DuplicateKey(String),

    #[error("main category '{0}' does not exist")]
    UnknownMainCategory(String),

    #[error("category '{main}/{sub}' does not exist")]
    UnknownCategory { main: String, sub: String },

    #[error("please select a main category")]
    MissingMainCategory,

    #[error("please enter or select a subcategory")]
    MissingSubcategory,

    #[error("please enter time values (0 or more) in at least one time field")]
    NoTimeEntered,

    #[error("no recent call to undo")]
    NothingToUndo,

    #[error("saved {slot} were corrupted: {reason}")]
    CorruptPersistedState { slot: &'static str, reason: String },

    #[error("please enter a name")]
    EmptyName,

    #[error("custom field #{0} does not exist")]
    UnknownCustomField(usize),

    #[error("this action needs {needed} confirmation(s)")]
    ConfirmationRequired { needed: u8 },

    #[error("the entered minutes are too large")]
    TimeOutOfRange,

    #[error("stopwatch entry #{0} does not exist")]
    UnknownStopwatchEntry(usize),

    #[error("failed to write CSV export: {0}")]
    Export(#[from] csv::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T> = std::result::Result<T, DeskError>;

/// How a persisted slot was brought into memory.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Existing data was read, possibly merged with defaults.
    Loaded,
    /// Nothing was stored; defaults were written.
    Created,
    /// Stored data was unusable and has been replaced by defaults.
    Recovered(DeskError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn internal(err: impl std::error::Error) -> Self {
        error!(error = %err, "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<DeskError> for AppError {
    fn from(err: DeskError) -> Self {
        let status = match &err {
            DeskError::DuplicateKey(_) | DeskError::NothingToUndo => StatusCode::CONFLICT,
            DeskError::UnknownMainCategory(_)
            | DeskError::UnknownCategory { .. }
            | DeskError::UnknownCustomField(_)
            | DeskError::UnknownStopwatchEntry(_) => StatusCode::NOT_FOUND,
            DeskError::MissingMainCategory
            | DeskError::MissingSubcategory
            | DeskError::NoTimeEntered
            | DeskError::EmptyName
            | DeskError::TimeOutOfRange
            | DeskError::ConfirmationRequired { .. } => StatusCode::BAD_REQUEST,
            DeskError::CorruptPersistedState { .. }
            | DeskError::Export(_)
            | DeskError::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            return Self::internal(err);
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(AppError::from(DeskError::NothingToUndo).status, StatusCode::CONFLICT);
        assert_eq!(
            AppError::from(DeskError::UnknownMainCategory("aspa".into())).status,
            StatusCode::NOT_FOUND
        );
        let err = AppError::from(DeskError::NoTimeEntered);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("at least one time field"));
    }
}
