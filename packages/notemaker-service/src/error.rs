use std::fmt;

use notemaker_domain::{PageError, QueryError};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Which backend an unavailability error came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Store {
	Primary,
	Index,
}
impl fmt::Display for Store {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Primary => f.write_str("Primary store"),
			Self::Index => f.write_str("Search index"),
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Invalid state: {message}")]
	InvalidState { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("{store} unavailable: {message}")]
	StoreUnavailable { store: Store, message: String },
}
impl Error {
	pub fn unavailable(store: Store, message: impl Into<String>) -> Self {
		Self::StoreUnavailable { store, message: message.into() }
	}

	pub(crate) fn from_storage(store: Store, err: notemaker_storage::Error) -> Self {
		match err {
			notemaker_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			notemaker_storage::Error::NotFound(message) => Self::NotFound { message },
			notemaker_storage::Error::Sqlx(inner) if is_data_exception(&inner) =>
				Self::InvalidRequest { message: inner.to_string() },
			notemaker_storage::Error::Sqlx(inner) => Self::unavailable(store, inner.to_string()),
			notemaker_storage::Error::Qdrant(inner) => Self::unavailable(store, inner.to_string()),
		}
	}
}
impl From<PageError> for Error {
	fn from(err: PageError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}
impl From<QueryError> for Error {
	fn from(err: QueryError) -> Self {
		Self::InvalidRequest { message: err.to_string() }
	}
}

// SQLSTATE class 22, data exception.
fn is_data_exception(err: &sqlx::Error) -> bool {
	err.as_database_error()
		.and_then(|db_err| db_err.code())
		.is_some_and(|code| is_data_exception_code(&code))
}

fn is_data_exception_code(code: &str) -> bool {
	code.starts_with("22")
}
