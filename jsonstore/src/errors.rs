use backtrace::Backtrace;
use parking_lot::RwLock;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for jsonstore operations.
///
/// Each kind describes one category of failure in the document store, enabling
/// callers to branch on structure rather than on message text. Batch
/// operations additionally attach the failed input documents to the error via
/// [`JsonStoreError::failures`].
///
/// # Examples
///
/// ```rust,ignore
/// use jsonstore::errors::{JsonStoreError, ErrorKind, JsonStoreResult};
///
/// fn example() -> JsonStoreResult<()> {
///     Err(JsonStoreError::new("store is not open", ErrorKind::StoreNotOpen))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The store is closed, or the collection accessor was dropped
    StoreNotOpen,
    /// A pagination offset was given without a positive limit
    InvalidOffset,
    /// A query referenced an undeclared search field or could not execute
    InvalidSearchField,
    /// Generic read/write failure at the store coordinator; also the
    /// normalization target for unexpected failures
    PersistentStoreFailure,
    /// A destructive schema operation ran while a caller transaction was open,
    /// or a transaction was started inside another one
    TransactionConflict,
    /// Commit or rollback was requested with no caller transaction open
    NoTransactionInProgress,
    /// One or more documents in a remove batch failed to resolve or delete
    RemoveFailure,
    /// A document in a replace batch failed to replace by id
    ReplaceFailure,
    /// One or more documents in a mark-clean batch failed to update
    MarkCleanFailure,
    /// The input document was malformed (not a JSON object)
    DocumentParseFailure,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl ErrorKind {
    /// Returns the stable numeric code preserved at the host boundary.
    ///
    /// Negative values are failures; `0` and positive values are reserved for
    /// success sentinels (see [`crate::common::constants`]).
    pub fn code(&self) -> i32 {
        match self {
            ErrorKind::StoreNotOpen => -50,
            ErrorKind::InvalidOffset => -9,
            ErrorKind::InvalidSearchField => -12,
            ErrorKind::PersistentStoreFailure => -1,
            ErrorKind::TransactionConflict => -43,
            ErrorKind::NoTransactionInProgress => -42,
            ErrorKind::RemoveFailure => -22,
            ErrorKind::ReplaceFailure => -23,
            ErrorKind::MarkCleanFailure => -24,
            ErrorKind::DocumentParseFailure => -20,
            ErrorKind::InternalError => -100,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::StoreNotOpen => write!(f, "Store not open"),
            ErrorKind::InvalidOffset => write!(f, "Invalid offset"),
            ErrorKind::InvalidSearchField => write!(f, "Invalid search field"),
            ErrorKind::PersistentStoreFailure => write!(f, "Persistent store failure"),
            ErrorKind::TransactionConflict => write!(f, "Transaction conflict"),
            ErrorKind::NoTransactionInProgress => write!(f, "No transaction in progress"),
            ErrorKind::RemoveFailure => write!(f, "Remove failure"),
            ErrorKind::ReplaceFailure => write!(f, "Replace failure"),
            ErrorKind::MarkCleanFailure => write!(f, "Mark clean failure"),
            ErrorKind::DocumentParseFailure => write!(f, "Document parse failure"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom jsonstore error type.
///
/// `JsonStoreError` encapsulates the error message, kind, optional cause, and
/// for batch operations the subset of input documents that failed. It supports
/// error chaining and backtraces for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonstore::errors::{JsonStoreError, ErrorKind};
///
/// // A simple error
/// let err = JsonStoreError::new("store is not open", ErrorKind::StoreNotOpen);
///
/// // A batch failure carrying the inputs that failed
/// let err = JsonStoreError::with_failures(
///     "2 documents could not be removed",
///     ErrorKind::RemoveFailure,
///     failed_docs,
/// );
/// ```
#[derive(Clone)]
pub struct JsonStoreError {
    message: String,
    error_kind: ErrorKind,
    failures: Vec<serde_json::Value>,
    cause: Option<Box<JsonStoreError>>,
    backtrace: Arc<RwLock<Backtrace>>,
}

impl JsonStoreError {
    /// Creates a new `JsonStoreError` with the specified message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        JsonStoreError {
            message: message.to_string(),
            error_kind,
            failures: Vec::new(),
            cause: None,
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    /// Creates a new `JsonStoreError` with a cause error.
    ///
    /// This creates an error chain where the cause is preserved for debugging.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: JsonStoreError) -> Self {
        JsonStoreError {
            message: message.to_string(),
            error_kind,
            failures: Vec::new(),
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    /// Creates a batch-failure error carrying the input documents that failed.
    ///
    /// Used by `remove`, `replace_documents`, and `mark_documents_clean`,
    /// whose failure reports include the specific failed items.
    pub fn with_failures(
        message: &str,
        error_kind: ErrorKind,
        failures: Vec<serde_json::Value>,
    ) -> Self {
        JsonStoreError {
            message: message.to_string(),
            error_kind,
            failures,
            cause: None,
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    /// The input documents that failed, for partial-batch failures.
    /// Empty for every other kind of error.
    pub fn failures(&self) -> &[serde_json::Value] {
        &self.failures
    }

    pub fn cause(&self) -> Option<&JsonStoreError> {
        self.cause.as_deref()
    }
}

impl Display for JsonStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for JsonStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for JsonStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for jsonstore operations.
///
/// `JsonStoreResult<T>` is shorthand for `Result<T, JsonStoreError>`.
/// All fallible jsonstore operations return this type.
pub type JsonStoreResult<T> = Result<T, JsonStoreError>;

// From trait implementations for automatic error conversion
impl From<serde_json::Error> for JsonStoreError {
    fn from(err: serde_json::Error) -> Self {
        JsonStoreError::new(
            &format!("JSON error: {}", err),
            ErrorKind::DocumentParseFailure,
        )
    }
}

impl From<String> for JsonStoreError {
    fn from(msg: String) -> Self {
        JsonStoreError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for JsonStoreError {
    fn from(msg: &str) -> Self {
        JsonStoreError::new(msg, ErrorKind::InternalError)
    }
}
