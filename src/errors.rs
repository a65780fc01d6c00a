use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for cellar storage operations.
///
/// Each kind is a stable, comparable identity so that callers can branch on the
/// category of a failure rather than parsing a formatted message. Lower layers
/// (stores, transactions) return the bare kind; engines and the multi-store wrap
/// it with contextual detail while preserving the kind through the cause chain.
///
/// # Examples
///
/// ```rust,ignore
/// use cellar::errors::{CellarError, CellarResult, ErrorKind};
///
/// fn example() -> CellarResult<()> {
///     Err(CellarError::new("key not found", ErrorKind::KeyNotFound))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Store data errors
    /// The requested key does not exist in the store
    KeyNotFound,
    /// No store is registered under the given name
    StoreNotFound,
    /// The store has been closed and cannot be used
    StoreClosed,
    /// A store with the given name already exists
    StoreExists,

    // Engine errors
    /// No engine is registered under the given name
    EngineNotFound,
    /// An engine with the given name is already registered
    EngineExists,

    // Transaction errors
    /// The transaction has already been committed or rolled back
    TxNotActive,
    /// A write was attempted on a read-only transaction
    TxReadOnly,

    // Versioning errors
    /// The requested version number is not retained by the store
    VersionNotFound,

    // Configuration errors
    /// A configuration value is invalid or a configured bound was violated
    InvalidConfig,

    // Event errors - used by the notification sink
    /// Error in event bus processing
    EventError,

    // Generic/Internal errors - used as fallback
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::KeyNotFound => write!(f, "Key not found"),
            ErrorKind::StoreNotFound => write!(f, "Store not found"),
            ErrorKind::StoreClosed => write!(f, "Store closed"),
            ErrorKind::StoreExists => write!(f, "Store already exists"),
            ErrorKind::EngineNotFound => write!(f, "Engine not found"),
            ErrorKind::EngineExists => write!(f, "Engine already exists"),
            ErrorKind::TxNotActive => write!(f, "Transaction not active"),
            ErrorKind::TxReadOnly => write!(f, "Transaction is read-only"),
            ErrorKind::VersionNotFound => write!(f, "Version not found"),
            ErrorKind::InvalidConfig => write!(f, "Invalid configuration"),
            ErrorKind::EventError => write!(f, "Event error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom cellar error type.
///
/// `CellarError` encapsulates the error message, kind, and optional cause.
/// It supports error chaining and backtraces for debugging.
///
/// # Examples
///
/// ```rust,ignore
/// use cellar::errors::{CellarError, ErrorKind};
///
/// // Create a simple error
/// let err = CellarError::new("store is closed", ErrorKind::StoreClosed);
///
/// // Create an error with a cause, preserving the kind of the cause
/// let cause = CellarError::new("key not found", ErrorKind::KeyNotFound);
/// let err = CellarError::new_with_cause(
///     "lookup in store 'users' failed",
///     ErrorKind::KeyNotFound,
///     cause,
/// );
/// ```
///
/// # Type alias
///
/// The `CellarResult<T>` type alias is equivalent to `Result<T, CellarError>` and
/// is used throughout the codebase for operations that can fail.
#[derive(Clone)]
pub struct CellarError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<CellarError>>,
    backtrace: Arc<Backtrace>,
}

impl CellarError {
    /// Creates a new `CellarError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        CellarError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    /// Creates a new `CellarError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging. Wrapping layers pass the cause's kind here so that callers
    /// can still branch on the kind after unwrapping the added context.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: CellarError) -> Self {
        CellarError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Backtrace::new()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&CellarError> {
        self.cause.as_deref()
    }
}

impl Display for CellarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for CellarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace),
        }
    }
}

impl Error for CellarError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for cellar operations.
///
/// `CellarResult<T>` is shorthand for `Result<T, CellarError>`.
/// All fallible cellar operations return this type.
pub type CellarResult<T> = Result<T, CellarError>;

impl From<String> for CellarError {
    fn from(msg: String) -> Self {
        CellarError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for CellarError {
    fn from(msg: &str) -> Self {
        CellarError::new(msg, ErrorKind::InternalError)
    }
}
