use thiserror::Error;

/// Convenience alias for `Result<T, RouterError>`.
pub type RouterResult<T> = Result<T, RouterError>;

/// Error classification for retry/escalation decisions.
///
/// - `UserError`   — bad input, inconsistent data, unroutable value (4xx equivalent)
/// - `Transient`   — topology lookup failure, cancellation, shard dispatch failure; caller MAY retry
/// - `InternalBug` — broken plan shape or schema configuration; should never happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserError,
    Transient,
    InternalBug,
}

/// Topology adapter errors.
#[derive(Error, Debug)]
pub enum TopoError {
    #[error("keyspace not found: {0}")]
    KeyspaceNotFound(String),

    #[error("keyspace {0} has no shards")]
    NoShards(String),

    #[error("keyspace id {keyspace_id} didn't match any shards")]
    NoShardForKeyspaceId { keyspace_id: String },

    #[error("keyrange {range} does not exactly match shard boundaries")]
    KeyRangeMismatch { range: String },

    #[error("topology unavailable: {0}")]
    Unavailable(String),
}

/// Vindex layer errors. Callback errors from routed SQL pass through
/// unchanged inside `Callback`.
#[derive(Error, Debug)]
pub enum VindexError {
    #[error("vindex {vindex} does not support {capability}")]
    Unsupported {
        vindex: String,
        capability: &'static str,
    },

    #[error("unknown vindex type: {0}")]
    UnknownType(String),

    #[error("vindex {vindex} missing param: {param}")]
    MissingParam { vindex: String, param: &'static str },

    #[error("vindex {vindex}: {message}")]
    BadValue { vindex: String, message: String },

    #[error("vindex {vindex}: duplicate lookup rows for {value}")]
    DuplicateLookup { vindex: String, value: String },

    #[error("vindex {vindex}: backend did not return a generated id")]
    NoGeneratedId { vindex: String },

    #[error(transparent)]
    Callback(Box<RouterError>),
}

/// Top-level router error. Scatter and vindex-callback errors are passed
/// through to the caller unchanged; nothing is retried inside the router.
#[derive(Error, Debug)]
pub enum RouterError {
    #[error("could not find bind var {0}")]
    BindVarMissing(String),

    #[error(transparent)]
    Topo(#[from] TopoError),

    #[error(transparent)]
    Vindex(#[from] VindexError),

    #[error("unsharded keyspace {keyspace} has multiple shards ({shard_count})")]
    UnshardedKeyspace {
        keyspace: String,
        shard_count: usize,
    },

    #[error("keyrange must match exactly one shard: {keys}")]
    KeyRangeShardCount { keys: String },

    #[error("expecting strings for keyrange: {keys}")]
    KeyRangeBadValue { keys: String },

    #[error("could not map {value} to a keyspace id")]
    Unroutable { value: String },

    #[error("value must be supplied for column {column}")]
    ValueRequired { column: String },

    #[error("could not compute value for column {column}")]
    ValueComputeFailed { column: String },

    #[error("value {value} for column {column} does not map to keyspace id {keyspace_id}")]
    VerifyFailed {
        value: String,
        column: String,
        keyspace_id: String,
    },

    #[error("insert generated more than one value")]
    MultipleGenerated,

    #[error("vindex and db generated a value each for insert")]
    GeneratedValueConflict,

    #[error("plan error: {0}")]
    Plan(String),

    #[error("vschema: {0}")]
    Schema(String),

    #[error("scatter execution failed: {0}")]
    Scatter(String),

    #[error("request cancelled")]
    Cancelled,

    /// Broken plan shape or schema configuration — the Go source's
    /// `panic("unexpected")` sites, surfaced as a descriptive failure.
    #[error("internal bug [{error_code}]: {message} | context: {debug_context}")]
    InternalBug {
        error_code: &'static str,
        message: String,
        debug_context: String,
    },
}

impl RouterError {
    /// Construct an internal bug error with a stable code and context.
    pub fn internal_bug(
        error_code: &'static str,
        message: impl Into<String>,
        debug_context: impl Into<String>,
    ) -> Self {
        RouterError::InternalBug {
            error_code,
            message: message.into(),
            debug_context: debug_context.into(),
        }
    }

    /// Classify this error for retry/escalation decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouterError::BindVarMissing(_)
            | RouterError::KeyRangeShardCount { .. }
            | RouterError::KeyRangeBadValue { .. }
            | RouterError::Unroutable { .. }
            | RouterError::ValueRequired { .. }
            | RouterError::ValueComputeFailed { .. }
            | RouterError::VerifyFailed { .. }
            | RouterError::Plan(_) => ErrorKind::UserError,

            RouterError::Topo(_) | RouterError::Scatter(_) | RouterError::Cancelled => {
                ErrorKind::Transient
            }

            RouterError::Vindex(v) => match v {
                VindexError::BadValue { .. } | VindexError::DuplicateLookup { .. } => {
                    ErrorKind::UserError
                }
                VindexError::Callback(inner) => inner.kind(),
                _ => ErrorKind::InternalBug,
            },

            RouterError::UnshardedKeyspace { .. }
            | RouterError::MultipleGenerated
            | RouterError::GeneratedValueConflict
            | RouterError::Schema(_)
            | RouterError::InternalBug { .. } => ErrorKind::InternalBug,
        }
    }

    pub fn is_user_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::UserError)
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient)
    }

    pub fn is_internal_bug(&self) -> bool {
        matches!(self.kind(), ErrorKind::InternalBug)
    }

    /// Emit a structured log entry for internal bugs. Call before returning
    /// one to the client.
    pub fn log_if_internal(&self) {
        if let RouterError::InternalBug {
            error_code,
            message,
            debug_context,
        } = self
        {
            tracing::error!(
                error_code = error_code,
                debug_context = debug_context.as_str(),
                "internal bug [{}]: {}",
                error_code,
                message
            );
        }
    }
}

impl From<RouterError> for VindexError {
    fn from(e: RouterError) -> Self {
        VindexError::Callback(Box::new(e))
    }
}
