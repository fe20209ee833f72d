//! Error types of the JSON-RPC layer. The return values of the
//! [`Client`](crate::rpc::Client) are parsed and wrapped in structured values,
//! and any failure along the way is one of the errors defined here.
use thiserror::Error;

#[derive(Error, Debug)]
/// Connection, protocol, or response parsing error.
pub enum RPCError {
    #[error("Call failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("RPC server returned error {code}: {message}")]
    Rpc {
        /// The JSON-RPC error code.
        code:    i64,
        /// The message supplied by the server.
        message: String,
    },
    #[error("Error parsing result: {0}")]
    ParseError(#[from] anyhow::Error),
}

impl From<serde_json::Error> for RPCError {
    fn from(x: serde_json::Error) -> Self { Self::ParseError(x.into()) }
}

impl From<semver::Error> for RPCError {
    fn from(x: semver::Error) -> Self { Self::ParseError(x.into()) }
}

impl From<stellar_xdr::curr::Error> for RPCError {
    fn from(x: stellar_xdr::curr::Error) -> Self { Self::ParseError(x.into()) }
}

impl RPCError {
    /// JSON-RPC code for a request the server deems invalid.
    pub const INVALID_PARAMS: i64 = -32602;

    /// Return whether the error indicates the item being sent is invalid.
    /// Retrying a request in this case will likely not succeed.
    pub fn is_invalid_argument(&self) -> bool {
        match self {
            RPCError::Rpc { code, .. } => *code == Self::INVALID_PARAMS,
            RPCError::Transport(_) => false,
            RPCError::ParseError(_) => false,
        }
    }
}

#[derive(Error, Debug)]
/// Errors that can occur when making queries. This can either be a general
/// connection error, or the requested item is not found.
pub enum QueryError {
    #[error("RPC error: {0}")]
    /// A general RPC error occurred.
    RPCError(#[from] RPCError),
    #[error("Requested object not found.")]
    /// The requested item was not found.
    NotFound,
    #[error("The RPC server is on network {actual:?}, but {expected:?} was expected.")]
    /// The server is connected to a different network than the one
    /// transactions are signed for.
    NetworkMismatch { expected: String, actual: String },
}

impl QueryError {
    /// Whether this error indicates an object was not found.
    pub fn is_not_found(&self) -> bool { matches!(self, QueryError::NotFound) }
}

impl From<reqwest::Error> for QueryError {
    fn from(e: reqwest::Error) -> Self { Self::RPCError(e.into()) }
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self { Self::RPCError(e.into()) }
}

impl From<stellar_xdr::curr::Error> for QueryError {
    fn from(e: stellar_xdr::curr::Error) -> Self { Self::RPCError(e.into()) }
}

/// Result of an RPC call. This is a simple alias for [std::Result](https://doc.rust-lang.org/std/result/enum.Result.html)
/// that fixes the error type to be [RPCError].
pub type RPCResult<A> = Result<A, RPCError>;

/// Result of an RPC query where the item lookup might fail.
/// This is a simple alias for [std::Result](https://doc.rust-lang.org/std/result/enum.Result.html) that fixes the error type to be [`QueryError`].
pub type QueryResult<A> = Result<A, QueryError>;
