//! Error types for the media-server client.
//!
//! # Design
//! HTTP failures are classified into a closed set of `ErrorKind`s so callers
//! can branch on the outcome without inspecting strings. The raw server body
//! (or the `NO_BODY` marker) travels with the error for diagnostics.
//! Transport failures and decode failures get their own variants, keeping
//! "the server rejected the request" apart from "the server answered with
//! something this client could not parse."

use std::error::Error as StdError;
use std::fmt;
use std::io::Read;

use thiserror::Error;
use tracing::debug;

use crate::http::HttpResponse;
use crate::types::ItemType;

/// Substituted for the server message when an error response has no body.
pub const NO_BODY: &str = "no body";

/// Upper bound on how much of an error body is read for diagnostics.
const MAX_ERROR_BODY: u64 = 64 * 1024;

/// Classification of a non-success HTTP status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// HTTP 400
    InvalidRequest,
    /// HTTP 401
    Unauthorized,
    /// HTTP 403
    Forbidden,
    /// HTTP 404
    NotFound,
    /// HTTP 500
    ServerError,
    /// Any other status that is neither 200 nor 204.
    UnexpectedStatus,
}

impl ErrorKind {
    /// Classify `status`. Returns `None` for the success codes 200 and 204.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200 | 204 => None,
            400 => Some(Self::InvalidRequest),
            401 => Some(Self::Unauthorized),
            403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            500 => Some(Self::ServerError),
            _ => Some(Self::UnexpectedStatus),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::InvalidRequest => "invalid request",
            Self::Unauthorized => "needs authorization",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::ServerError => "server error",
            Self::UnexpectedStatus => "unexpected status code",
        };
        f.write_str(msg)
    }
}

/// Errors returned by `Client` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never produced an HTTP response (DNS, refused
    /// connection, timeout).
    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),

    /// The server answered with a status other than 200 or 204.
    #[error("{kind}, code: {status}, msg: {body}")]
    Http {
        kind: ErrorKind,
        status: u16,
        body: String,
    },

    /// The response body was not the JSON shape this client expected.
    #[error("decode json: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request payload could not be serialized to JSON.
    #[error("encode json: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The base URL is not an absolute http or https URL.
    #[error("unsupported base url {0:?}: expected http or https")]
    UnsupportedScheme(String),

    /// An item id that cannot be sent as a single path segment.
    #[error("invalid item id {0:?}")]
    InvalidId(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A user-scoped call was made before a successful login.
    #[error("not logged in")]
    NotAuthenticated,

    #[error("item type {0:?} not supported")]
    UnsupportedItemType(ItemType),

    /// Wraps a failure with the operation that produced it.
    #[error("{operation}: {source}")]
    Context {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap `self` with the name of the operation that failed.
    pub fn context(self, operation: &'static str) -> Self {
        Self::Context {
            operation,
            source: Box::new(self),
        }
    }

    /// The HTTP classification of this error, looking through context layers.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Http { kind, .. } => Some(*kind),
            Self::Context { source, .. } => source.kind(),
            _ => None,
        }
    }

    /// The HTTP status code, looking through context layers.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Context { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Context { source, .. } => source.is_transport(),
            _ => false,
        }
    }

    pub fn is_decode(&self) -> bool {
        match self {
            Self::Decode(_) => true,
            Self::Context { source, .. } => source.is_decode(),
            _ => false,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Pass a 200/204 response through untouched, or turn any other status into
/// an `Error::Http` carrying the server's body.
///
/// Never panics: a body that cannot be read is reported as `NO_BODY`.
pub fn classify(response: HttpResponse) -> Result<HttpResponse> {
    let Some(kind) = ErrorKind::from_status(response.status) else {
        return Ok(response);
    };

    let status = response.status;
    let mut raw = Vec::new();
    if let Err(e) = response.body.take(MAX_ERROR_BODY).read_to_end(&mut raw) {
        debug!("error body read stopped after {} bytes: {e}", raw.len());
    }
    let body = if raw.is_empty() {
        NO_BODY.to_string()
    } else {
        String::from_utf8_lossy(&raw).into_owned()
    };

    Err(Error::Http { kind, status, body })
}
