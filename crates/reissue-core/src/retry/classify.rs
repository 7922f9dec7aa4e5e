//! Classify operation responses and errors for the default retry decision.
//!
//! The engine knows nothing about the wire protocol. Responses expose a status
//! code, errors say whether they are network-level or service-level, and the
//! `(status, code)` table decides the service-level cases it names.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Response produced by an operation attempt.
pub trait StatusResponse {
    /// HTTP-like status code of the response.
    fn status_code(&self) -> u16;
}

/// Error returned by the remote service (as opposed to a transport failure).
pub trait ServiceError {
    fn status_code(&self) -> u16;
    /// Symbolic error code, e.g. `"TooManyRequests"`.
    fn code(&self) -> &str;
}

/// Error classifier consulted by the default policy.
pub trait Classify {
    /// Transient network-level failure (connect, reset, DNS, timeout).
    fn is_network_error(&self) -> bool;

    /// Service-level error details, if this is one.
    fn as_service_error(&self) -> Option<&dyn ServiceError>;
}

/// How the default policy sees an attempt's error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind<'a> {
    /// Network-level failure; always retried.
    Network,
    /// Service error with its status and code.
    Service { status: u16, code: &'a str },
    /// Local or client error; never retried.
    Other,
}

/// Classify an error into an `ErrorKind`.
pub fn classify<E: Classify + ?Sized>(e: &E) -> ErrorKind<'_> {
    if e.is_network_error() {
        return ErrorKind::Network;
    }
    match e.as_service_error() {
        Some(svc) => ErrorKind::Service {
            status: svc.status_code(),
            code: svc.code(),
        },
        None => ErrorKind::Other,
    }
}

pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

pub fn is_server_error_status(status: u16) -> bool {
    (500..600).contains(&status)
}

/// Immutable `(status, code) -> retry?` mapping for service errors.
///
/// Entries override the generic 5xx rule. Cloning shares the underlying map.
/// Keyed by status first so a lookup borrows the code instead of allocating.
#[derive(Clone)]
pub struct RetryTable {
    entries: Arc<HashMap<u16, HashMap<String, bool>>>,
}

impl RetryTable {
    /// Table with no entries: every service error falls back to the 5xx rule.
    pub fn empty() -> Self {
        Self {
            entries: Arc::new(HashMap::new()),
        }
    }

    /// Copy of this table with one entry added or replaced.
    pub fn with_entry(&self, status: u16, code: impl Into<String>, retry: bool) -> Self {
        let mut entries = (*self.entries).clone();
        entries
            .entry(status)
            .or_default()
            .insert(code.into(), retry);
        Self {
            entries: Arc::new(entries),
        }
    }

    /// Decision for a service error, if the table names it.
    pub fn lookup(&self, status: u16, code: &str) -> Option<bool> {
        self.entries.get(&status)?.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(HashMap::is_empty)
    }
}

impl Default for RetryTable {
    fn default() -> Self {
        Self::empty()
            .with_entry(409, "IncorrectState", true)
            .with_entry(429, "TooManyRequests", true)
            .with_entry(501, "MethodNotImplemented", false)
    }
}

impl fmt::Debug for RetryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .flat_map(|(status, codes)| {
                codes
                    .iter()
                    .map(move |(code, retry)| ((*status, code), retry))
            })
            .collect();
        entries.sort();
        f.debug_map().entries(entries).finish()
    }
}
