//! Repository-level error types.

use std::path::PathBuf;

use thiserror::Error;
use typelib_core::TypelibError;

/// Errors from registry operations and name/type/index resolution.
///
/// Lookups that simply find nothing are *not* errors; they return empty
/// results. These variants cover malformed buffers and failed `require`s.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The underlying buffer failed to decode.
    #[error(transparent)]
    Typelib(#[from] TypelibError),

    /// `require` exhausted the search path.
    #[error(
        "typelib {namespace}-{version}.typelib not found ({searched} directories searched)"
    )]
    TypelibNotFound {
        namespace: String,
        version: String,
        searched: usize,
    },

    /// A located typelib file describes a different namespace than asked for.
    #[error("typelib at {path} declares namespace {found}, expected {expected}")]
    NamespaceMismatch {
        path: PathBuf,
        found: String,
        expected: String,
    },
}

pub type Result<T> = std::result::Result<T, RepositoryError>;

/// A structured error translated from a native function's throw.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{domain}: {message} (code {code})")]
pub struct ThrownError {
    /// Symbolic domain name when the quark maps to a registered error
    /// domain, otherwise the decimal quark value.
    pub domain: String,
    pub code: i32,
    pub message: String,
}
