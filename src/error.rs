//! Unified error type.

/// The error type returned by usher's fallible operations.
///
/// Request data never produces an `Error`: a `User` header that fails
/// validation simply leaves the request without a
/// [`LocalUser`](crate::LocalUser). This type surfaces programmer errors made
/// while building the middleware, such as an unparsable user syntax.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid user syntax: {0}")]
    Syntax(#[from] regex::Error),
}
