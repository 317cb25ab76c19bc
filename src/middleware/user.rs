//! The `User` request header.
//!
//! `User` names a user *on the server side*: the owner of the resource name
//! space being addressed, not the client that authenticated. A request for
//! `/calendar` with `User: john` asks for John's calendar, whoever is asking.
//!
//! [`UserHeader`] inspects the header once per request:
//!
//! | Raw header | `allow_empty` | Result |
//! |---|---|---|
//! | absent | any | pass through |
//! | `""` | `true` | `LocalUser("")`, `Vary: User` |
//! | `""` | `false` | pass through |
//! | contains `:` | any | pass through |
//! | bad `%` escape, or not UTF-8 once unescaped | any | pass through |
//! | unescaped value matches the user syntax | any | `LocalUser(value)`, `Vary: User` |
//! | unescaped value does not match | any | pass through |
//!
//! A [`LocalUser`] is present in the request context exactly when the
//! response carries `Vary: User`. Rejections never fail the request; the raw
//! header always stays in place for the inner handler.

use std::fmt;
use std::sync::Arc;

use http::header::HeaderName;
use tracing::{debug, trace};

use crate::decode::{DecodeError, decode};
use crate::error::Error;
use crate::grammar::Grammar;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, private};
use crate::request::Request;
use crate::response::Response;

/// The request header inspected by [`UserHeader`].
pub const USER: HeaderName = HeaderName::from_static("user");

// ── LocalUser ─────────────────────────────────────────────────────────────────

/// The unescaped, validated `User` value, stored in the request context.
///
/// ```rust
/// # use usher::{LocalUser, Request, Response};
/// async fn calendar(req: Request) -> Response {
///     match req.extensions().get::<LocalUser>() {
///         Some(user) => Response::text(format!("calendar of {user}")),
///         None => Response::text("site calendar"),
///     }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LocalUser(String);

impl LocalUser {
    pub fn new(user: impl Into<String>) -> Self {
        Self(user.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for LocalUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// What [`UserHeader::inspect`] made of a raw header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No `User` header.
    Absent,
    /// The value to store as [`LocalUser`].
    Accepted(String),
    /// The header is ignored.
    Rejected(Rejection),
}

/// Why a `User` header was ignored.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("empty value not allowed")]
    EmptyNotAllowed,
    #[error("value contains a colon")]
    Colon,
    #[error("header sent more than once")]
    Repeated,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("value does not match the user syntax")]
    Mismatch,
}

// ── UserHeader ────────────────────────────────────────────────────────────────

/// Middleware that turns a valid `User` header into a [`LocalUser`].
///
/// ```rust,no_run
/// use usher::{Request, Response, UserHeader};
///
/// async fn whoami(req: Request) -> Response {
///     Response::text(req.local_user().unwrap_or("nobody").to_owned())
/// }
///
/// # fn main() -> Result<(), usher::Error> {
/// // NAI syntax, empty values accepted
/// let app = UserHeader::new(whoami);
///
/// // lowercase names only, empty values ignored
/// let strict = UserHeader::builder()
///     .user_syntax("[a-z]+")?
///     .allow_empty(false)
///     .wrap(whoami);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct UserHeader {
    inner: BoxedHandler,
    grammar: Grammar,
    allow_empty: bool,
}

impl UserHeader {
    /// Wraps `inner` with the default configuration: NAI syntax, empty values
    /// accepted.
    pub fn new(inner: impl Handler) -> Self {
        Self::builder().wrap(inner)
    }

    pub fn builder() -> UserHeaderBuilder {
        UserHeaderBuilder::default()
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn allows_empty(&self) -> bool {
        self.allow_empty
    }

    /// Applies the header policy to a raw `User` value.
    ///
    /// Pure: the same input always yields the same outcome.
    pub fn inspect(&self, raw: Option<&[u8]>) -> Outcome {
        let Some(raw) = raw else {
            return Outcome::Absent;
        };

        // The user syntax is not consulted for the empty value.
        if raw.is_empty() {
            return if self.allow_empty {
                Outcome::Accepted(String::new())
            } else {
                Outcome::Rejected(Rejection::EmptyNotAllowed)
            };
        }

        if raw.contains(&b':') {
            return Outcome::Rejected(Rejection::Colon);
        }

        match decode(raw) {
            Ok(user) if self.grammar.matches(&user) => Outcome::Accepted(user),
            Ok(_) => Outcome::Rejected(Rejection::Mismatch),
            Err(e) => Outcome::Rejected(e.into()),
        }
    }

    /// Handles one request: inspect, annotate, delegate.
    ///
    /// Same as the [`Handler`] dispatch path, offered inherently so hosts can
    /// drive the middleware without naming the hidden dispatch trait.
    pub fn call(&self, req: Request) -> BoxFuture {
        self.handle(req)
    }

    fn handle(&self, mut req: Request) -> BoxFuture {
        let outcome = {
            let mut values = req.headers().get_all(&USER).iter();
            match (values.next(), values.next()) {
                (None, _) => Outcome::Absent,
                (Some(raw), None) => self.inspect(Some(raw.as_bytes())),
                (Some(_), Some(_)) => Outcome::Rejected(Rejection::Repeated),
            }
        };

        match outcome {
            Outcome::Absent => self.inner.call(req),
            Outcome::Rejected(reason) => {
                debug!(%reason, "ignoring User header");
                self.inner.call(req)
            }
            Outcome::Accepted(user) => {
                trace!(user = %user, "accepted User header");
                req.extensions_mut().insert(LocalUser(user));
                let res = self.inner.call(req);
                Box::pin(async move { add_vary(res.await) })
            }
        }
    }
}

/// Marks the response start as dependent on the `User` request header.
///
/// The pair is appended after whatever the inner handler set, including any
/// `Vary` of its own.
fn add_vary(mut res: Response) -> Response {
    res.headers.push(("Vary".to_owned(), "User".to_owned()));
    res
}

impl fmt::Debug for UserHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserHeader")
            .field("grammar", &self.grammar)
            .field("allow_empty", &self.allow_empty)
            .finish_non_exhaustive()
    }
}

impl private::Sealed for UserHeader {}

impl Handler for UserHeader {
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(self)
    }
}

impl ErasedHandler for UserHeader {
    fn call(&self, req: Request) -> BoxFuture {
        self.handle(req)
    }
}

// ── UserHeaderBuilder ─────────────────────────────────────────────────────────

/// Fluent builder for [`UserHeader`].
///
/// Obtain via [`UserHeader::builder()`]. Terminated by [`wrap`], which takes
/// the inner handler.
///
/// [`wrap`]: UserHeaderBuilder::wrap
#[derive(Debug)]
pub struct UserHeaderBuilder {
    grammar: Grammar,
    allow_empty: bool,
}

impl Default for UserHeaderBuilder {
    fn default() -> Self {
        Self { grammar: Grammar::nai(), allow_empty: true }
    }
}

impl UserHeaderBuilder {
    /// Replaces the NAI syntax with `pattern`, which must match the whole
    /// unescaped value.
    pub fn user_syntax(mut self, pattern: &str) -> Result<Self, Error> {
        self.grammar = Grammar::new(pattern)?;
        Ok(self)
    }

    /// Replaces the NAI syntax with a precompiled grammar.
    pub fn grammar(mut self, grammar: Grammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Whether an empty `User` header yields `LocalUser("")`. Defaults to `true`.
    pub fn allow_empty(mut self, allow: bool) -> Self {
        self.allow_empty = allow;
        self
    }

    pub fn wrap(self, inner: impl Handler) -> UserHeader {
        UserHeader {
            inner: inner.into_boxed_handler(),
            grammar: self.grammar,
            allow_empty: self.allow_empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use quickcheck::quickcheck;

    use super::*;

    async fn noop(_req: Request) -> Response {
        Response::text("")
    }

    fn accepted(user: &str) -> Outcome {
        Outcome::Accepted(user.to_owned())
    }

    #[test]
    fn absent_header() {
        for allow_empty in [true, false] {
            let mw = UserHeader::builder().allow_empty(allow_empty).wrap(noop);
            assert_eq!(mw.inspect(None), Outcome::Absent);
        }
    }

    #[test]
    fn empty_value_follows_policy() {
        let mw = UserHeader::new(noop);
        assert!(mw.allows_empty());
        assert_eq!(mw.inspect(Some(b"")), accepted(""));

        let mw = UserHeader::builder().allow_empty(false).wrap(noop);
        assert_eq!(mw.inspect(Some(b"")), Outcome::Rejected(Rejection::EmptyNotAllowed));
    }

    #[test]
    fn empty_value_skips_grammar() {
        let mw = UserHeader::builder()
            .user_syntax("[a-z]*")
            .unwrap()
            .allow_empty(false)
            .wrap(noop);
        assert_eq!(mw.inspect(Some(b"")), Outcome::Rejected(Rejection::EmptyNotAllowed));
    }

    #[test]
    fn colon_is_rejected_before_decoding() {
        let mw = UserHeader::builder().user_syntax(".*").unwrap().wrap(noop);
        assert_eq!(mw.inspect(Some(b"john:secret")), Outcome::Rejected(Rejection::Colon));
        assert_eq!(mw.inspect(Some(b"%zz:")), Outcome::Rejected(Rejection::Colon));
        // an escaped colon is left to the grammar
        assert_eq!(mw.inspect(Some(b"john%3asecret")), accepted("john:secret"));
    }

    #[test]
    fn decoded_value_is_matched() {
        let mw = UserHeader::new(noop);
        assert_eq!(mw.inspect(Some(b"john")), accepted("john"));
        assert_eq!(mw.inspect(Some(b"j%c3%b8hn")), accepted("jøhn"));
        assert_eq!(mw.inspect(Some(b"%40example.com")), accepted("@example.com"));
        assert_eq!(mw.inspect(Some(b"john%3asecret")), Outcome::Rejected(Rejection::Mismatch));
        assert_eq!(mw.inspect(Some(b"john@example")), Outcome::Rejected(Rejection::Mismatch));
    }

    #[test]
    fn decode_failures_are_rejections() {
        let mw = UserHeader::new(noop);
        assert_eq!(
            mw.inspect(Some(b"j%c%3b8hn")),
            Outcome::Rejected(Rejection::Decode(DecodeError::MalformedEscape { offset: 1 })),
        );
        assert!(matches!(
            mw.inspect(Some(b"j%c3%b8%b8hn")),
            Outcome::Rejected(Rejection::Decode(DecodeError::InvalidUtf8(_))),
        ));
    }

    quickcheck! {
        fn inspect_is_repeatable(raw: Vec<u8>, allow_empty: bool) -> bool {
            let mw = UserHeader::builder().allow_empty(allow_empty).wrap(noop);
            mw.inspect(Some(raw.as_slice())) == mw.inspect(Some(raw.as_slice()))
        }

        fn absent_is_always_absent(allow_empty: bool) -> bool {
            let mw = UserHeader::builder().allow_empty(allow_empty).wrap(noop);
            mw.inspect(None) == Outcome::Absent
        }
    }

    #[tokio::test]
    async fn repeated_header_is_ignored() {
        let mw = UserHeader::new(|req: Request| async move {
            assert_eq!(req.local_user(), None);
            Response::text("")
        });
        let req = http::Request::get("/")
            .header("User", "john")
            .header("User", "jane")
            .body(Bytes::new())
            .unwrap();
        let res = mw.call(req.into()).await;
        assert_eq!(res.header_values("vary").count(), 0);
    }

    #[tokio::test]
    async fn vary_is_appended_after_inner_headers() {
        let mw = UserHeader::new(|_req: Request| async {
            Response::builder().header("Vary", "Accept").text("hi")
        });
        let req = http::Request::get("/").header("User", "john").body(Bytes::new()).unwrap();
        let res = mw.call(req.into()).await;
        let expected: Vec<(String, String)> = [
            ("content-type", "text/plain; charset=utf-8"),
            ("Vary", "Accept"),
            ("Vary", "User"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();
        assert_eq!(res.headers(), expected.as_slice());
    }

    #[tokio::test]
    async fn nested_middleware_marks_once_per_layer() {
        let mw = UserHeader::new(UserHeader::new(noop));
        let req = http::Request::get("/").header("User", "john").body(Bytes::new()).unwrap();
        let res = mw.call(req.into()).await;
        assert_eq!(res.header_values("vary").collect::<Vec<_>>(), ["User", "User"]);
    }

    #[test]
    fn invalid_user_syntax_fails_at_build_time() {
        let err = UserHeader::builder().user_syntax("(").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn debug_shows_configuration() {
        let mw = UserHeader::builder().allow_empty(false).wrap(noop);
        let dbg = format!("{mw:?}");
        assert!(dbg.starts_with("UserHeader"));
        assert!(dbg.contains("allow_empty: false"));
    }
}
