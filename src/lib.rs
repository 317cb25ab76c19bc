//! # usher
//!
//! Middleware for the HTTP `User` header.
//!
//! ## The contract
//!
//! `User` names a user on the *server* side: whose resources a request is
//! about, as opposed to who is asking. usher checks the header and, when it
//! holds a valid identity, hands that identity to the handler behind it.
//!
//! What usher does, once per request:
//!
//! - **Unescape** — `%XX` escapes are resolved; broken escapes and non-UTF-8
//!   results are refused
//! - **Validate** — the result must be a Network Access Identifier
//!   (RFC 7542), or match your own syntax
//! - **Expose** — an accepted value lands in the request context as
//!   [`LocalUser`]
//! - **Mark** — the response then gets `Vary: User`, so caches keep users
//!   apart
//!
//! What usher does not do: authenticate, authorize, serve or route. A bad
//! header never fails a request; it is simply ignored.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use usher::{Request, Response, UserHeader};
//!
//! async fn home(req: Request) -> Response {
//!     match req.local_user() {
//!         Some(user) => Response::text(format!("home of {user}")),
//!         None => Response::text("site home"),
//!     }
//! }
//!
//! # async fn run() {
//! let app = UserHeader::new(home);
//!
//! let req = http::Request::get("/")
//!     .header("User", "j%c3%b8hn")
//!     .body(bytes::Bytes::new())
//!     .unwrap();
//! let res = app.call(req.into()).await;
//! assert_eq!(res.header_values("vary").collect::<Vec<_>>(), ["User"]);
//! # }
//! ```

mod decode;
mod error;
mod grammar;
mod handler;
mod request;
mod response;

pub mod middleware;

pub use decode::DecodeError;
pub use error::Error;
pub use grammar::Grammar;
pub use handler::{BoxFuture, Handler};
pub use middleware::user::{LocalUser, Outcome, Rejection, USER, UserHeader, UserHeaderBuilder};
pub use request::Request;
pub use response::{Body, IntoResponse, Response, ResponseBuilder};
