//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns such as request-header inspection. Every middleware
//! here is itself a [`Handler`](crate::Handler), so layers nest:
//!
//! ```rust,no_run
//! # use usher::{Request, Response, middleware::user::UserHeader};
//! # async fn app(_req: Request) -> Response { Response::text("") }
//! let outer = UserHeader::new(app);
//! ```
//!
//! Built-in middleware:
//! - [`user`] — validates the `User` header and exposes it as
//!   [`LocalUser`](user::LocalUser)

pub mod user;
