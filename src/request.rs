//! Incoming HTTP request type.

use bytes::Bytes;
use http::{Extensions, HeaderMap, HeaderValue, Method, Uri};

use crate::middleware::user::LocalUser;

/// An incoming HTTP request, as handed over by the host.
///
/// Besides the wire data, every request carries a typed context
/// ([`Extensions`]) that middleware fills in for the handlers behind it.
#[derive(Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) uri: Uri,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) extensions: Extensions,
}

impl Request {
    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Returns the raw value, escapes intact.
    pub fn header(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Request context shared with downstream handlers.
    pub fn extensions(&self) -> &Extensions { &self.extensions }
    pub fn extensions_mut(&mut self) -> &mut Extensions { &mut self.extensions }

    /// The validated `User` identity, if a [`UserHeader`] accepted one.
    ///
    /// [`UserHeader`]: crate::middleware::user::UserHeader
    pub fn local_user(&self) -> Option<&str> {
        self.extensions.get::<LocalUser>().map(LocalUser::as_str)
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            extensions: parts.extensions,
        }
    }
}
