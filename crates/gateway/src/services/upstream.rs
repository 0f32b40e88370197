//! Request forwarding to the backend API and the page renderer.
//!
//! The gateway is transparent for cookies: `Cookie` goes upstream untouched and
//! `Set-Cookie` comes back untouched, so the browser keeps talking to the
//! backend session directly. Redirects are passed through, never followed.

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, HeaderName, Method, Response, StatusCode, Uri, header},
};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

/// Headers that describe a single connection and must not be forwarded.
static HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Errors raised while forwarding a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// The upstream could not be reached.
    #[error("upstream {upstream} unreachable: {message}")]
    Unreachable { upstream: String, message: String },

    /// The upstream response could not be read.
    #[error("upstream {upstream} response error: {message}")]
    Response { upstream: String, message: String },

    /// The response could not be rebuilt for the client.
    #[error("could not build proxied response: {0}")]
    Build(String),
}

/// A named upstream HTTP service.
#[derive(Debug, Clone)]
pub struct Upstream {
    name: &'static str,
    client: Client,
    base: Url,
}

impl Upstream {
    /// Create an upstream rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(name: &'static str, base: Url) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self { name, client, base })
    }

    /// Name used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Resolve a request URI against this upstream's base URL.
    #[must_use]
    pub fn target_url(&self, uri: &Uri) -> Url {
        let mut url = self.base.clone();
        url.set_path(uri.path());
        url.set_query(uri.query());
        url
    }

    /// Forward a request and rebuild the upstream response.
    ///
    /// # Errors
    ///
    /// Returns `ProxyError` if the upstream is unreachable or its response
    /// cannot be read.
    #[instrument(skip(self, headers, body), fields(upstream = self.name))]
    pub async fn forward(
        &self,
        method: Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<Response<Body>, ProxyError> {
        let url = self.target_url(uri);
        let mut outbound = strip_hop_by_hop(headers);
        outbound.remove(header::HOST);
        outbound.remove(header::CONTENT_LENGTH);

        let response = self
            .client
            .request(method, url)
            .headers(outbound)
            .body(body)
            .send()
            .await
            .map_err(|e| ProxyError::Unreachable {
                upstream: self.name.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let mut inbound = strip_hop_by_hop(response.headers());
        inbound.remove(header::CONTENT_LENGTH);

        let bytes = response.bytes().await.map_err(|e| ProxyError::Response {
            upstream: self.name.to_string(),
            message: e.to_string(),
        })?;

        debug!(status = status.as_u16(), bytes = bytes.len(), "Upstream responded");

        let mut proxied = Response::builder()
            .status(status)
            .body(Body::from(bytes))
            .map_err(|e| ProxyError::Build(e.to_string()))?;
        proxied.headers_mut().extend(inbound);

        Ok(proxied)
    }
}

/// Copy `headers`, dropping hop-by-hop headers and anything listed in `Connection`.
fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::try_from(name.trim()).ok())
        .collect();

    let mut out = headers.clone();
    for name in HOP_BY_HOP.iter().chain(listed.iter()) {
        out.remove(name);
    }
    out
}

/// Map a proxy failure to the status returned to the client.
#[must_use]
pub const fn status_for(error: &ProxyError) -> StatusCode {
    match error {
        ProxyError::Unreachable { .. } | ProxyError::Response { .. } => StatusCode::BAD_GATEWAY,
        ProxyError::Build(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
