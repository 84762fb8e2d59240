//! Plain in-process test client

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, COOKIE, HOST};
use hyper::service::Service;
use hyper::{Request, Response, Version};
use tracing::debug;

use super::cookies::CookieJar;
use super::request::{encode_query, parse_query, split_path};
use super::{Open, TestRequest, TestResponse};
use crate::config::{Config, LimitsConfig};
use crate::error::BoxError;
use crate::exchange::{CapturedRequest, TEST_AUTHORITY};
use crate::{AkitaError, Result};

/// Issues synthetic requests against an in-process hyper service.
///
/// Session state lives here: cookies set by the application are replayed on
/// later requests, and default headers are merged into every request.
pub struct TestClient<S> {
    service: S,
    url_prefix: String,
    version: Version,
    default_headers: HeaderMap,
    cookies: CookieJar,
    max_body_size: usize,
}

impl<S> TestClient<S> {
    /// Create a client for `service` with default settings
    pub fn new(service: S) -> Self {
        Self {
            service,
            url_prefix: String::new(),
            version: Version::HTTP_11,
            default_headers: HeaderMap::new(),
            cookies: CookieJar::new(),
            max_body_size: LimitsConfig::default().max_body_size,
        }
    }

    /// Create a client using the prefix, version, headers, and limits of `config`
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn from_config(service: S, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            service,
            url_prefix: config.url_prefix.clone(),
            version: config.version()?,
            default_headers: config.default_header_map()?,
            cookies: CookieJar::new(),
            max_body_size: config.limits.max_body_size,
        })
    }

    /// Prepend `prefix` to every request path
    #[must_use]
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    /// Send every request with this HTTP version
    #[must_use]
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Add a header sent with every request
    #[must_use]
    pub fn with_default_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.default_headers.append(name, value);
        self
    }

    /// Reject response bodies larger than `limit` bytes
    #[must_use]
    pub fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    /// The wrapped service
    pub fn service(&self) -> &S {
        &self.service
    }

    /// URL prefix applied to request paths
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Cookies held by this client
    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    /// Mutable access to the cookie jar
    pub fn cookies_mut(&mut self) -> &mut CookieJar {
        &mut self.cookies
    }

    /// Resolve a request against this client's session state
    ///
    /// # Errors
    ///
    /// Returns error if a request builder step failed
    pub fn prepare(&self, request: TestRequest) -> Result<CapturedRequest> {
        request.check()?;

        // The query written in the path is forwarded untouched; only pairs
        // added through the builder are encoded and appended
        let (path, raw_query) = split_path(&request.path);
        let mut query = raw_query.as_deref().map(parse_query).unwrap_or_default();
        let raw_query = if request.query.is_empty() {
            raw_query
        } else {
            let added = encode_query(&request.query);
            Some(match raw_query {
                Some(raw) if !raw.is_empty() => format!("{raw}&{added}"),
                _ => added,
            })
        };
        query.extend(request.query);

        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{path}")
        };
        let path = format!("{}{path}", self.url_prefix.trim_end_matches('/'));

        // Request headers replace defaults of the same name
        let mut headers = self.default_headers.clone();
        for name in request.headers.keys() {
            headers.remove(name);
        }
        for (name, value) in &request.headers {
            headers.append(name.clone(), value.clone());
        }

        if !headers.contains_key(HOST) {
            headers.insert(HOST, HeaderValue::from_static(TEST_AUTHORITY));
        }
        if !headers.contains_key(COOKIE) {
            if let Some(cookie) = self.cookies.header_value() {
                headers.insert(COOKIE, cookie);
            }
        }
        if !request.body.is_empty() && !headers.contains_key(CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(request.body.len()));
        }

        Ok(CapturedRequest {
            method: request.method,
            path,
            query,
            raw_query,
            headers,
            body: request.body,
            version: self.version,
        })
    }
}

impl<S, B> TestClient<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<B>>,
    S::Error: Into<BoxError>,
    B: Body,
    B::Error: std::fmt::Display,
{
    /// Send a request and return both what was sent and what came back
    ///
    /// # Errors
    ///
    /// Returns error if the request is invalid, the service fails, or the
    /// response body cannot be read
    pub async fn exchange(
        &mut self,
        request: TestRequest,
    ) -> Result<(CapturedRequest, TestResponse)> {
        let sent = self.prepare(request)?;
        let hyper_request = sent.to_hyper_request()?;

        debug!("{} {}", sent.method, sent.path_and_query());

        let response = self
            .service
            .call(hyper_request)
            .await
            .map_err(|e| AkitaError::Application(e.into()))?;

        let (parts, body) = response.into_parts();
        let body = read_body(body, self.max_body_size).await?;

        self.cookies.store(&parts.headers);

        debug!(
            "{} {} -> {} ({} bytes)",
            sent.method,
            sent.path,
            parts.status,
            body.len()
        );

        let response = TestResponse::new(parts.status, parts.version, parts.headers, body);
        Ok((sent, response))
    }
}

impl<S, B> Open for TestClient<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<B>>,
    S::Error: Into<BoxError>,
    B: Body,
    B::Error: std::fmt::Display,
{
    async fn open(&mut self, request: TestRequest) -> Result<TestResponse> {
        let (_, response) = self.exchange(request).await?;
        Ok(response)
    }
}

/// Read a response body with size limit
async fn read_body<B>(body: B, max_size: usize) -> Result<Bytes>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let collected = body
        .collect()
        .await
        .map_err(|e| AkitaError::Body(e.to_string()))?;

    let bytes = collected.to_bytes();

    if bytes.len() > max_size {
        return Err(AkitaError::DataTooLarge {
            size: bytes.len(),
            limit: max_size,
        });
    }

    Ok(bytes)
}
