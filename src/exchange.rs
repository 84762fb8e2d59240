//! Captured request/response pairs and their HAR form

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::Full;
use hyper::header::{HeaderMap, CONTENT_TYPE, COOKIE, LOCATION};
use hyper::{Method, Request, Version};

use crate::client::cookies::parse_cookie_header;
use crate::client::TestResponse;
use crate::har;
use crate::{AkitaError, Result};

/// Authority used for synthetic request URIs
pub const TEST_AUTHORITY: &str = "localhost";

/// The request exactly as it was handed to the application
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    /// HTTP method
    pub method: Method,
    /// Path including any URL prefix, without the query string
    pub path: String,
    /// Decoded query parameters in send order
    pub query: Vec<(String, String)>,
    /// Query string exactly as it appears in the request URI
    pub raw_query: Option<String>,
    /// Headers sent, after defaults and cookies were applied
    pub headers: HeaderMap,
    /// Request body
    pub body: Bytes,
    /// HTTP version
    pub version: Version,
}

impl CapturedRequest {
    /// Path and query as they appear in the request URI
    #[must_use]
    pub fn path_and_query(&self) -> String {
        match &self.raw_query {
            Some(query) => format!("{}?{query}", self.path),
            None => self.path.clone(),
        }
    }

    /// Build the hyper request handed to the service
    pub(crate) fn to_hyper_request(&self) -> Result<Request<Full<Bytes>>> {
        let uri = format!("http://{TEST_AUTHORITY}{}", self.path_and_query());
        let mut request = Request::builder()
            .method(self.method.clone())
            .uri(uri)
            .version(self.version)
            .body(Full::new(self.body.clone()))
            .map_err(|e| AkitaError::InvalidRequest(e.to_string()))?;
        *request.headers_mut() = self.headers.clone();
        Ok(request)
    }
}

/// One request/response pair recorded for a single client call
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedExchange {
    /// When the request was issued
    pub started_at: DateTime<Utc>,
    /// Time spent in the application, including body collection
    pub elapsed: Duration,
    /// Request sent
    pub request: CapturedRequest,
    /// Response received
    pub response: TestResponse,
}

impl CapturedExchange {
    /// Pair a request with its response
    #[must_use]
    pub fn new(
        started_at: DateTime<Utc>,
        elapsed: Duration,
        request: CapturedRequest,
        response: TestResponse,
    ) -> Self {
        Self {
            started_at,
            elapsed,
            request,
            response,
        }
    }

    /// Convert to a HAR entry
    #[must_use]
    pub fn to_har_entry(&self) -> har::Entry {
        har::Entry {
            started_date_time: self.started_at,
            time: self.elapsed.as_secs_f64() * 1000.0,
            request: self.har_request(),
            response: self.har_response(),
            cache: har::Cache::default(),
            timings: har::Timings::default(),
        }
    }

    fn har_request(&self) -> har::Request {
        let request = &self.request;

        let cookies = request
            .headers
            .get_all(COOKIE)
            .iter()
            .flat_map(|v| parse_cookie_header(&String::from_utf8_lossy(v.as_bytes())))
            .map(|(name, value)| har::Record::new(name, value))
            .collect();

        let query_string = request
            .query
            .iter()
            .map(|(name, value)| har::Record::new(name.as_str(), value.as_str()))
            .collect();

        let post_data = (!request.body.is_empty()).then(|| {
            let (text, encoding) = body_text(&request.body);
            har::PostData {
                mime_type: header_str(&request.headers, CONTENT_TYPE.as_str()),
                text,
                encoding,
            }
        });

        har::Request {
            method: request.method.to_string(),
            url: request.path.clone(),
            http_version: version_str(request.version),
            cookies,
            headers: header_records(&request.headers),
            query_string,
            post_data,
            headers_size: headers_size(&request.headers),
            body_size: request.body.len() as i64,
        }
    }

    fn har_response(&self) -> har::Response {
        let response = &self.response;
        let status = response.status();
        let (text, encoding) = body_text(response.body());

        har::Response {
            status: status.as_u16(),
            status_text: format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or(""))
                .trim_end()
                .to_string(),
            http_version: version_str(response.version()),
            cookies: Vec::new(),
            headers: header_records(response.headers()),
            content: har::ResponseContent {
                size: response.body().len() as i64,
                mime_type: response.content_type().to_string(),
                text,
                encoding,
            },
            redirect_url: header_str(response.headers(), LOCATION.as_str()),
            headers_size: headers_size(response.headers()),
            body_size: response.body().len() as i64,
        }
    }
}

/// Body as HAR text; bodies that are not UTF-8 are base64 encoded
fn body_text(body: &Bytes) -> (String, Option<String>) {
    match std::str::from_utf8(body) {
        Ok(text) => (text.to_string(), None),
        Err(_) => (BASE64.encode(body), Some("base64".to_string())),
    }
}

fn version_str(version: Version) -> String {
    format!("{version:?}")
}

fn header_str(headers: &HeaderMap, name: &str) -> String {
    headers
        .get(name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .unwrap_or_default()
}

fn header_records(headers: &HeaderMap) -> Vec<har::Record> {
    headers
        .iter()
        .map(|(name, value)| {
            har::Record::new(name.as_str(), String::from_utf8_lossy(value.as_bytes()))
        })
        .collect()
}

/// Byte length of the headers rendered as `name: value` lines joined by `\n`
fn headers_size(headers: &HeaderMap) -> i64 {
    let lines: usize = headers
        .iter()
        .map(|(name, value)| name.as_str().len() + 2 + value.as_bytes().len())
        .sum();
    let separators = headers.len().saturating_sub(1);
    (lines + separators) as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;
    use hyper::StatusCode;

    fn captured_request(method: Method, path: &str) -> CapturedRequest {
        CapturedRequest {
            method,
            path: path.to_string(),
            query: Vec::new(),
            raw_query: None,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            version: Version::HTTP_11,
        }
    }

    fn json_response(status: StatusCode, body: &str) -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(status, Version::HTTP_11, headers, Bytes::from(body.to_string()))
    }

    #[test]
    fn test_get_entry() {
        let exchange = CapturedExchange::new(
            Utc::now(),
            Duration::from_millis(5),
            captured_request(Method::GET, "/health"),
            json_response(StatusCode::OK, r#"{"ok":true}"#),
        );

        let entry = exchange.to_har_entry();
        assert_eq!(entry.request.method, "GET");
        assert_eq!(entry.request.url, "/health");
        assert_eq!(entry.request.http_version, "HTTP/1.1");
        assert!(entry.request.post_data.is_none());
        assert_eq!(entry.request.body_size, 0);
        assert_eq!(entry.response.status, 200);
        assert_eq!(entry.response.status_text, "200 OK");
        assert_eq!(entry.response.content.mime_type, "application/json");
        assert_eq!(entry.response.content.text, r#"{"ok":true}"#);
        assert_eq!(entry.response.body_size, 11);
        assert!((entry.time - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_post_entry() {
        let mut request = captured_request(Method::POST, "/files");
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request.body = Bytes::from(r#"{"name":"a.txt"}"#);

        let exchange = CapturedExchange::new(
            Utc::now(),
            Duration::ZERO,
            request,
            json_response(StatusCode::CREATED, r#"{"id":1}"#),
        );

        let entry = exchange.to_har_entry();
        let post_data = entry.request.post_data.unwrap();
        assert_eq!(post_data.mime_type, "application/json");
        assert_eq!(post_data.text, r#"{"name":"a.txt"}"#);
        assert_eq!(entry.request.body_size, 16);
        assert_eq!(entry.response.status_text, "201 Created");
    }

    #[test]
    fn test_query_and_cookies() {
        let mut request = captured_request(Method::GET, "/search");
        request.query = vec![
            ("q".to_string(), "rust lang".to_string()),
            ("tag".to_string(), "a".to_string()),
            ("tag".to_string(), "b".to_string()),
        ];
        request.raw_query = Some("q=rust+lang&tag=a&tag=b".to_string());
        request
            .headers
            .append(COOKIE, HeaderValue::from_static("session=abc; theme=dark"));

        let exchange = CapturedExchange::new(
            Utc::now(),
            Duration::ZERO,
            request,
            json_response(StatusCode::OK, "[]"),
        );

        assert_eq!(
            exchange.request.path_and_query(),
            "/search?q=rust+lang&tag=a&tag=b"
        );

        let entry = exchange.to_har_entry();
        assert_eq!(entry.request.url, "/search");
        assert_eq!(
            entry.request.query_string,
            vec![
                har::Record::new("q", "rust lang"),
                har::Record::new("tag", "a"),
                har::Record::new("tag", "b"),
            ]
        );
        assert_eq!(
            entry.request.cookies,
            vec![
                har::Record::new("session", "abc"),
                har::Record::new("theme", "dark"),
            ]
        );
    }

    #[test]
    fn test_redirect_and_headers_size() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("/login"));
        headers.insert("x-a", HeaderValue::from_static("1"));
        let response = TestResponse::new(StatusCode::FOUND, Version::HTTP_11, headers, Bytes::new());

        let exchange = CapturedExchange::new(
            Utc::now(),
            Duration::ZERO,
            captured_request(Method::GET, "/account"),
            response,
        );

        let entry = exchange.to_har_entry();
        assert_eq!(entry.response.redirect_url, "/login");
        assert_eq!(entry.response.content.mime_type, "");
        // "location: /login\nx-a: 1"
        assert_eq!(entry.response.headers_size, 23);
        assert_eq!(entry.request.headers_size, 0);
    }

    #[test]
    fn test_to_hyper_request() {
        let mut request = captured_request(Method::PUT, "/files/1");
        request.query = vec![("force".to_string(), "yes".to_string())];
        request.raw_query = Some("force=yes".to_string());
        request.headers.insert("x-a", HeaderValue::from_static("1"));

        let hyper_request = request.to_hyper_request().unwrap();
        assert_eq!(hyper_request.method(), Method::PUT);
        assert_eq!(hyper_request.uri().path(), "/files/1");
        assert_eq!(hyper_request.uri().query(), Some("force=yes"));
        assert_eq!(hyper_request.headers()["x-a"], "1");
    }

    #[test]
    fn test_binary_bodies_base64() {
        let mut request = captured_request(Method::PUT, "/blobs/1");
        request.body = Bytes::from_static(b"\x00\x9f\x92\x96");
        let response = TestResponse::new(
            StatusCode::OK,
            Version::HTTP_11,
            HeaderMap::new(),
            Bytes::from_static(b"\xff\0\x89P"),
        );

        let entry = CapturedExchange::new(Utc::now(), Duration::ZERO, request, response)
            .to_har_entry();

        let content = &entry.response.content;
        assert_eq!(content.encoding.as_deref(), Some("base64"));
        assert_eq!(BASE64.decode(&content.text).unwrap(), b"\xff\0\x89P");
        assert_eq!(content.size, 4);

        let post_data = entry.request.post_data.unwrap();
        assert_eq!(post_data.encoding.as_deref(), Some("base64"));
        assert_eq!(BASE64.decode(&post_data.text).unwrap(), b"\x00\x9f\x92\x96");
    }

    #[test]
    fn test_text_bodies_not_encoded() {
        let exchange = CapturedExchange::new(
            Utc::now(),
            Duration::ZERO,
            captured_request(Method::GET, "/health"),
            json_response(StatusCode::OK, "héllo"),
        );

        let entry = exchange.to_har_entry();
        assert!(entry.response.content.encoding.is_none());
        assert_eq!(entry.response.content.text, "héllo");
    }

    #[test]
    fn test_response_version_from_response() {
        let response = TestResponse::new(
            StatusCode::OK,
            Version::HTTP_2,
            HeaderMap::new(),
            Bytes::new(),
        );
        let exchange = CapturedExchange::new(
            Utc::now(),
            Duration::ZERO,
            captured_request(Method::GET, "/health"),
            response,
        );

        let entry = exchange.to_har_entry();
        assert_eq!(entry.request.http_version, "HTTP/1.1");
        assert_eq!(entry.response.http_version, "HTTP/2.0");
    }
}
