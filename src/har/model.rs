//! HAR data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tool that produced the HAR file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    /// Tool name
    pub name: String,
    /// Tool version
    pub version: String,
}

impl Default for Creator {
    fn default() -> Self {
        Self {
            name: super::CREATOR_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A name/value pair (headers, cookies, query parameters)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Name
    pub name: String,
    /// Value
    pub value: String,
}

impl Record {
    /// Create a record
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Posted request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    /// Content type of the body
    pub mime_type: String,
    /// Body text
    pub text: String,
    /// `base64` when `text` holds an encoded binary body
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub encoding: Option<String>,
}

/// Request half of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// HTTP method
    pub method: String,
    /// Request path, without scheme, host, or query
    pub url: String,
    /// HTTP version
    pub http_version: String,
    /// Cookies sent in `Cookie` headers
    pub cookies: Vec<Record>,
    /// One record per header value
    pub headers: Vec<Record>,
    /// Decoded query parameters
    pub query_string: Vec<Record>,
    /// Body, absent when empty
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub post_data: Option<PostData>,
    /// Length of the rendered header block
    pub headers_size: i64,
    /// Body length in bytes
    pub body_size: i64,
}

/// Response body details
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseContent {
    /// Body length in bytes
    pub size: i64,
    /// Content type of the body
    pub mime_type: String,
    /// Body text
    pub text: String,
    /// `base64` when `text` holds an encoded binary body
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub encoding: Option<String>,
}

/// Response half of an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Status code
    pub status: u16,
    /// Status line, e.g. `200 OK`
    pub status_text: String,
    /// HTTP version
    pub http_version: String,
    /// Always empty
    pub cookies: Vec<Record>,
    /// One record per header value
    pub headers: Vec<Record>,
    /// Body details
    pub content: ResponseContent,
    /// `Location` header, or empty
    #[serde(rename = "redirectURL")]
    pub redirect_url: String,
    /// Length of the rendered header block
    pub headers_size: i64,
    /// Body length in bytes
    pub body_size: i64,
}

/// Cache state; always empty for in-process traffic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cache {}

/// Phase timings in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct Timings {
    pub send: f64,
    pub wait: f64,
    pub receive: f64,
}

/// One request/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// When the request was issued
    pub started_date_time: DateTime<Utc>,
    /// Total elapsed time in milliseconds
    pub time: f64,
    /// Request sent
    pub request: Request,
    /// Response received
    pub response: Response,
    /// Cache state
    pub cache: Cache,
    /// Phase timings
    pub timings: Timings,
}
