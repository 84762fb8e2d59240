//! In-process test clients
//!
//! [`TestClient`] issues requests against a hyper service without a socket.
//! [`HarClient`] wraps it and hands every exchange to a [`Collector`].
//! Both implement [`Open`], so tests can swap one for the other.
//!
//! [`Collector`]: crate::collector::Collector

pub mod cookies;
mod har_client;
pub(crate) mod request;
mod response;
mod test_client;

use bytes::Bytes;

pub use cookies::CookieJar;
pub use har_client::HarClient;
pub use request::TestRequest;
pub use response::TestResponse;
pub use test_client::TestClient;

use crate::Result;

/// Issue a request against the application under test
#[allow(async_fn_in_trait)]
pub trait Open {
    /// Send `request` and return the buffered response
    ///
    /// # Errors
    ///
    /// Returns error if the request is invalid, the application fails, or
    /// the body cannot be read
    async fn open(&mut self, request: TestRequest) -> Result<TestResponse>;

    /// `GET path`
    ///
    /// # Errors
    ///
    /// See [`Open::open`]
    async fn get(&mut self, path: &str) -> Result<TestResponse> {
        self.open(TestRequest::get(path)).await
    }

    /// `POST path` with a raw body
    ///
    /// # Errors
    ///
    /// See [`Open::open`]
    async fn post(&mut self, path: &str, body: impl Into<Bytes>) -> Result<TestResponse> {
        self.open(TestRequest::post(path).body(body)).await
    }

    /// `PUT path` with a raw body
    ///
    /// # Errors
    ///
    /// See [`Open::open`]
    async fn put(&mut self, path: &str, body: impl Into<Bytes>) -> Result<TestResponse> {
        self.open(TestRequest::put(path).body(body)).await
    }

    /// `PATCH path` with a raw body
    ///
    /// # Errors
    ///
    /// See [`Open::open`]
    async fn patch(&mut self, path: &str, body: impl Into<Bytes>) -> Result<TestResponse> {
        self.open(TestRequest::patch(path).body(body)).await
    }

    /// `DELETE path`
    ///
    /// # Errors
    ///
    /// See [`Open::open`]
    async fn delete(&mut self, path: &str) -> Result<TestResponse> {
        self.open(TestRequest::delete(path)).await
    }

    /// `HEAD path`
    ///
    /// # Errors
    ///
    /// See [`Open::open`]
    async fn head(&mut self, path: &str) -> Result<TestResponse> {
        self.open(TestRequest::head(path)).await
    }

    /// `OPTIONS path`
    ///
    /// # Errors
    ///
    /// See [`Open::open`]
    async fn options(&mut self, path: &str) -> Result<TestResponse> {
        self.open(TestRequest::options(path)).await
    }
}
