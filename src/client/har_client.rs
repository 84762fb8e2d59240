//! Test client that records every exchange

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use chrono::Utc;
use http_body_util::Full;
use hyper::body::Body;
use hyper::service::Service;
use hyper::{Request, Response};
use tracing::{debug, warn};

use super::{Open, TestClient, TestRequest, TestResponse};
use crate::collector::{Collector, HarFileCollector};
use crate::config::Config;
use crate::error::BoxError;
use crate::exchange::CapturedExchange;
use crate::Result;

/// Drop-in replacement for [`TestClient`] that forwards each successful
/// exchange to a collector before returning the response.
///
/// Collector failures are logged and never reach the caller. Requests that
/// fail in the application are returned unchanged and not captured.
pub struct HarClient<S> {
    inner: TestClient<S>,
    collector: Arc<dyn Collector>,
}

impl<S> HarClient<S> {
    /// Wrap `inner`, sending exchanges to `collector`
    pub fn new(inner: TestClient<S>, collector: Arc<dyn Collector>) -> Self {
        Self { inner, collector }
    }

    /// Wrap `inner`, writing exchanges to a new HAR file at `path`
    ///
    /// # Errors
    ///
    /// Returns error if the HAR file cannot be created
    pub fn with_har_file(inner: TestClient<S>, path: &Path) -> Result<Self> {
        let collector = HarFileCollector::create(path)?;
        Ok(Self::new(inner, Arc::new(collector)))
    }

    /// Build a client and HAR file collector from `config`
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid or the HAR file cannot
    /// be created
    pub fn from_config(service: S, config: &Config) -> Result<Self> {
        let inner = TestClient::from_config(service, config)?;
        Self::with_har_file(inner, &config.har_file_path)
    }

    /// The wrapped client
    pub fn inner(&self) -> &TestClient<S> {
        &self.inner
    }

    /// Mutable access to the wrapped client
    pub fn inner_mut(&mut self) -> &mut TestClient<S> {
        &mut self.inner
    }

    /// The collector receiving exchanges
    pub fn collector(&self) -> &Arc<dyn Collector> {
        &self.collector
    }

    /// Release the wrapped client, closing the collector if this client holds
    /// the last handle to it.
    ///
    /// A collector shared with other clients stays open; it is finished when
    /// its last owner closes or drops it.
    ///
    /// # Errors
    ///
    /// Returns error if the collector fails to flush
    pub fn close(self) -> Result<TestClient<S>> {
        if Arc::strong_count(&self.collector) == 1 {
            self.collector.close()?;
        } else {
            debug!("Collector still shared, leaving it open");
        }
        Ok(self.inner)
    }
}

impl<S, B> Open for HarClient<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<B>>,
    S::Error: Into<BoxError>,
    B: Body,
    B::Error: std::fmt::Display,
{
    async fn open(&mut self, request: TestRequest) -> Result<TestResponse> {
        let started_at = Utc::now();
        let clock = Instant::now();

        let (sent, response) = self.inner.exchange(request).await?;

        let exchange = CapturedExchange::new(started_at, clock.elapsed(), sent, response.clone());
        match self.collector.collect(exchange) {
            Ok(()) => debug!("Captured exchange"),
            Err(e) => warn!("Failed to capture exchange: {e}"),
        }

        Ok(response)
    }
}
