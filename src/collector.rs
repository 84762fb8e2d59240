//! Destinations for captured exchanges

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tracing::debug;

use crate::exchange::CapturedExchange;
use crate::har::HarWriter;
use crate::{AkitaError, Result};

/// Receives one exchange per successful client call.
///
/// Collectors are shared between clients through `Arc<dyn Collector>`, so
/// implementations synchronize internally.
pub trait Collector: Send + Sync {
    /// Accept a captured exchange
    ///
    /// # Errors
    ///
    /// Returns error if the exchange could not be stored or forwarded
    fn collect(&self, exchange: CapturedExchange) -> Result<()>;

    /// Flush and release any resources
    ///
    /// # Errors
    ///
    /// Returns error if the final flush fails
    fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| AkitaError::Collector("collector lock poisoned".to_string()))
}

/// Streams exchanges into a HAR file
pub struct HarFileCollector {
    writer: Mutex<HarWriter>,
}

impl HarFileCollector {
    /// Create the HAR file and write its header
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be created
    pub fn create(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: Mutex::new(HarWriter::create(path)?),
        })
    }

    /// Number of entries written so far
    ///
    /// # Errors
    ///
    /// Returns error if the writer lock is poisoned
    pub fn entry_count(&self) -> Result<usize> {
        Ok(lock(&self.writer)?.entry_count())
    }
}

impl Collector for HarFileCollector {
    fn collect(&self, exchange: CapturedExchange) -> Result<()> {
        let entry = exchange.to_har_entry();
        lock(&self.writer)?.write_entry(&entry)
    }

    fn close(&self) -> Result<()> {
        lock(&self.writer)?.close()
    }
}

/// Keeps exchanges in memory, in the order they were collected
#[derive(Default)]
pub struct MemoryCollector {
    exchanges: Mutex<Vec<CapturedExchange>>,
}

impl MemoryCollector {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the collected exchanges
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned
    pub fn exchanges(&self) -> Result<Vec<CapturedExchange>> {
        Ok(lock(&self.exchanges)?.clone())
    }

    /// Remove and return the collected exchanges
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned
    pub fn take(&self) -> Result<Vec<CapturedExchange>> {
        Ok(std::mem::take(&mut *lock(&self.exchanges)?))
    }

    /// Number of collected exchanges
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned
    pub fn len(&self) -> Result<usize> {
        Ok(lock(&self.exchanges)?.len())
    }

    /// Whether nothing has been collected
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned
    pub fn is_empty(&self) -> Result<bool> {
        Ok(lock(&self.exchanges)?.is_empty())
    }
}

impl Collector for MemoryCollector {
    fn collect(&self, exchange: CapturedExchange) -> Result<()> {
        let mut exchanges = lock(&self.exchanges)?;
        exchanges.push(exchange);
        debug!("Collected exchange {}", exchanges.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TestResponse;
    use crate::exchange::CapturedRequest;
    use bytes::Bytes;
    use chrono::Utc;
    use hyper::header::HeaderMap;
    use hyper::{Method, StatusCode, Version};
    use std::time::Duration;
    use tempfile::TempDir;

    fn exchange(path: &str) -> CapturedExchange {
        CapturedExchange::new(
            Utc::now(),
            Duration::from_millis(1),
            CapturedRequest {
                method: Method::GET,
                path: path.to_string(),
                query: vec![],
                raw_query: None,
                headers: HeaderMap::new(),
                body: Bytes::new(),
                version: Version::HTTP_11,
            },
            TestResponse::new(
                StatusCode::OK,
                Version::HTTP_11,
                HeaderMap::new(),
                Bytes::from_static(b"ok"),
            ),
        )
    }

    #[test]
    fn test_memory_collector_order() {
        let collector = MemoryCollector::new();
        assert!(collector.is_empty().unwrap());

        for path in ["/a", "/b", "/c"] {
            collector.collect(exchange(path)).unwrap();
        }

        let paths: Vec<_> = collector
            .exchanges()
            .unwrap()
            .into_iter()
            .map(|e| e.request.path)
            .collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);

        assert_eq!(collector.take().unwrap().len(), 3);
        assert_eq!(collector.len().unwrap(), 0);
    }

    #[test]
    fn test_har_file_collector() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("trace.har");

        let collector = HarFileCollector::create(&path).unwrap();
        collector.collect(exchange("/health")).unwrap();
        collector.collect(exchange("/files/1")).unwrap();
        assert_eq!(collector.entry_count().unwrap(), 2);
        collector.close().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = value["log"]["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["request"]["url"], "/health");
        assert_eq!(entries[1]["response"]["content"]["text"], "ok");
    }

    #[test]
    fn test_har_file_collector_closed() {
        let temp_dir = TempDir::new().unwrap();
        let collector = HarFileCollector::create(&temp_dir.path().join("trace.har")).unwrap();

        collector.close().unwrap();
        let result = collector.collect(exchange("/late"));
        assert!(matches!(result, Err(AkitaError::WriterClosed)));
    }
}
