//! akita-hyper - record test-client traffic as HAR
//!
//! Integration tests drive an in-process hyper service through
//! [`HarClient`]; every request/response pair is written to a HAR file (or
//! any other [`Collector`]) so an API specification can be inferred from it.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::multiple_crate_versions
)]

pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod exchange;
pub mod har;

pub use client::{HarClient, Open, TestClient, TestRequest, TestResponse};
pub use collector::{Collector, HarFileCollector, MemoryCollector};
pub use error::{AkitaError, Result};
pub use exchange::{CapturedExchange, CapturedRequest};
