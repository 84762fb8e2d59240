//! HAR 1.2 output for captured exchanges

mod model;
mod writer;

pub use model::{
    Cache, Creator, Entry, PostData, Record, Request, Response, ResponseContent, Timings,
};
pub use writer::HarWriter;

/// HAR format version written to every file
pub const HAR_VERSION: &str = "1.2";

/// Creator name recorded in HAR files
pub const CREATOR_NAME: &str = "akita-hyper";
