//! Prometheus HTTP API client that shapes query results into in-memory
//! vectors, matrices, scalars and strings.
//!
//! One request/response round trip per call: parameters are normalized, the
//! request is sent over a reusable blocking connection, the response status
//! and envelope are checked, and the `data` payload is converted.

pub mod client;
pub mod config;
pub mod convert;
pub mod duration;
pub mod error;
pub mod model;
pub mod params;
pub mod result;
pub mod transport;

pub use client::PrometheusClient;
pub use config::ClientConfig;
pub use convert::convert;
pub use duration::parse_duration;
pub use error::{Error, Result};
pub use params::{DurationInput, TimestampInput};
pub use result::{metric_id, AlignedFrame, Matrix, QueryResult, ResultType, Sample, Vector};
pub use transport::{FakeTransport, HttpTransport, Transport};
