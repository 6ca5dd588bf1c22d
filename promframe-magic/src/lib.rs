//! Interactive cell commands for `promframe`.
//!
//! Each command takes an argument line and a cell holding the query
//! expression, runs it through [`promframe::PrometheusClient`] and either
//! returns the result or binds it to a variable in the session namespace.

pub mod args;
pub mod session;

pub use session::{Command, Connect, HttpConnector, Magics, Namespace};
