//! Boundary to the gateway that invokes the access phase for each request.

use std::collections::HashMap;
use thiserror::Error;

/// Failure to read a request attribute from the host
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("request {0} is unavailable")]
    Unavailable(&'static str),

    #[error("header {name} is not valid text")]
    InvalidHeader { name: String },

    #[error("host error: {0}")]
    Host(String),
}

/// Per-request accessors and the response short-circuit the gateway provides
pub trait Host {
    fn method(&self) -> Result<String, HostError>;

    fn path(&self) -> Result<String, HostError>;

    /// Header value by case-insensitive name, `None` when absent
    fn header(&self, name: &str) -> Result<Option<String>, HostError>;

    /// Stop processing and answer the client directly
    fn exit(&mut self, status: u16, body: String, headers: HashMap<String, Vec<String>>);
}
