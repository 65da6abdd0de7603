//! API Documentation module
//!
//! Provides OpenAPI specification generation for the proxy API using utoipa.

mod openapi;

pub use openapi::ProxyApiDoc;
