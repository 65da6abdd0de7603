//! Integration tests for the ModelHub proxy
//!
//! Each test drives the real router through axum-test with a wiremock
//! provider standing in for the third-party API.

mod audio;
mod auth;
mod embedding;
mod media;
mod upstream_errors;
mod validation;
