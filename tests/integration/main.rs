//! Integration tests for linkwell
//!
//! Direct fetches go to a local wiremock server; rendered fetches go to the
//! scripted in-memory browser backend.

mod common;
mod config_tests;
mod escalation_tests;
mod extraction_tests;
mod pool_tests;
mod retry_tests;
