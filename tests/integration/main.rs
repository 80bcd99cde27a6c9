//! Integration tests for Sumi-Index
//!
//! These tests use wiremock to create mock HTTP servers and drive the
//! crawl pipeline, the SQLite store and the search tiers end-to-end.

mod crawl_tests;
mod search_tests;
mod support;
