//! Integration tests for `rowcursor`
//!
//! This crate contains integration tests that verify the cursor together with
//! the in-memory row sources and the test doubles from `rowcursor-testing`.

// This is a test-only crate
#![cfg(test)]
