//! Shared test utilities for pdfsort integration tests.
//!
//! This module provides:
//! - `TestHarness` for isolated runs against a temporary root, with fake
//!   document access and OCR
//! - Builders for pages, real PDF bytes and ZIP archives

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{RecordingProgress, TestHarness};
