//! Integration tests for the weft engine
//!
//! Test categories:
//! - Engine: configuration, chunked rendering, host I/O
//! - Graph: memoization, fan-out, rate conversion, lifecycle
//! - Bus: routing between graphs, growth, registries
//!
//! Run with:
//! ```bash
//! cargo test -p weft --test integration_tests
//! ```

mod helpers;
mod integration;

pub use integration::*;
