//! Integration test modules for weft
//!
//! - engine: Engine configuration and host-buffer rendering
//! - graph: Graph construction and rendering through units
//! - bus: Bus routing between graphs

pub mod bus;
pub mod engine;
pub mod graph;
