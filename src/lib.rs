// THEORY:
// This file is the main entry point for the `photomosaic` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (the CLI runner and the HTTP
// server crates in this workspace).
//
// The primary goal is to export the `MosaicPipeline` and its associated data
// structures (`PipelineConfig`, `MosaicReport`, `MosaicError`) as the clean,
// high-level interface for the whole engine. The building blocks in
// `core_modules` stay public so that boundary layers can plug in their own
// tile storage and tests can exercise each stage on its own.

pub mod core_modules;
pub mod error;
pub mod logging;
pub mod parallel_pipeline;
pub mod pipeline;

pub use error::MosaicError;
pub use pipeline::{
    DirectoryTileStore, GridLayout, MemoryTileStore, MosaicPipeline, MosaicReport, PipelineConfig, TileIndex,
    TileStore,
};
