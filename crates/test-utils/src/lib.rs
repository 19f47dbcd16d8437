//! Shared test utilities for the night-light viewer workspace.
//!
//! This crate provides common testing infrastructure including:
//! - GeoTIFF payload builders
//! - Radiance-like grid generators
//! - Canned admin-area features and date lists
//! - An in-process HTTP backend serving those fixtures
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod backend;
pub mod fixtures;
pub mod generators;
pub mod geotiff;

pub use backend::*;
pub use fixtures::*;
pub use generators::*;
pub use geotiff::*;
