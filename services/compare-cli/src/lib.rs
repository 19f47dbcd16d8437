//! Library half of the comparison CLI, shared with its integration tests.

pub mod compare;
pub mod output;

pub use compare::{run, CompareOptions, CompareSummary, SlotSummary};
