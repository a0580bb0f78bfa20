//! Commit analytics over git statistics datasets.
//!
//! Stages run in order: alias resolution and filtering ([`filter`]),
//! grouping ([`group`]), ranking ([`aggregate`]), zero-filled time series
//! ([`timeseries`]) and data-point capping ([`reduce`]). [`pipeline::Pipeline`]
//! chains them behind bounded memo caches.

pub mod aggregate;
pub mod alias;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod group;
pub mod model;
pub mod order;
pub mod output;
pub mod pipeline;
pub mod reduce;
pub mod timeseries;
pub mod util;

#[cfg(test)]
mod testutil;

pub use error::{LensError, Result};
pub use pipeline::{ChartRequest, DatasetContext, Pipeline, PipelineOutput};
