//! Glue between the data sources, the ranker and the terminal.
//!
//! This module provides the concurrent price fetch pipeline and the quote
//! cache location used by the `movers` commands.

pub(crate) mod cache_manager;
pub(crate) mod data_pipeline;
