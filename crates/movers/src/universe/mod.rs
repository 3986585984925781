//! Universe management for the movers ranker.
//!
//! This module provides the constituent directory for the tracked index
//! and the GICS sector classifications used to group it.

pub mod directory;
pub mod gics;

pub use directory::{Constituent, ConstituentDirectory, normalize_symbol};
pub use gics::GicsSector;
