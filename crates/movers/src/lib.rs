#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/movers/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod prices;
pub mod ranker;
pub mod universe;

pub use error::{RankError, Result};
pub use prices::{PriceMatrix, PricePoint, PriceSeries};
pub use ranker::{DEFAULT_LIMIT, Ranking, ReturnRanker, ReturnRecord, rank_returns};
pub use universe::{Constituent, ConstituentDirectory, GicsSector};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
