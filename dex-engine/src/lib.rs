pub mod abi;
pub mod config;
pub mod contracts;
pub mod feeds;
pub mod liquidity;
pub mod metrics;
pub mod operations;
pub mod prediction;
pub mod prefs;
pub mod quote_cache;
pub mod rpc;
pub mod runner;
pub mod schedule;
pub mod stats;
pub mod view;
pub mod wallet;
pub mod watcher;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::*;
pub use contracts::*;
pub use liquidity::*;
pub use metrics::*;
pub use operations::*;
pub use prediction::*;
pub use prefs::*;
pub use runner::*;
pub use schedule::*;
pub use view::*;
pub use wallet::*;
pub use watcher::*;
