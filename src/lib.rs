//! Sports-betting analytics core: event filtering, odds-movement aggregation
//! and the JSON view API over a periodically refreshed backend snapshot.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod mock;
pub mod pagination;
pub mod refresh;
pub mod state;
pub mod types;
