//! HTTP data client for the gallery's static JSON files.
//!
//! This module provides the `DataClient` for loading the global pricing
//! rules, the master artwork catalog, per-event inventories and the
//! events index. Every load goes through a small fixed-delay retry.
//!
//! `DataClient` also implements the cache layer's `Fetcher`, so the offline
//! cache manager talks to the network through the same connection pool.

pub mod client;
pub mod error;

pub use client::{DataClient, EventBundle};
pub use error::ApiError;
