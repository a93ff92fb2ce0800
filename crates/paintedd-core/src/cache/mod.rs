//! Offline cache for the gallery site.
//!
//! This module provides the `CacheManager`, which mirrors a service worker:
//! it pre-caches the app shell into a named generation on install, purges
//! every other generation on activation, then answers requests with one of
//! four strategies:
//!
//! - catalog data: network first, cached copy when offline
//! - page navigations: network first, cached page or offline page when offline
//! - images, scripts and the icon font host: stale-while-revalidate
//! - everything else: cache first
//!
//! Storage is pluggable through `CacheStorage` (`FileStorage` on disk,
//! `MemoryStorage` in process); the network through `Fetcher`.

pub mod error;
pub mod file;
pub mod manager;
pub mod policy;
pub mod request;
pub mod storage;

pub use error::CacheError;
pub use file::FileStorage;
pub use manager::{ActivationReport, CacheManager, Fetcher, LifecycleState, ResponseSource, Revalidation, Served};
pub use policy::{CachePolicy, RequestClass, Strategy};
pub use request::{Destination, Request, RequestMode, Response};
pub use storage::{CacheStorage, CachedData, MemoryStorage};
