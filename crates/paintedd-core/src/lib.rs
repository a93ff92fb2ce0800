//! Core library for the Paintedd gallery: offline cache, catalog hydration
//! and pricing, the cart session, checkout links and the progressive reveal.

pub mod api;
pub mod cache;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod device;
pub mod models;
pub mod reveal;
pub mod session;
pub mod utils;

pub use config::Config;
