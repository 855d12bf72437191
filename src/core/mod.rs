//! Core client types: the cache store, the sync engine, and the public handle.

mod builder;
mod cache;
mod client;
mod engine;

pub use builder::ConfClientBuilder;
pub use cache::{CacheEntry, CacheStore, WriteReason};
pub use client::ConfClient;
