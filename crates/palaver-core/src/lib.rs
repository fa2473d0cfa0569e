//! Core types and trait definitions for the Palaver chatbot stores.
//!
//! This crate is deliberately free of database dependencies.
//! Storage backends (e.g. `palaver-store-sqlite`) depend on it; it depends
//! on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod meeting;
pub mod session;
pub mod store;
pub mod transcript;

pub use error::{Error, Result};
