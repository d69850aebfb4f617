//! # logqa core
//!
//! Retrieval pipeline for asking questions about a log file: line-boundary
//! chunking, embedding-backed similarity search, prompt-injection
//! sanitising, grounded prompt assembly, and the session object that ties
//! them together.
//!
//! This crate contains no tokio runtime, HTTP client, or filesystem I/O.
//! External models are reached through the [`embedding::EmbeddingProvider`]
//! and [`completion::CompletionProvider`] traits, implemented by the `logqa`
//! app crate for real services and by stubs in tests.

pub mod answer;
pub mod chunk;
pub mod completion;
pub mod embedding;
pub mod error;
pub mod models;
pub mod sanitize;
pub mod session;
pub mod store;

pub use error::{Error, Result};
