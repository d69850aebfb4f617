//! # logqa
//!
//! Ask natural-language questions about a log file and get answers grounded
//! in the file's own lines.
//!
//! The retrieval pipeline (chunking, vector store, sanitising, prompt
//! assembly, sessions) lives in [`logqa_core`]. This crate supplies the
//! pieces that touch the outside world: configuration, HTTP-backed
//! embedding and chat providers, the CLI commands, and the HTTP server.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌───────────────┐
//! │ log file │──▶│ split_logs   │──▶│ InMemoryStore │
//! └──────────┘   │ (chunk.rs)   │   │ embed + index │
//!                └──────────────┘   └──────┬────────┘
//!                                          │ nearest(top_k)
//!   question ─▶ Sanitizer ─▶ embed ────────┤
//!                                          ▼
//!                               grounded prompt ─▶ chat model ─▶ answer
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`embedding`] | OpenAI / Ollama / local embedding providers |
//! | [`completion`] | OpenAI / Ollama chat-completion providers |
//! | [`ingest`] | Session construction and log upload |
//! | [`progress`] | Upload progress and audit output on stderr |
//! | [`commands`] | `split`, `ask`, and `chat` command implementations |
//! | [`server`] | Password-protected HTTP API |

pub mod commands;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod ingest;
pub mod progress;
pub mod server;

pub use logqa_core;
