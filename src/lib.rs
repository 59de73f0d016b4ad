//! Hub: a personal store of sources, files and ideas, kept current by a
//! reconciling sync engine.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`client`] - HTTP client for a running hub server
//! - [`config`] - Configuration and per-source push state
//! - [`error`] - Error types, exit codes and hints
//! - [`github`] - GitHub tree and blob fetching
//! - [`ideas`] - Ideas markdown parsing and generation
//! - [`model`] - Data types (Source, File, Idea, SyncLog, ApiKey)
//! - [`server`] - axum HTTP API
//! - [`storage`] - SQLite database layer
//! - [`sync`] - Diffing and apply for GitHub, local and ideas syncs

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod github;
pub mod ideas;
pub mod model;
pub mod server;
pub mod storage;
pub mod sync;
pub mod validate;

pub use error::{Error, Result};
