//! Threadlink - reconcile intake forum threads with task-store entries
//!
//! This library provides the core functionality for Threadlink, including:
//! - Thread → task resolution over the mapping table and external lookups
//! - The four-pillar quality gate for new submissions
//! - The operator-curated mapping table (CSV) and its bulk populator
//! - Processed-thread state kept in SQLite
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use threadlink::cli::run;
//!
//! fn main() {
//!     if let Err(e) = run() {
//!         eprintln!("Error: {}", e);
//!         std::process::exit(1);
//!     }
//! }
//! ```

pub mod cli;
pub mod config;
pub mod db;
pub mod gate;
pub mod intake;
pub mod lookup;
pub mod models;
pub mod populate;
pub mod repo;
pub mod resolver;
pub mod utils;
