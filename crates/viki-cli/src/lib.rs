//! `viki` command-line front end.
//!
//! Every orchestrator operation is reachable from here: detection, voice
//! ranking, text preparation and chunking, and full playback against a
//! console engine that prints each chunk instead of synthesising audio.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

// Only used by main.rs
use tracing_subscriber as _;

pub mod bootstrap;
pub mod commands;
pub mod console_engine;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::{CliConfig, CliContext, bootstrap, load_voices};
pub use commands::Commands;
pub use console_engine::ConsoleEngine;
pub use parser::Cli;
