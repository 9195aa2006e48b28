//! # arbi-node: serialized application of collection operations.
//!
//! - [`applier::Applier`]: single writer over the collection and its companion
//! - [`command`]: serializable command log and per-command outcomes
//! - [`config::NodeConfig`]: layered configuration (defaults, file, environment)

pub mod applier;
pub mod command;
pub mod config;
pub mod error;

pub use applier::{Applier, Market};
pub use command::{parse_log, Command, Outcome};
pub use config::NodeConfig;
pub use error::ApplyError;
