pub mod config;

pub use config::{Config, ReplacerKind, DEFAULT_CONFIG};
