//! Process-wide configuration, loaded once and threaded through
//! constructors rather than read from globals (spec.md §9).
//!
//! Layering, lowest to highest precedence: compiled-in defaults, an
//! optional `Ferrostore.toml` in the working directory, then
//! `FERROSTORE_*` environment variables.

use crate::common::{Error, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

/// Directory test fixtures and the default disk manager write their
/// backing files into.
pub const FERROSTORE_DATA_DIR: &str = ".";

/// Default fixed page size in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of frames in the buffer pool.
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 16;

/// Default LRU-K lookback distance.
pub const DEFAULT_REPLACER_K: usize = 2;

/// The two replacer implementations spec.md §4.1 describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacerKind {
    Lru,
    LruK,
}

impl ReplacerKind {
    /// Parses a replacer name. Unrecognized names are a fatal
    /// configuration defect (spec.md §7 tier 3), not a recoverable error.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "LRUReplacer" => Ok(ReplacerKind::Lru),
            "LRUKReplacer" => Ok(ReplacerKind::LruK),
            other => Err(Error::UnknownReplacer(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Settings {
    page_size: usize,
    buffer_pool_size: usize,
    replacer: String,
    replacer_k: usize,
    data_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            page_size: DEFAULT_PAGE_SIZE,
            buffer_pool_size: DEFAULT_BUFFER_POOL_SIZE,
            replacer: "LRUKReplacer".to_string(),
            replacer_k: DEFAULT_REPLACER_K,
            data_dir: FERROSTORE_DATA_DIR.to_string(),
        }
    }
}

/// Fully resolved, process-wide configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub page_size: usize,
    pub buffer_pool_size: usize,
    pub replacer: ReplacerKind,
    pub replacer_k: usize,
    pub data_dir: String,
}

impl Config {
    /// Loads configuration from defaults, `Ferrostore.toml`, and
    /// `FERROSTORE_*` environment variables, in that order of precedence.
    pub fn load() -> Result<Self> {
        let defaults = Settings::default();
        let source = config::Config::builder()
            .set_default("page_size", defaults.page_size as i64)
            .unwrap()
            .set_default("buffer_pool_size", defaults.buffer_pool_size as i64)
            .unwrap()
            .set_default("replacer", defaults.replacer.clone())
            .unwrap()
            .set_default("replacer_k", defaults.replacer_k as i64)
            .unwrap()
            .set_default("data_dir", defaults.data_dir.clone())
            .unwrap()
            .add_source(config::File::with_name("Ferrostore").required(false))
            .add_source(config::Environment::with_prefix("FERROSTORE"))
            .build()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        let settings: Settings = source
            .try_deserialize()
            .map_err(|e| Error::InvalidInput(e.to_string()))?;

        Ok(Config {
            page_size: settings.page_size,
            buffer_pool_size: settings.buffer_pool_size,
            replacer: ReplacerKind::parse(&settings.replacer)?,
            replacer_k: settings.replacer_k,
            data_dir: settings.data_dir,
        })
    }

    /// A configuration with small, deterministic geometry, for tests.
    pub fn for_test(buffer_pool_size: usize, replacer_k: usize) -> Self {
        Config {
            page_size: DEFAULT_PAGE_SIZE,
            buffer_pool_size,
            replacer: ReplacerKind::LruK,
            replacer_k,
            data_dir: FERROSTORE_DATA_DIR.to_string(),
        }
    }
}

/// Lazily-loaded process-wide default, for call sites that have no
/// narrower configuration scope of their own (e.g. ad-hoc tooling).
/// Library code that owns an explicit `Config` should prefer threading it
/// through rather than reaching for this.
pub static DEFAULT_CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().unwrap_or_else(|_| Config::for_test(DEFAULT_BUFFER_POOL_SIZE, DEFAULT_REPLACER_K)));
