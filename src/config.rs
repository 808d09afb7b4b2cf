//! Client configuration
//!
//! Tunables for client initialization. All fields have defaults, so
//! `Config::default()` is a working configuration.

use serde::{Deserialize, Serialize};

/// Number of documents mirrored to the search index per batch during backfill
const DEFAULT_BACKFILL_CHUNK_SIZE: usize = 50;

/// Client tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Batch size used when backfilling the search index at initialization
    #[serde(default = "default_backfill_chunk_size")]
    pub backfill_chunk_size: usize,
}

fn default_backfill_chunk_size() -> usize {
    DEFAULT_BACKFILL_CHUNK_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backfill_chunk_size: DEFAULT_BACKFILL_CHUNK_SIZE,
        }
    }
}
