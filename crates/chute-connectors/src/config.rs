//! Engine defaults from environment variables.

use chute_core::error::TransferError;

use crate::export::DEFAULT_EXPORT_BATCH_SIZE;
use crate::flatfile::DEFAULT_PREVIEW_ROWS;
use crate::import::DEFAULT_IMPORT_BATCH_SIZE;

/// Batch-size and preview defaults applied when a request omits them.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub export_batch_size: usize,
    pub import_batch_size: usize,
    pub preview_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            export_batch_size: DEFAULT_EXPORT_BATCH_SIZE,
            import_batch_size: DEFAULT_IMPORT_BATCH_SIZE,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, TransferError> {
        Ok(Self {
            export_batch_size: read_usize("CHUTE_EXPORT_BATCH_SIZE", DEFAULT_EXPORT_BATCH_SIZE)?,
            import_batch_size: read_usize("CHUTE_IMPORT_BATCH_SIZE", DEFAULT_IMPORT_BATCH_SIZE)?,
            preview_rows: read_usize("CHUTE_PREVIEW_ROWS", DEFAULT_PREVIEW_ROWS)?,
        })
    }
}

fn read_usize(key: &str, default: usize) -> Result<usize, TransferError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| TransferError::Config(format!("invalid {}: '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}
