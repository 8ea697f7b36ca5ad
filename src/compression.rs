//! Zlib compression engine for stored objects
//!
//! Every object file on disk is a single zlib (RFC 1950) stream wrapping the
//! object's encoded bytes. The codec is type-agnostic: it only sees opaque
//! buffers, and `compress`/`decompress` are exact inverses for every input,
//! including the empty buffer.
//!
//! ## Compression Levels
//!
//! - **Fast**: lowest CPU cost, larger files
//! - **Default**: zlib's default level (the on-disk format does not depend on it)
//! - **Best**: smallest files, slowest writes
//!
//! ## Examples
//!
//! ```rust
//! use grove::compression::{CompressionEngine, CompressionLevel};
//!
//! let engine = CompressionEngine::new(CompressionLevel::Default);
//!
//! let data = b"blob 5\0hello";
//! let compressed = engine.compress(data).unwrap();
//! let decompressed = engine.decompress(&compressed).unwrap();
//! assert_eq!(decompressed, data);
//! ```

use crate::error::{GroveError, Result};
use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::trace;

/// How hard the encoder works
///
/// Any level produces a stream every other level can read; the choice only
/// trades write speed against file size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// Fastest compression
    Fast,
    /// zlib default (level 6)
    #[default]
    Default,
    /// Maximum compression
    Best,
}

impl CompressionLevel {
    fn to_flate2(self) -> Compression {
        match self {
            CompressionLevel::Fast => Compression::fast(),
            CompressionLevel::Default => Compression::default(),
            CompressionLevel::Best => Compression::best(),
        }
    }
}

/// Stateless zlib codec
#[derive(Debug, Clone, Copy, Default)]
pub struct CompressionEngine {
    level: CompressionLevel,
}

impl CompressionEngine {
    /// Create a new compression engine with the specified level
    pub fn new(level: CompressionLevel) -> Self {
        Self { level }
    }

    /// Level this engine compresses with
    pub fn level(&self) -> CompressionLevel {
        self.level
    }

    /// Compress `data` into a zlib stream
    ///
    /// # Errors
    ///
    /// - [`GroveError::Compression`] if the encoder fails
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2 + 16), self.level.to_flate2());
        encoder
            .write_all(data)
            .map_err(|e| GroveError::compression(e.to_string()))?;
        let compressed = encoder
            .finish()
            .map_err(|e| GroveError::compression(e.to_string()))?;

        trace!("Compressed {} -> {} bytes", data.len(), compressed.len());
        Ok(compressed)
    }

    /// Decompress a zlib stream
    ///
    /// # Errors
    ///
    /// - [`GroveError::CorruptStream`] if `data` is truncated, has a bad
    ///   header, or fails its checksum
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        // Input that runs out before the end-of-stream marker is an error
        let mut inflater = Decompress::new(true);
        let mut decompressed = Vec::with_capacity(data.len().saturating_mul(2).max(64));

        loop {
            if decompressed.len() == decompressed.capacity() {
                decompressed.reserve(decompressed.capacity());
            }
            let consumed = inflater.total_in() as usize;
            let status = inflater
                .decompress_vec(&data[consumed..], &mut decompressed, FlushDecompress::None)
                .map_err(|e| GroveError::corrupt_stream(e.to_string()))?;

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let input_exhausted = inflater.total_in() as usize == data.len();
                    if input_exhausted && decompressed.len() < decompressed.capacity() {
                        return Err(GroveError::corrupt_stream(format!(
                            "stream ended early after {} input bytes",
                            data.len()
                        )));
                    }
                }
            }
        }

        trace!("Decompressed {} -> {} bytes", data.len(), decompressed.len());
        Ok(decompressed)
    }
}
