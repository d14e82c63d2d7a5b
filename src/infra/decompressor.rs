//! Content decompression infrastructure.
//!
//! Provides trait-based abstractions over the flate2 codecs used for HTTP
//! response bodies: gzip and raw deflate.
//!
//! Decompression is sync-flush tolerant. A stream that ends before its final
//! block or trailer is treated as finished, instead of being rejected. For
//! gzip that also covers input cut off inside the header, including empty
//! input, as long as the bytes present are a prefix of a gzip header. Input
//! that does not start with the gzip magic is still rejected.

use crate::config::DecoderConfig;
use crate::registry::ContentEncoding;
use flate2::{Decompress, FlushDecompress, Status};
use std::io::{self, Read};
use thiserror::Error;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Size of a gzip header without optional fields.
const GZIP_HEADER_LEN: usize = 10;

/// Result of a decompression operation.
#[derive(Debug)]
pub struct DecompressResult {
    /// The decompressed data.
    pub data: Vec<u8>,
    /// Original compressed size.
    pub compressed_size: usize,
    /// Decompressed size.
    pub decompressed_size: usize,
    /// Whether the stream ended early and was accepted anyway.
    pub truncated: bool,
}

/// Why a codec rejected its input.
#[derive(Error, Debug)]
pub enum DecompressError {
    #[error("{encoding} decompression failed: {source}")]
    Corrupt {
        encoding: ContentEncoding,
        #[source]
        source: io::Error,
    },

    #[error("{encoding} output exceeds the {limit} byte limit")]
    OutputLimit {
        encoding: ContentEncoding,
        limit: usize,
    },
}

/// Trait for content decompression.
///
/// This abstraction allows for different decompression implementations
/// and lets the chain decoder run with a partial codec table in tests.
pub trait Decompressor: Send + Sync {
    /// The content-encoding this decompressor handles.
    fn encoding(&self) -> ContentEncoding;

    /// Decompresses the given data.
    ///
    /// # Arguments
    ///
    /// * `data` - The compressed data
    /// * `config` - Output limit and chunk size to decode with
    ///
    /// # Returns
    ///
    /// A `Result` containing `DecompressResult` on success, or a
    /// `DecompressError` if the data is not valid for this encoding.
    fn decompress(
        &self,
        data: &[u8],
        config: &DecoderConfig,
    ) -> Result<DecompressResult, DecompressError>;
}

/// Gzip decompressor implementation. Concatenated members decode as one body.
#[derive(Default)]
pub struct GzipDecompressor;

impl Decompressor for GzipDecompressor {
    fn encoding(&self) -> ContentEncoding {
        ContentEncoding::Gzip
    }

    fn decompress(
        &self,
        data: &[u8],
        config: &DecoderConfig,
    ) -> Result<DecompressResult, DecompressError> {
        let encoding = self.encoding();
        let mut decoder = flate2::read::MultiGzDecoder::new(data);
        let mut output = Output::new(encoding, config);
        let mut chunk = vec![0u8; config.chunk_size.max(1)];
        let mut truncated = false;

        loop {
            match decoder.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => output.push(&chunk[..n])?,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if is_truncated_gzip(&e, data, !output.is_empty()) => {
                    truncated = true;
                    break;
                }
                Err(source) => return Err(DecompressError::Corrupt { encoding, source }),
            }
        }

        Ok(output.finish(data.len(), truncated))
    }
}

/// Whether a gzip read error means the stream was cut short rather than
/// corrupt.
fn is_truncated_gzip(error: &io::Error, data: &[u8], produced_output: bool) -> bool {
    if produced_output {
        return error.kind() == io::ErrorKind::UnexpectedEof;
    }

    // Nothing decoded yet: only a cut-off gzip header counts.
    let magic_len = data.len().min(GZIP_MAGIC.len());
    data[..magic_len] == GZIP_MAGIC[..magic_len]
        && (error.kind() == io::ErrorKind::UnexpectedEof || data.len() < GZIP_HEADER_LEN)
}

/// Raw deflate decompressor implementation (no zlib header or checksum).
///
/// Inflates with sync flushes, so input that stops before the final block
/// yields everything decoded so far.
#[derive(Default)]
pub struct DeflateDecompressor;

impl Decompressor for DeflateDecompressor {
    fn encoding(&self) -> ContentEncoding {
        ContentEncoding::Deflate
    }

    fn decompress(
        &self,
        data: &[u8],
        config: &DecoderConfig,
    ) -> Result<DecompressResult, DecompressError> {
        let encoding = self.encoding();
        let mut inflater = Decompress::new(false);
        let mut output = Output::new(encoding, config);
        let mut chunk = vec![0u8; config.chunk_size.max(1)];

        let truncated = loop {
            let in_before = inflater.total_in();
            let out_before = inflater.total_out();
            let offset = in_before as usize;

            let status = inflater
                .decompress(&data[offset..], &mut chunk, FlushDecompress::Sync)
                .map_err(|e| DecompressError::Corrupt {
                    encoding,
                    source: io::Error::new(io::ErrorKind::InvalidData, e),
                })?;

            let consumed = (inflater.total_in() - in_before) as usize;
            let produced = (inflater.total_out() - out_before) as usize;
            output.push(&chunk[..produced])?;

            match status {
                Status::StreamEnd => break false,
                _ if consumed == 0 && produced == 0 => break true,
                _ => continue,
            }
        };

        Ok(output.finish(data.len(), truncated))
    }
}

/// Accumulates emitted chunks in order and enforces the output limit.
struct Output {
    encoding: ContentEncoding,
    limit: Option<usize>,
    data: Vec<u8>,
}

impl Output {
    fn new(encoding: ContentEncoding, config: &DecoderConfig) -> Self {
        Self {
            encoding,
            limit: config.max_output_bytes,
            data: Vec::new(),
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), DecompressError> {
        if let Some(limit) = self.limit {
            if self.data.len() + chunk.len() > limit {
                return Err(DecompressError::OutputLimit {
                    encoding: self.encoding,
                    limit,
                });
            }
        }
        self.data.extend_from_slice(chunk);
        Ok(())
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn finish(self, compressed_size: usize, truncated: bool) -> DecompressResult {
        if truncated {
            tracing::debug!(
                encoding = %self.encoding,
                decoded = self.data.len(),
                "Accepting truncated stream"
            );
        }
        DecompressResult {
            decompressed_size: self.data.len(),
            data: self.data,
            compressed_size,
            truncated,
        }
    }
}

/// The decompressors wired up for the chain decoder, keyed by encoding.
pub struct Codecs {
    decompressors: Vec<Box<dyn Decompressor>>,
}

impl Default for Codecs {
    fn default() -> Self {
        Self::empty()
            .with(GzipDecompressor)
            .with(DeflateDecompressor)
    }
}

impl Codecs {
    /// Creates a table holding a codec for every supported encoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table with no codecs at all.
    pub fn empty() -> Self {
        Self {
            decompressors: Vec::new(),
        }
    }

    /// Adds a codec, replacing any existing one for the same encoding.
    pub fn with<D: Decompressor + 'static>(mut self, decompressor: D) -> Self {
        let encoding = decompressor.encoding();
        self.decompressors.retain(|d| d.encoding() != encoding);
        self.decompressors.push(Box::new(decompressor));
        self
    }

    pub fn get(&self, encoding: ContentEncoding) -> Option<&dyn Decompressor> {
        self.decompressors
            .iter()
            .find(|d| d.encoding() == encoding)
            .map(|d| d.as_ref())
    }
}
