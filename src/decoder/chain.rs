//! Chained Content-Encoding decoding.
//!
//! A declaration lists encodings in the order they were applied, so decoding
//! walks it right to left. Every stage either strips one layer or leaves the
//! buffer as it was; a body only counts as decoded when at least one stage
//! actually stripped something.

use super::types::DecodeResult;
use crate::config::DecoderConfig;
use crate::error::DecodeError;
use crate::infra::Codecs;
use crate::registry::{normalize, ContentEncoding};
use hyper::body::Bytes;

/// Decodes buffers through the wired codec table.
#[derive(Default)]
pub struct ChainDecoder {
    codecs: Codecs,
    config: DecoderConfig,
}

impl ChainDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self::with_codecs(Codecs::new(), config)
    }

    pub fn with_codecs(codecs: Codecs, config: DecoderConfig) -> Self {
        Self { codecs, config }
    }

    /// Removes a single `algorithm` layer from `input`.
    ///
    /// Unsupported names and inputs the codec rejects both come back
    /// unchanged with `decoded == false`. The only error is a supported
    /// encoding with no codec behind it.
    pub fn decode_buffer(&self, algorithm: &str, input: Bytes) -> Result<DecodeResult, DecodeError> {
        let name = normalize(algorithm);
        let Some(encoding) = ContentEncoding::from_name(&name) else {
            tracing::debug!(encoding = %name, "Skipping unsupported encoding");
            return Ok(DecodeResult::unchanged(input));
        };

        let Some(codec) = self.codecs.get(encoding) else {
            tracing::warn!(encoding = %encoding, "Supported encoding has no codec");
            return Err(DecodeError::UnwiredCodec { encoding: name });
        };

        match codec.decompress(&input, &self.config) {
            Ok(result) => {
                tracing::debug!(
                    encoding = %encoding,
                    compressed = result.compressed_size,
                    decompressed = result.decompressed_size,
                    "Decoded stage"
                );
                Ok(DecodeResult::decoded(Bytes::from(result.data)))
            }
            Err(e) => {
                tracing::debug!(error = %e, "Stage left unchanged");
                Ok(DecodeResult::unchanged(input))
            }
        }
    }

    /// Decodes a response body according to its `Content-Encoding` value.
    ///
    /// A missing or blank declaration leaves the body untouched.
    pub fn decode_response_body(
        &self,
        declaration: Option<&str>,
        body: Bytes,
    ) -> Result<DecodeResult, DecodeError> {
        let declaration = match declaration.map(str::trim) {
            Some(d) if !d.is_empty() => d,
            _ => return Ok(DecodeResult::unchanged(body)),
        };

        // Typical single round of compression.
        if is_single_encoding(declaration) {
            return self.decode_buffer(declaration, body);
        }

        self.decode_chain(decode_order(declaration), body)
    }

    /// Folds `stages`, already in decode order, over `body`.
    ///
    /// Each stage's output feeds the next whether or not that stage decoded.
    /// If no stage decoded, the original body is returned.
    pub fn decode_chain<'a, I>(&self, stages: I, body: Bytes) -> Result<DecodeResult, DecodeError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut current = body.clone();
        let mut decoded_stages = 0usize;

        for stage in stages {
            let result = self.decode_buffer(stage, current)?;
            if result.decoded {
                decoded_stages += 1;
            }
            current = result.bytes;
        }

        tracing::debug!(decoded_stages, size = current.len(), "Decode chain finished");

        if decoded_stages > 0 {
            Ok(DecodeResult::decoded(current))
        } else {
            Ok(DecodeResult::unchanged(body))
        }
    }
}

/// Splits a declaration into its stages in decode order: the applied order
/// reversed, each token trimmed. Empty tokens are kept and act as no-ops.
pub fn decode_order(declaration: &str) -> Vec<&str> {
    declaration.split(',').rev().map(str::trim).collect()
}

fn is_single_encoding(declaration: &str) -> bool {
    !declaration.contains(',') && ContentEncoding::from_name(declaration).is_some()
}

/// Removes a single `algorithm` layer using the default codecs and config.
///
/// # Arguments
///
/// * `algorithm` - The encoding name (e.g., "gzip", "deflate"), matched
///   case-insensitively
/// * `input` - The potentially compressed data
///
/// # Returns
///
/// A `Result` containing the `DecodeResult`. Unsupported names and invalid
/// input come back unchanged with `decoded == false`; the error case is a
/// supported encoding without a codec.
pub fn decode_buffer(algorithm: &str, input: impl Into<Bytes>) -> Result<DecodeResult, DecodeError> {
    ChainDecoder::default().decode_buffer(algorithm, input.into())
}

/// Decodes a body against its `Content-Encoding` value using the default
/// codecs and config.
///
/// # Arguments
///
/// * `declaration` - The raw content-encoding header value, if any
/// * `body` - The response body exactly as received
///
/// # Returns
///
/// A `Result` containing the `DecodeResult`. `decoded` is true when at least
/// one declared stage was removed.
pub fn decode_response_body(
    declaration: Option<&str>,
    body: impl Into<Bytes>,
) -> Result<DecodeResult, DecodeError> {
    ChainDecoder::default().decode_response_body(declaration, body.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::GzipDecompressor;
    use std::io::Write;

    const PREFIX: &str = "<script src=/ping.js>";

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// A page of exactly `len` bytes starting with the ping script tag.
    fn ping_page(len: usize) -> Vec<u8> {
        let mut page = PREFIX.as_bytes().to_vec();
        let filler = b"<p>keep-alive ping</p>\n";
        while page.len() < len {
            page.push(filler[page.len() % filler.len()]);
        }
        page.truncate(len);
        page
    }

    fn decode(declaration: &str, body: Vec<u8>) -> DecodeResult {
        decode_response_body(Some(declaration), body).unwrap()
    }

    fn assert_ping_page(result: &DecodeResult, len: usize) {
        assert!(result.decoded);
        assert_eq!(result.bytes.len(), len);
        assert!(result.bytes.starts_with(PREFIX.as_bytes()));
    }

    #[test]
    fn test_decode_order_reverses_and_trims() {
        assert_eq!(decode_order("gzip"), vec!["gzip"]);
        assert_eq!(decode_order("gzip, deflate"), vec!["deflate", "gzip"]);
        assert_eq!(decode_order("deflate , "), vec!["", "deflate"]);
        assert_eq!(
            decode_order(" deflate,identity ,\tgzip"),
            vec!["gzip", "identity", "deflate"]
        );
    }

    #[test]
    fn test_unsupported_algorithm_passthrough() {
        let input = b"\x1f\x8b not really anything".to_vec();
        for name in ["br", "identity", "compress", "", "  zstd  "] {
            let result = decode_buffer(name, input.clone()).unwrap();
            assert!(!result.decoded, "{name} should not decode");
            assert_eq!(result.bytes, input);
        }
    }

    #[test]
    fn test_round_trip_single_stage() {
        let page = ping_page(175);

        let result = decode_buffer("gzip", gzip(&page)).unwrap();
        assert_eq!(result, DecodeResult::decoded(Bytes::from(page.clone())));

        let result = decode_buffer(" DEFLATE ", deflate(&page)).unwrap();
        assert_eq!(result, DecodeResult::decoded(Bytes::from(page)));
    }

    #[test]
    fn test_codec_failure_returns_original_input() {
        let input = b"plain text, never compressed".to_vec();
        let result = decode_buffer("gzip", input.clone()).unwrap();
        assert!(!result.decoded);
        assert_eq!(result.bytes, input);
    }

    #[test]
    fn test_chain_order() {
        let page = ping_page(195);
        // Applied gzip first, then deflate.
        let body = deflate(&gzip(&page));
        assert_ping_page(&decode("gzip, deflate", body), 195);
    }

    #[test]
    fn test_decode_chain_with_explicit_stages() {
        let page = ping_page(64);
        let body = Bytes::from(gzip(&deflate(&page)));
        let decoder = ChainDecoder::default();

        let result = decoder.decode_chain(["gzip", "deflate"], body.clone()).unwrap();
        assert_eq!(result.bytes, page);

        // Wrong order: deflate cannot read the gzip wrapper, gzip then strips
        // its layer and leaves the deflate stream behind.
        let result = decoder.decode_chain(["deflate", "gzip"], body).unwrap();
        assert!(result.decoded);
        assert_eq!(result.bytes, deflate(&page));
    }

    #[test]
    fn test_whitespace_tolerance() {
        let page = ping_page(175);
        let padded = decode("                                             gzip", gzip(&page));
        let plain = decode("gzip", gzip(&page));
        assert_eq!(padded, plain);
        assert_ping_page(&padded, 175);
    }

    #[test]
    fn test_trailing_comma_tolerance() {
        let page = ping_page(181);
        assert_ping_page(&decode("deflate , ", deflate(&page)), 181);
    }

    #[test]
    fn test_mixed_known_and_unknown_tokens() {
        let page = ping_page(195);
        let body = gzip(&deflate(&page));
        assert_ping_page(&decode("deflate, identity, gzip", body), 195);
    }

    #[test]
    fn test_empty_or_absent_declaration() {
        let body = gzip(b"payload");
        for declaration in [None, Some(""), Some("   "), Some("\t\n")] {
            let result = decode_response_body(declaration, body.clone()).unwrap();
            assert!(!result.decoded);
            assert_eq!(result.bytes, body);
        }
    }

    #[test]
    fn test_all_stages_unsupported() {
        let body = gzip(b"payload");
        for declaration in ["br", "identity", "br, identity", " , "] {
            let result = decode(declaration, body.clone());
            assert!(!result.decoded, "{declaration:?} should not decode");
            assert_eq!(result.bytes, body);
        }
    }

    #[test]
    fn test_all_stages_failing_returns_original_body() {
        let body = b"plain text, never compressed".to_vec();
        let result = decode("gzip, gzip", body.clone());
        assert!(!result.decoded);
        assert_eq!(result.bytes, body);
    }

    #[test]
    fn test_any_decoded_stage_marks_result_decoded() {
        let page = ping_page(100);
        // Declared twice but only compressed once; the second gzip stage fails.
        let result = decode("gzip, gzip", gzip(&page));
        assert!(result.decoded);
        assert_eq!(result.bytes, page);
    }

    #[test]
    fn test_fixture_lengths() {
        let page = ping_page(175);
        assert_ping_page(&decode("gzip", gzip(&page)), 175);

        let page = ping_page(189);
        assert_ping_page(&decode("gzip, gzip", gzip(&gzip(&page))), 189);

        let page = ping_page(201);
        let body = deflate(&deflate(&page));
        assert_ping_page(&decode("deflate, deflate", body.clone()), 201);
        assert_ping_page(&decode("deflate , deflate", body), 201);

        let page = ping_page(205);
        let body = gzip(&deflate(&gzip(&page)));
        assert_ping_page(&decode("gzip, deflate, gzip", body), 205);
    }

    #[test]
    fn test_truncated_gzip_body_still_decodes() {
        let page = ping_page(175);
        let compressed = gzip(&page);

        let without_trailer = compressed[..compressed.len() - 8].to_vec();
        let result = decode_response_body(Some("gzip"), without_trailer).unwrap();
        assert!(result.decoded);
        assert_eq!(result.bytes, page);
    }

    #[test]
    fn test_empty_body_decodes_for_both_codecs() {
        for declaration in ["gzip", "deflate"] {
            let result = decode_response_body(Some(declaration), Vec::new()).unwrap();
            assert!(result.decoded, "{declaration} should accept an empty body");
            assert!(result.bytes.is_empty());
        }

        let result = decode_buffer("gzip", vec![0x1f, 0x8b]).unwrap();
        assert!(result.decoded);
        assert!(result.bytes.is_empty());
    }

    #[test]
    fn test_case_insensitive_declaration() {
        let page = ping_page(120);
        assert_ping_page(&decode("GZIP", gzip(&page)), 120);
        assert_ping_page(&decode("Gzip, DEFLATE", deflate(&gzip(&page))), 120);
    }

    #[test]
    fn test_unwired_codec_is_an_error() {
        let decoder = ChainDecoder::with_codecs(
            Codecs::empty().with(GzipDecompressor),
            DecoderConfig::default(),
        );

        let err = decoder
            .decode_buffer("Deflate", Bytes::from_static(b"data"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnwiredCodec { ref encoding } if encoding == "deflate"));

        let err = decoder
            .decode_response_body(Some("gzip, deflate"), Bytes::from_static(b"data"))
            .unwrap_err();
        assert_eq!(err.code(), "UNWIRED_CODEC");

        // Unsupported names never reach the codec table.
        let result = decoder
            .decode_buffer("br", Bytes::from_static(b"data"))
            .unwrap();
        assert!(!result.decoded);

        let page = ping_page(50);
        let result = decoder
            .decode_buffer("gzip", Bytes::from(gzip(&page)))
            .unwrap();
        assert_eq!(result.bytes, page);
    }

    #[test]
    fn test_output_limit_leaves_stage_unchanged() {
        let decoder = ChainDecoder::new(DecoderConfig::default().with_max_output_bytes(16));
        let body = Bytes::from(gzip(&ping_page(175)));

        let result = decoder.decode_response_body(Some("gzip"), body.clone()).unwrap();
        assert!(!result.decoded);
        assert_eq!(result.bytes, body);
    }
}
