//! Reading the encoding declaration out of a response's headers.

use super::chain::ChainDecoder;
use super::types::DecodeResult;
use crate::error::DecodeError;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, CONTENT_ENCODING};

/// Returns the `Content-Encoding` declaration, or `None` if the header is
/// absent.
///
/// Repeated header lines are joined with `", "` in the order received, so
/// they decode the same as one comma-separated line. Lines that are not
/// visible ASCII are skipped.
pub fn content_encoding(headers: &HeaderMap) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .filter_map(|value| match value.to_str() {
            Ok(s) => Some(s),
            Err(_) => {
                tracing::debug!("Ignoring non-ASCII Content-Encoding value");
                None
            }
        })
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

impl ChainDecoder {
    /// Decodes `body` according to the `Content-Encoding` lines in `headers`.
    ///
    /// `body` must be the raw bytes as received, never text-decoded.
    pub fn decode_with_headers(
        &self,
        headers: &HeaderMap,
        body: Bytes,
    ) -> Result<DecodeResult, DecodeError> {
        let declaration = content_encoding(headers);
        self.decode_response_body(declaration.as_deref(), body)
    }
}
