//! Decode service abstraction layer.
//!
//! Decompression is CPU-bound, so the default service runs every decode on
//! tokio's blocking pool. Independent responses decode concurrently without
//! stalling the async workers.

use super::chain::ChainDecoder;
use super::headers::content_encoding;
use super::types::DecodeResult;
use crate::config::DecoderConfig;
use crate::error::DecodeError;
use http_body_util::BodyExt;
use hyper::body::{Body, Bytes};
use hyper::Response;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type DecodeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<DecodeResult, DecodeError>> + Send + 'a>>;

/// Trait for services that decode content-encoded buffers.
///
/// This abstraction allows for different execution strategies and makes
/// testing easier by allowing mock implementations.
pub trait DecodeService: Send + Sync {
    /// Removes a single `algorithm` layer from `input`.
    ///
    /// # Arguments
    ///
    /// * `algorithm` - The encoding name (e.g., "gzip", "deflate")
    /// * `input` - The potentially compressed data
    ///
    /// # Returns
    ///
    /// A future that resolves to the `DecodeResult` for that single stage.
    fn decode_buffer(&self, algorithm: String, input: Bytes) -> DecodeFuture<'_>;

    /// Decodes `body` against a raw `Content-Encoding` declaration.
    ///
    /// # Arguments
    ///
    /// * `declaration` - The content-encoding header value, if present
    /// * `body` - The response body exactly as received
    ///
    /// # Returns
    ///
    /// A future that resolves to the `DecodeResult` for the whole chain.
    fn decode_body(&self, declaration: Option<String>, body: Bytes) -> DecodeFuture<'_>;
}

/// Default decode service, backed by a shared [`ChainDecoder`].
#[derive(Default, Clone)]
pub struct BlockingDecodeService {
    decoder: Arc<ChainDecoder>,
}

impl BlockingDecodeService {
    pub fn new(decoder: ChainDecoder) -> Self {
        Self {
            decoder: Arc::new(decoder),
        }
    }

    pub fn from_config(config: DecoderConfig) -> Self {
        Self::new(ChainDecoder::new(config))
    }

    /// Creates a new `BlockingDecodeService` wrapped in an `Arc`.
    pub fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl DecodeService for BlockingDecodeService {
    fn decode_buffer(&self, algorithm: String, input: Bytes) -> DecodeFuture<'_> {
        let decoder = Arc::clone(&self.decoder);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || decoder.decode_buffer(&algorithm, input)).await?
        })
    }

    fn decode_body(&self, declaration: Option<String>, body: Bytes) -> DecodeFuture<'_> {
        let decoder = Arc::clone(&self.decoder);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                decoder.decode_response_body(declaration.as_deref(), body)
            })
            .await?
        })
    }
}

/// Extension trait for `DecodeService` that works on whole responses.
#[allow(async_fn_in_trait)]
pub trait DecodeServiceExt: DecodeService {
    /// Collects the body of `response` and decodes it per its
    /// `Content-Encoding` headers.
    ///
    /// # Arguments
    ///
    /// * `response` - A response whose body has not been read yet
    ///
    /// # Returns
    ///
    /// The same response with status and headers kept as received and the
    /// body replaced by its `DecodeResult`, or `DecodeError::Body` if the
    /// body could not be read.
    async fn decode_response<B>(
        &self,
        response: Response<B>,
    ) -> Result<Response<DecodeResult>, DecodeError>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| DecodeError::Body(e.to_string()))?
            .to_bytes();

        let declaration = content_encoding(&parts.headers);
        tracing::debug!(
            encoding = declaration.as_deref().unwrap_or("none"),
            size = body.len(),
            "Decoding response body"
        );

        let result = self.decode_body(declaration, body).await?;
        Ok(Response::from_parts(parts, result))
    }
}

// Implement DecodeServiceExt for all types that implement DecodeService
impl<T: DecodeService + ?Sized> DecodeServiceExt for T {}
