pub mod chain;
pub mod headers;
pub mod service;
pub mod types;

pub use chain::{decode_buffer, decode_order, decode_response_body, ChainDecoder};
pub use headers::content_encoding;
pub use service::{BlockingDecodeService, DecodeFuture, DecodeService, DecodeServiceExt};
pub use types::DecodeResult;
