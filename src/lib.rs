pub mod config;
pub mod decoder;
pub mod error;
pub mod infra;
pub mod registry;

pub use config::DecoderConfig;
pub use decoder::{
    decode_buffer, decode_response_body, BlockingDecodeService, ChainDecoder, DecodeResult,
    DecodeService, DecodeServiceExt,
};
pub use error::DecodeError;
pub use registry::{negotiation_header, supported_encodings, HeaderKind, NegotiationHeader};
