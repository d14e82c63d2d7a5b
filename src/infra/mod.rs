//! Infrastructure layer providing abstractions over the compression codecs.
//!
//! The chain decoder only talks to the `Decompressor` trait, so the codec
//! table can be swapped or trimmed without touching the decode logic.

pub mod decompressor;

pub use decompressor::{
    Codecs, DecompressError, DecompressResult, Decompressor, DeflateDecompressor,
    GzipDecompressor,
};
