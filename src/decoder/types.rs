use hyper::body::Bytes;

/// Outcome of a decode attempt.
///
/// When `decoded` is false, `bytes` is exactly the input that was handed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeResult {
    pub decoded: bool,
    pub bytes: Bytes,
}

impl DecodeResult {
    pub fn decoded(bytes: Bytes) -> Self {
        Self {
            decoded: true,
            bytes,
        }
    }

    pub fn unchanged(bytes: Bytes) -> Self {
        Self {
            decoded: false,
            bytes,
        }
    }
}
