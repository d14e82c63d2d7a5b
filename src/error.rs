use thiserror::Error;

/// Errors surfaced to callers of the decoder.
///
/// A body that simply could not be decoded is not an error: it comes back as a
/// `DecodeResult` with `decoded == false`. These variants cover defects and
/// collaborator failures only.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The registry lists the encoding as supported but no codec handles it.
    #[error("Not implemented but marked as supported encoding: \"{encoding}\"")]
    UnwiredCodec { encoding: String },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Decode task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DecodeError {
    /// Short machine-readable code, in the same style as the proxy error codes.
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::UnwiredCodec { .. } => "UNWIRED_CODEC",
            DecodeError::Body(_) => "BODY_ERROR",
            DecodeError::Task(_) => "TASK_FAILED",
        }
    }
}
