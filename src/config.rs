use std::env;

/// Default read chunk size, matching zlib's default stream chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Upper bound on the decoded size of a single stage. `None` means unbounded.
    pub max_output_bytes: Option<usize>,
    pub chunk_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl DecoderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unparseable values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            max_output_bytes: lookup("CONTENT_DECODING_MAX_OUTPUT")
                .and_then(|v| v.trim().parse().ok()),
            chunk_size: lookup("CONTENT_DECODING_CHUNK_SIZE")
                .and_then(|v| v.trim().parse().ok())
                .filter(|&size: &usize| size > 0)
                .unwrap_or(DEFAULT_CHUNK_SIZE),
        }
    }

    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = Some(max);
        self
    }
}
