//! Supported content encodings and the headers used to negotiate them.
//!
//! The supported set is a process-wide constant. Its order is stable and is
//! the order in which names appear in negotiation headers.

use hyper::header::{
    HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue, ACCEPT_ENCODING, CONTENT_ENCODING,
};
use serde::{Serialize, Serializer};

/// A content encoding this crate knows how to reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentEncoding {
    Gzip,
    /// Raw deflate, without the zlib wrapper.
    Deflate,
}

/// Every supported encoding, in negotiation order.
pub const SUPPORTED_ENCODINGS: [ContentEncoding; 2] =
    [ContentEncoding::Gzip, ContentEncoding::Deflate];

const SUPPORTED_NAMES: &[&str] = &["gzip", "deflate"];

impl ContentEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentEncoding::Gzip => "gzip",
            ContentEncoding::Deflate => "deflate",
        }
    }

    /// Looks up an encoding by name, ignoring surrounding whitespace and case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        SUPPORTED_ENCODINGS
            .into_iter()
            .find(|encoding| encoding.as_str().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for ContentEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names of the supported encodings: `["gzip", "deflate"]`.
pub fn supported_encodings() -> &'static [&'static str] {
    SUPPORTED_NAMES
}

/// Lower-cases and trims an encoding token.
pub fn normalize(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// Which side of the exchange a negotiation header is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderKind {
    /// Sent by a client: `Accept-Encoding`.
    Request,
    /// Sent by a server: `Content-Encoding`.
    Response,
}

impl HeaderKind {
    pub fn display_name(self) -> &'static str {
        match self {
            HeaderKind::Request => "Accept-Encoding",
            HeaderKind::Response => "Content-Encoding",
        }
    }

    pub fn header_name(self) -> HeaderName {
        match self {
            HeaderKind::Request => ACCEPT_ENCODING,
            HeaderKind::Response => CONTENT_ENCODING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum NegotiationValue {
    /// The whole list as one string, joined the way the list stringifies.
    Joined(String),
    /// One entry per encoding, for callers that emit separate header lines.
    Split(Vec<&'static str>),
}

/// A negotiation header, serialized as `{ "name": ..., "value": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiationHeader {
    #[serde(rename = "name", serialize_with = "serialize_kind_name")]
    pub kind: HeaderKind,
    pub value: NegotiationValue,
}

fn serialize_kind_name<S: Serializer>(kind: &HeaderKind, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(kind.display_name())
}

impl NegotiationHeader {
    /// The header name as written on the wire, e.g. `Accept-Encoding`.
    pub fn name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// Writes this header into `headers`. A split value becomes one header
    /// line per encoding; a joined value becomes a single line. Existing
    /// lines for the same header are kept.
    pub fn append_to(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        let name = self.kind.header_name();
        match &self.value {
            NegotiationValue::Joined(joined) => {
                headers.append(name, HeaderValue::from_str(joined)?);
            }
            NegotiationValue::Split(values) => {
                for value in values {
                    headers.append(name.clone(), HeaderValue::from_static(*value));
                }
            }
        }
        Ok(())
    }
}

/// Builds the header a client or server would send to advertise the
/// supported encodings.
pub fn negotiation_header(kind: HeaderKind, split_into_separate_values: bool) -> NegotiationHeader {
    let value = if split_into_separate_values {
        NegotiationValue::Split(SUPPORTED_NAMES.to_vec())
    } else {
        NegotiationValue::Joined(SUPPORTED_NAMES.join(","))
    };

    NegotiationHeader { kind, value }
}

pub fn accept_encoding_header(split_into_separate_values: bool) -> NegotiationHeader {
    negotiation_header(HeaderKind::Request, split_into_separate_values)
}

pub fn content_encoding_header(split_into_separate_values: bool) -> NegotiationHeader {
    negotiation_header(HeaderKind::Response, split_into_separate_values)
}
