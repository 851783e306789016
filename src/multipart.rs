//! `multipart/related` bodies as used by WADO-RS responses and STOW-RS requests

use base64::Engine;
use bytes::Bytes;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MultipartError {
    #[error("no boundary parameter in content type '{0}'")]
    NoBoundaryParameter(String),

    #[error("body does not contain the opening boundary delimiter")]
    MissingBoundary,

    #[error("body ended before the closing boundary delimiter")]
    UnexpectedEnd,

    #[error("malformed part header: {0}")]
    MalformedHeader(String),

    #[error("invalid base64 part body: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// One body part with its headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartPart {
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl MultipartPart {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

pub fn generate_boundary() -> String {
    format!("dicomweb_{}", uuid::Uuid::new_v4().simple())
}

/// Content-Type header value for a related body whose root parts have `part_type`
pub fn related_content_type(part_type: &str, boundary: &str) -> String {
    format!(
        "multipart/related; type=\"{}\"; boundary={}",
        part_type, boundary
    )
}

/// Lower-cased media type without parameters
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Extract the `boundary` parameter, quoted or not
pub fn boundary_from_content_type(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|b| !b.is_empty())
}

pub fn encode_related(boundary: &str, parts: &[MultipartPart]) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::new();
    for part in parts {
        buf.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        for (name, value) in &part.headers {
            buf.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&part.body);
        buf.extend_from_slice(b"\r\n");
    }
    buf.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    buf
}

/// Split a related body into its parts.
///
/// The preamble and epilogue are ignored, CRLF and bare LF line endings are
/// both accepted and base64 transfer-encoded parts are decoded.
pub fn decode_related(body: &[u8], boundary: &str) -> Result<Vec<MultipartPart>, MultipartError> {
    let delimiter = format!("--{}", boundary).into_bytes();
    let line_delimiter = [b"\n".as_slice(), delimiter.as_slice()].concat();

    let mut cursor = if body.starts_with(&delimiter) {
        0
    } else {
        find(body, &line_delimiter, 0).ok_or(MultipartError::MissingBoundary)? + 1
    };

    let mut parts = Vec::new();
    loop {
        let after_delimiter = cursor + delimiter.len();
        if body[after_delimiter..].starts_with(b"--") {
            return Ok(parts);
        }

        // Skip transport padding up to the end of the delimiter line
        let line_end = find(body, b"\n", after_delimiter).ok_or(MultipartError::UnexpectedEnd)?;
        let content_start = line_end + 1;

        let next = find(body, &line_delimiter, content_start).ok_or(MultipartError::UnexpectedEnd)?;
        let mut content_end = next;
        if content_end > content_start && body[content_end - 1] == b'\r' {
            content_end -= 1;
        }

        parts.push(parse_part(&body[content_start..content_end])?);
        cursor = next + 1;
    }
}

fn parse_part(content: &[u8]) -> Result<MultipartPart, MultipartError> {
    let (header_block, body) = split_headers(content);

    let mut headers: Vec<(String, String)> = Vec::new();
    for raw_line in header_block.split(|b| *b == b'\n') {
        let line = String::from_utf8_lossy(raw_line);
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            // Folded continuation of the previous header
            match headers.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(line.trim());
                    continue;
                }
                None => return Err(MultipartError::MalformedHeader(line.to_string())),
            }
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| MultipartError::MalformedHeader(line.to_string()))?;
        headers.push((name.trim().to_string(), value.trim().to_string()));
    }

    let mut part = MultipartPart {
        headers,
        body: Bytes::copy_from_slice(body),
    };

    let base64_encoded = part
        .header("content-transfer-encoding")
        .is_some_and(|enc| enc.eq_ignore_ascii_case("base64"));
    if base64_encoded {
        let compact: Vec<u8> = body
            .iter()
            .copied()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        part.body = Bytes::from(base64::engine::general_purpose::STANDARD.decode(compact)?);
    }

    Ok(part)
}

/// Split part content at the first empty line
fn split_headers(content: &[u8]) -> (&[u8], &[u8]) {
    // A part without headers starts directly with the empty line
    if let Some(rest) = content.strip_prefix(b"\r\n") {
        return (&[], rest);
    }
    if let Some(rest) = content.strip_prefix(b"\n") {
        return (&[], rest);
    }

    let crlf = find(content, b"\r\n\r\n", 0).map(|i| (i, 4));
    let lf = find(content, b"\n\n", 0).map(|i| (i, 2));
    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((idx, len)) => (&content[..idx], &content[idx + len..]),
        None => (content, &[]),
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() || needle.is_empty() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
