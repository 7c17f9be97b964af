// SPDX-License-Identifier: GPL-3.0-only

//! Incremental parser for `multipart/x-mixed-replace` MJPEG feeds
//!
//! Each part of the stream looks like:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! [Content-Length: N\r\n]
//! \r\n
//! <jpeg bytes>\r\n
//! ```
//!
//! Chunks arrive at arbitrary boundaries, so the parser buffers until a
//! whole part is available. `Content-Length` is used when present; otherwise
//! the part ends at the next delimiter.

use crate::constants::{DEFAULT_MULTIPART_BOUNDARY, MAX_PART_SIZE};
use crate::errors::StreamError;
use async_stream::try_stream;
use bytes::{Buf, Bytes, BytesMut};
use futures::Stream;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Extract the boundary from a `Content-Type` header value
pub fn boundary_from_content_type(content_type: &str) -> Result<String, StreamError> {
    let mut params = content_type.split(';').map(str::trim);
    let mime = params.next().unwrap_or_default();
    if !mime.to_ascii_lowercase().starts_with("multipart/") {
        return Err(StreamError::NotMultipart(content_type.to_string()));
    }

    let boundary = params
        .filter_map(|param| param.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_MULTIPART_BOUNDARY.to_string());

    Ok(boundary)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    /// Looking for the next delimiter line
    Delimiter,
    /// Delimiter consumed, waiting for the blank line ending the headers
    Headers,
    /// Inside a part body
    Body { content_length: Option<usize> },
    /// Closing delimiter seen
    Closed,
}

#[derive(Debug)]
pub struct MultipartParser {
    /// "--" + boundary
    delimiter: Vec<u8>,
    /// "\r\n--" + boundary, terminates a body without Content-Length
    body_terminator: Vec<u8>,
    buffer: BytesMut,
    state: ParseState,
}

impl MultipartParser {
    pub fn new(boundary: &str) -> Self {
        // Some servers announce the boundary with its leading dashes
        let delimiter = if boundary.starts_with("--") {
            boundary.as_bytes().to_vec()
        } else {
            format!("--{}", boundary).into_bytes()
        };
        let mut body_terminator = CRLF.to_vec();
        body_terminator.extend_from_slice(&delimiter);

        Self {
            delimiter,
            body_terminator,
            buffer: BytesMut::new(),
            state: ParseState::Delimiter,
        }
    }

    /// Append a chunk received from the network
    pub fn push(&mut self, chunk: &[u8]) {
        if self.state != ParseState::Closed {
            self.buffer.extend_from_slice(chunk);
        }
    }

    /// True once the closing delimiter (`--boundary--`) was seen
    pub fn is_closed(&self) -> bool {
        self.state == ParseState::Closed
    }

    /// Bytes held back waiting for more input
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Next complete part body, if one is buffered
    pub fn next_part(&mut self) -> Result<Option<Bytes>, StreamError> {
        loop {
            match self.state {
                ParseState::Closed => return Ok(None),
                ParseState::Delimiter => {
                    let Some(pos) = find(&self.buffer, &self.delimiter) else {
                        // Keep a tail that could be the start of a split delimiter
                        let keep = self.delimiter.len().saturating_sub(1);
                        if self.buffer.len() > keep {
                            let discard = self.buffer.len() - keep;
                            self.buffer.advance(discard);
                        }
                        return Ok(None);
                    };
                    let after = pos + self.delimiter.len();
                    if self.buffer.len() < after + 2 {
                        return Ok(None);
                    }
                    if &self.buffer[after..after + 2] == b"--" {
                        debug!("Closing multipart delimiter received");
                        self.buffer.clear();
                        self.state = ParseState::Closed;
                        return Ok(None);
                    }
                    self.buffer.advance(after);
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    // The rest of the delimiter line reads as an empty first header line
                    let Some(pos) = find(&self.buffer, HEADER_END) else {
                        self.check_size()?;
                        return Ok(None);
                    };
                    let headers = String::from_utf8_lossy(&self.buffer[..pos]).into_owned();
                    self.buffer.advance(pos + HEADER_END.len());
                    self.state = ParseState::Body {
                        content_length: parse_content_length(&headers),
                    };
                }
                ParseState::Body {
                    content_length: Some(len),
                } => {
                    if len > MAX_PART_SIZE {
                        return Err(StreamError::Decode(format!(
                            "part of {} bytes exceeds limit",
                            len
                        )));
                    }
                    if self.buffer.len() < len {
                        return Ok(None);
                    }
                    let part = self.buffer.split_to(len).freeze();
                    self.state = ParseState::Delimiter;
                    return Ok(Some(part));
                }
                ParseState::Body {
                    content_length: None,
                } => {
                    let Some(pos) = find(&self.buffer, &self.body_terminator) else {
                        self.check_size()?;
                        return Ok(None);
                    };
                    let part = self.buffer.split_to(pos).freeze();
                    // Leave the delimiter itself in the buffer
                    self.buffer.advance(CRLF.len());
                    self.state = ParseState::Delimiter;
                    return Ok(Some(part));
                }
            }
        }
    }

    fn check_size(&self) -> Result<(), StreamError> {
        if self.buffer.len() > MAX_PART_SIZE {
            return Err(StreamError::Decode(format!(
                "no part boundary within {} bytes",
                MAX_PART_SIZE
            )));
        }
        Ok(())
    }
}

fn parse_content_length(headers: &str) -> Option<usize> {
    headers.split("\r\n").find_map(|line| {
        let (name, value) = line.split_once(':')?;
        if name.trim().eq_ignore_ascii_case("content-length") {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Open `url` and yield the raw body of every part
///
/// Ends with `Ok` when the server closes the stream; any transport, status
/// or framing problem is yielded as an error.
pub fn multipart_parts(
    client: reqwest::Client,
    url: String,
) -> impl Stream<Item = Result<Bytes, StreamError>> {
    try_stream! {
        let mut response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            Err::<(), _>(StreamError::Status(status.as_u16()))?;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let boundary = boundary_from_content_type(&content_type)?;
        debug!(url = %url, boundary = %boundary, "Connected to MJPEG feed");

        let mut parser = MultipartParser::new(&boundary);
        while let Some(chunk) = response.chunk().await? {
            parser.push(&chunk);
            while let Some(part) = parser.next_part()? {
                yield part;
            }
            if parser.is_closed() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(body: &[u8], with_length: bool) -> Vec<u8> {
        let mut out = b"--frame\r\nContent-Type: image/jpeg\r\n".to_vec();
        if with_length {
            out.extend_from_slice(format!("Content-Length: {}\r\n", body.len()).as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(body);
        out.extend_from_slice(b"\r\n");
        out
    }

    fn drain(parser: &mut MultipartParser) -> Vec<Bytes> {
        let mut parts = Vec::new();
        while let Some(part) = parser.next_part().unwrap() {
            parts.push(part);
        }
        parts
    }

    #[test]
    fn test_boundary_from_content_type() {
        assert_eq!(
            boundary_from_content_type("multipart/x-mixed-replace; boundary=frame").unwrap(),
            "frame"
        );
        assert_eq!(
            boundary_from_content_type("multipart/x-mixed-replace;boundary=\"abc\"").unwrap(),
            "abc"
        );
        assert_eq!(
            boundary_from_content_type("multipart/x-mixed-replace").unwrap(),
            "frame"
        );
        assert!(matches!(
            boundary_from_content_type("image/jpeg"),
            Err(StreamError::NotMultipart(_))
        ));
    }

    #[test]
    fn test_parts_without_content_length() {
        let mut stream = part(b"first", false);
        stream.extend(part(b"second", false));
        // Third part only becomes complete once the next delimiter arrives
        stream.extend(part(b"third", false));

        let mut parser = MultipartParser::new("frame");
        parser.push(&stream);
        let parts = drain(&mut parser);
        assert_eq!(parts, vec![Bytes::from("first"), Bytes::from("second")]);

        parser.push(b"--frame\r\n");
        assert_eq!(drain(&mut parser), vec![Bytes::from("third")]);
    }

    #[test]
    fn test_parts_with_content_length_may_contain_delimiter() {
        let body = b"xx\r\n--frame\r\nyy";
        let stream = part(body, true);

        let mut parser = MultipartParser::new("frame");
        parser.push(&stream);
        assert_eq!(drain(&mut parser), vec![Bytes::copy_from_slice(body)]);
    }

    #[test]
    fn test_byte_by_byte_delivery() {
        let mut stream = b"preamble junk\r\n".to_vec();
        stream.extend(part(b"\xff\xd8jpeg\xff\xd9", true));
        stream.extend(part(b"\xff\xd8next\xff\xd9", false));
        stream.extend_from_slice(b"--frame\r\n");

        let mut parser = MultipartParser::new("frame");
        let mut parts = Vec::new();
        for byte in &stream {
            parser.push(std::slice::from_ref(byte));
            parts.extend(drain(&mut parser));
        }
        assert_eq!(
            parts,
            vec![
                Bytes::from_static(b"\xff\xd8jpeg\xff\xd9"),
                Bytes::from_static(b"\xff\xd8next\xff\xd9"),
            ]
        );
    }

    #[test]
    fn test_closing_delimiter() {
        let mut stream = part(b"only", true);
        stream.extend_from_slice(b"--frame--\r\n");

        let mut parser = MultipartParser::new("frame");
        parser.push(&stream);
        assert_eq!(drain(&mut parser), vec![Bytes::from("only")]);
        assert!(parser.is_closed());
    }

    #[test]
    fn test_boundary_with_leading_dashes() {
        let stream = b"--myboundary\r\n\r\nabc\r\n--myboundary\r\n".to_vec();
        let mut parser = MultipartParser::new("--myboundary");
        parser.push(&stream);
        assert_eq!(drain(&mut parser), vec![Bytes::from("abc")]);
    }

    #[test]
    fn test_preamble_is_discarded() {
        let mut parser = MultipartParser::new("frame");
        parser.push(&vec![b'x'; 4096]);
        assert!(parser.next_part().unwrap().is_none());
        assert!(parser.buffered() < 16);
    }
}
