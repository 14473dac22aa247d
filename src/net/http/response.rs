use crate::net::{HttpError, NetError};

pub(crate) const MAX_RESPONSE_BYTES: usize = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Parses a complete `Connection: close` response. Bodies are delimited by
/// `Content-Length`, chunked transfer encoding, or the end of the stream.
pub(crate) fn parse_response(buffer: &[u8]) -> Result<HttpResponse, NetError> {
    let mut headers = [httparse::EMPTY_HEADER; 32];
    let mut response = httparse::Response::new(&mut headers);
    let header_len = match response.parse(buffer) {
        Ok(httparse::Status::Complete(len)) => len,
        _ => return Err(NetError::from(HttpError::ResponseParse)),
    };
    let status = response.code.ok_or(HttpError::MissingStatusCode)?;
    let mut content_length: Option<usize> = None;
    let mut chunked = false;
    for header in response.headers.iter() {
        if header.name.eq_ignore_ascii_case("Content-Length") {
            let value = std::str::from_utf8(header.value)
                .map_err(|_| HttpError::InvalidContentLengthHeader)?;
            let len = value
                .trim()
                .parse::<usize>()
                .map_err(|_| HttpError::InvalidContentLengthHeader)?;
            content_length = Some(len);
        } else if header.name.eq_ignore_ascii_case("Transfer-Encoding") {
            chunked = header
                .value
                .split(|byte| *byte == b',')
                .any(|coding| trim_ascii(coding).eq_ignore_ascii_case(b"chunked"));
        }
    }
    let rest = &buffer[header_len..];
    let body = if chunked {
        decode_chunked(rest)?
    } else if let Some(len) = content_length {
        if rest.len() < len {
            return Err(NetError::from(HttpError::TruncatedBody));
        }
        rest[..len].to_vec()
    } else {
        rest.to_vec()
    };
    Ok(HttpResponse { status, body })
}

fn decode_chunked(mut input: &[u8]) -> Result<Vec<u8>, NetError> {
    let mut body = Vec::new();
    loop {
        let line_end = find_crlf(input).ok_or(HttpError::TruncatedBody)?;
        let size_line = std::str::from_utf8(&input[..line_end])
            .map_err(|_| HttpError::InvalidChunkSize)?;
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size =
            usize::from_str_radix(size_hex, 16).map_err(|_| HttpError::InvalidChunkSize)?;
        input = &input[line_end + 2..];
        if size == 0 {
            return Ok(body);
        }
        if size > MAX_RESPONSE_BYTES {
            return Err(NetError::from(HttpError::InvalidChunkSize));
        }
        let framed = size + 2;
        if input.len() < framed {
            return Err(NetError::from(HttpError::TruncatedBody));
        }
        body.extend_from_slice(&input[..size]);
        if &input[size..size + 2] != b"\r\n" {
            return Err(NetError::from(HttpError::InvalidChunkSize));
        }
        input = &input[framed..];
    }
}

fn find_crlf(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|window| window == b"\r\n")
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|pos| pos + 1)
        .unwrap_or(start);
    &bytes[start..end]
}
